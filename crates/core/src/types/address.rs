//! Delivery addresses.
//!
//! Addresses are embedded in the account (append-only list) and copied
//! verbatim into each order at checkout.

use serde::{Deserialize, Serialize};

/// Validation failures for an [`Address`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is empty or only whitespace.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// A field exceeds the maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Offending field (wire name).
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
}

/// Kind of address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    #[default]
    Home,
    Work,
    Other,
}

/// A postal address.
///
/// Wire names follow the storefront's JSON (`address1`, `zipCode`,
/// `addressType`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub country: String,
    pub city: String,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub zip_code: String,
    #[serde(default)]
    pub address_type: AddressType,
}

impl Address {
    /// Maximum length of any single address field.
    pub const MAX_FIELD_LENGTH: usize = 200;

    /// Validate required fields and trim surrounding whitespace.
    ///
    /// An `address2` that is blank after trimming becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingField` for a blank `country`, `city`,
    /// `address1`, or `zipCode`, and `AddressError::TooLong` for oversized
    /// fields.
    pub fn normalized(self) -> Result<Self, AddressError> {
        let address2 = self
            .address2
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        if let Some(line) = &address2 {
            check_length("address2", line)?;
        }

        Ok(Self {
            country: required("country", &self.country)?,
            city: required("city", &self.city)?,
            address1: required("address1", &self.address1)?,
            address2,
            zip_code: required("zipCode", &self.zip_code)?,
            address_type: self.address_type,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, AddressError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AddressError::MissingField(field));
    }
    check_length(field, trimmed)?;
    Ok(trimmed.to_owned())
}

fn check_length(field: &'static str, value: &str) -> Result<(), AddressError> {
    if value.chars().count() > Address::MAX_FIELD_LENGTH {
        return Err(AddressError::TooLong {
            field,
            max: Address::MAX_FIELD_LENGTH,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Address {
        Address {
            country: " Norway ".to_owned(),
            city: "Oslo".to_owned(),
            address1: "Karl Johans gate 1".to_owned(),
            address2: Some("   ".to_owned()),
            zip_code: "0154".to_owned(),
            address_type: AddressType::Work,
        }
    }

    #[test]
    fn test_normalized_trims_and_drops_blank_line_two() {
        let address = sample().normalized().unwrap();
        assert_eq!(address.country, "Norway");
        assert_eq!(address.address2, None);
        assert_eq!(address.address_type, AddressType::Work);
    }

    #[test]
    fn test_missing_required_field() {
        let mut address = sample();
        address.address1 = String::new();
        assert_eq!(
            address.normalized(),
            Err(AddressError::MissingField("address1"))
        );
    }

    #[test]
    fn test_field_too_long() {
        let mut address = sample();
        address.city = "x".repeat(Address::MAX_FIELD_LENGTH + 1);
        assert!(matches!(
            address.normalized(),
            Err(AddressError::TooLong { field: "city", .. })
        ));
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{
            "country": "US",
            "city": "Austin",
            "address1": "1 Main St",
            "zipCode": "73301",
            "addressType": "other"
        }"#;
        let address: Address = serde_json::from_str(json).unwrap();
        assert_eq!(address.zip_code, "73301");
        assert_eq!(address.address_type, AddressType::Other);
        assert_eq!(address.address2, None);

        let value = serde_json::to_value(&address).unwrap();
        assert_eq!(value["zipCode"], "73301");
        assert!(value.get("address2").is_none());
    }

    #[test]
    fn test_address_type_defaults_to_home() {
        let json = r#"{"country":"US","city":"A","address1":"B","zipCode":"1"}"#;
        let address: Address = serde_json::from_str(json).unwrap();
        assert_eq!(address.address_type, AddressType::Home);
    }
}
