//! Catalog workflow: product CRUD with owner checks.

use sqlx::PgPool;

use bazaar_core::{Category, Email, Price, ProductId};

use super::media::{ImageUpload, MediaFolder, MediaService};
use super::CommerceError;
use crate::db::products::ProductDraft;
use crate::db::{ProductRepository, RepositoryError};
use crate::models::{CurrentUser, Product};

/// Maximum product name length.
const MAX_NAME_LENGTH: usize = 200;

/// Fields for a new product, as received from the form.
#[derive(Debug, Default)]
pub struct NewProductInput {
    pub name: String,
    pub description: Option<String>,
    /// Price as text (forms carry strings).
    pub price: String,
    pub category: Option<String>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
}

/// Catalog service.
///
/// Text fields and ownership are checked before an image is handed to the
/// image host, so rejected requests never leave uploads behind.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    media: &'a MediaService,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, media: &'a MediaService) -> Self {
        Self {
            products: ProductRepository::new(pool),
            media,
        }
    }

    /// Create a product owned by the principal.
    ///
    /// Without an image (or when the host failed under the `placeholder`
    /// policy) the configured placeholder URL is stored.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::MissingField`, `CommerceError::Price`, or
    /// `CommerceError::Category` for invalid input, and `CommerceError::Media`
    /// when the image is rejected.
    #[tracing::instrument(skip(self, principal, input, image), fields(user_id = %principal.id))]
    pub async fn create(
        &self,
        principal: &CurrentUser,
        input: NewProductInput,
        image: Option<ImageUpload>,
    ) -> Result<Product, CommerceError> {
        let name = product_name(&input.name)?;
        let price = Price::parse(&input.price)?;
        let category = parse_category(input.category.as_deref())?;

        let image_url = self
            .media
            .ingest(image, MediaFolder::Products)
            .await?
            .unwrap_or_else(|| self.media.placeholder_image_url().to_owned());

        let draft = ProductDraft {
            name,
            description: input.description.unwrap_or_default().trim().to_owned(),
            price,
            category,
            image_url,
        };

        let product = self.products.create(&draft, &principal.email).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Apply supplied fields (and a new image, if any) to an owned product.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ProductNotFound`, `CommerceError::NotOwner`,
    /// a validation error, or `CommerceError::Media`.
    #[tracing::instrument(skip(self, principal, changes, image), fields(user_id = %principal.id))]
    pub async fn update(
        &self,
        principal: &CurrentUser,
        id: ProductId,
        changes: ProductChanges,
        image: Option<ImageUpload>,
    ) -> Result<Product, CommerceError> {
        let current = self.owned(principal, id).await?;

        let name = match changes.name {
            Some(name) => product_name(&name)?,
            None => current.name,
        };
        let price = match changes.price {
            Some(price) => Price::parse(&price)?,
            None => current.price,
        };
        let category = match changes.category {
            Some(category) => parse_category(Some(&category))?,
            None => current.category,
        };
        let image_url = self
            .media
            .ingest(image, MediaFolder::Products)
            .await?
            .unwrap_or(current.image_url);

        let draft = ProductDraft {
            name,
            description: changes
                .description
                .map_or(current.description, |d| d.trim().to_owned()),
            price,
            category,
            image_url,
        };

        self.products.update(id, &draft).await.map_err(not_found)
    }

    /// Delete an owned product.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ProductNotFound` or `CommerceError::NotOwner`.
    #[tracing::instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn delete(
        &self,
        principal: &CurrentUser,
        id: ProductId,
    ) -> Result<(), CommerceError> {
        self.owned(principal, id).await?;
        self.products.delete(id).await.map_err(not_found)?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, CommerceError> {
        Ok(self.products.list_all().await?)
    }

    /// Products created by `owner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if the query fails.
    pub async fn list_by_owner(&self, owner: &Email) -> Result<Vec<Product>, CommerceError> {
        Ok(self.products.list_by_owner(owner).await?)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ProductNotFound` if it does not exist.
    pub async fn get(&self, id: ProductId) -> Result<Product, CommerceError> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or(CommerceError::ProductNotFound)
    }

    async fn owned(
        &self,
        principal: &CurrentUser,
        id: ProductId,
    ) -> Result<Product, CommerceError> {
        let product = self.get(id).await?;
        if !product.is_owned_by(&principal.email) {
            tracing::warn!(product_id = %id, "product modification by non-owner refused");
            return Err(CommerceError::NotOwner);
        }
        Ok(product)
    }
}

fn not_found(e: RepositoryError) -> CommerceError {
    match e {
        RepositoryError::NotFound => CommerceError::ProductNotFound,
        other => other.into(),
    }
}

fn product_name(raw: &str) -> Result<String, CommerceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CommerceError::MissingField("name"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CommerceError::TooLong {
            field: "name",
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_owned())
}

/// A missing or blank category means `other`.
fn parse_category(raw: Option<&str>) -> Result<Category, CommerceError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Category::default()),
        Some(value) => Ok(value.parse::<Category>()?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_name() {
        assert_eq!(product_name("  Lamp ").unwrap(), "Lamp");
        assert!(matches!(
            product_name("   "),
            Err(CommerceError::MissingField("name"))
        ));
        let longest = "é".repeat(MAX_NAME_LENGTH);
        assert_eq!(product_name(&longest).unwrap(), longest);

        let err = product_name(&"n".repeat(MAX_NAME_LENGTH + 1)).unwrap_err();
        assert!(matches!(
            err,
            CommerceError::TooLong {
                field: "name",
                max: MAX_NAME_LENGTH
            }
        ));
        assert_eq!(err.to_string(), "name must be at most 200 characters");
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category(None).unwrap(), Category::Other);
        assert_eq!(parse_category(Some(" ")).unwrap(), Category::Other);
        assert_eq!(parse_category(Some("Books")).unwrap(), Category::Books);
        assert!(matches!(
            parse_category(Some("weapons")),
            Err(CommerceError::Category(_))
        ));
    }
}
