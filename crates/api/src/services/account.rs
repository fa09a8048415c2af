//! Profile reads and saved addresses.

use sqlx::PgPool;

use bazaar_core::Address;

use super::CommerceError;
use crate::db::{RepositoryError, UserRepository};
use crate::models::{CurrentUser, UserProfile};

/// Account profile service.
pub struct AccountService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Public fields plus saved addresses.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::AccountNotFound` if the account was deleted.
    pub async fn profile(&self, principal: &CurrentUser) -> Result<UserProfile, CommerceError> {
        let user = self
            .users
            .get_by_id(principal.id)
            .await?
            .ok_or(CommerceError::AccountNotFound)?;

        Ok(UserProfile::from(user))
    }

    /// Validate and append an address; returns the full list.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Address` for an invalid address and
    /// `CommerceError::AccountNotFound` if the account was deleted.
    #[tracing::instrument(skip(self, principal, address), fields(user_id = %principal.id))]
    pub async fn add_address(
        &self,
        principal: &CurrentUser,
        address: Address,
    ) -> Result<Vec<Address>, CommerceError> {
        let address = address.normalized()?;

        self.users
            .append_address(principal.id, &address)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CommerceError::AccountNotFound,
                other => other.into(),
            })
    }
}
