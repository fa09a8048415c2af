//! Product image URL repair.
//!
//! Early deployments stored product images on the API host itself, so the
//! database still holds URLs such as `http://localhost:5001/uploads/...`
//! that no longer resolve. This command points them at the placeholder.
//!
//! # Usage
//!
//! ```bash
//! bazaar-cli repair-images --prefix http://localhost
//! bazaar-cli repair-images --prefix http://old-host:5001 --placeholder https://cdn.example.com/none.png
//! ```

use bazaar_api::config::DEFAULT_PLACEHOLDER_IMAGE_URL;
use bazaar_api::db::ProductRepository;

use super::{CommandError, database_url};

/// Replace image URLs starting with `prefix`; reports how many changed.
///
/// # Errors
///
/// Returns an error for a blank prefix, a missing database URL, or a failed
/// update.
pub async fn run(prefix: &str, placeholder: Option<String>) -> Result<u64, CommandError> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(CommandError::InvalidArgument(
            "prefix must not be empty".to_string(),
        ));
    }

    let placeholder = placeholder
        .or_else(|| std::env::var("PLACEHOLDER_IMAGE_URL").ok())
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PLACEHOLDER_IMAGE_URL.to_string());

    if placeholder.starts_with(prefix) {
        return Err(CommandError::InvalidArgument(
            "placeholder must not start with the prefix".to_string(),
        ));
    }

    let database_url = database_url()?;
    let pool = bazaar_api::db::create_pool(&database_url).await?;

    let updated = ProductRepository::new(&pool)
        .replace_image_urls(prefix, &placeholder)
        .await?;

    tracing::info!(%prefix, %placeholder, updated, "product image URLs repaired");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_prefix_rejected() {
        let result = run("  ", Some("https://cdn.example.com/none.png".to_string())).await;
        assert!(matches!(result, Err(CommandError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_placeholder_under_prefix_rejected() {
        let result = run(
            "http://localhost",
            Some("http://localhost:5001/uploads/none.png".to_string()),
        )
        .await;
        assert!(matches!(result, Err(CommandError::InvalidArgument(_))));
    }
}
