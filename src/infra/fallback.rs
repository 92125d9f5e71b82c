//! Bundled catalog shown when the remote is unreachable and nothing is cached.

use std::path::Path;

use tracing::info;

use crate::domain::catalog::{CatalogItem, ItemRecord};

use super::error::InfraError;

/// Reads a JSON array of item records from `path`.
pub async fn load_fallback_items(path: &Path) -> Result<Vec<CatalogItem>, InfraError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let records: Vec<ItemRecord> = serde_json::from_str(&raw).map_err(|err| {
        InfraError::configuration(format!(
            "fallback catalog `{}` is not a list of items: {err}",
            path.display()
        ))
    })?;
    info!(path = %path.display(), items = records.len(), "Loaded fallback catalog");
    Ok(records.into_iter().map(CatalogItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_records_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("books.json");
        std::fs::write(
            &path,
            r#"[{"id":"1","title":"Kronikë në gur","author":"Ismail Kadare","price":1200,
                 "discount":10,"genre":"Letërsi Shqipe","featured":true}]"#,
        )
        .expect("write fallback");

        let items = load_fallback_items(&path).await.expect("fallback loads");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].discount, 10);
        assert!(items[0].featured);
    }

    #[tokio::test]
    async fn reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = load_fallback_items(&dir.path().join("absent.json")).await;
        assert!(matches!(missing, Err(InfraError::Io(_))));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{}").expect("write fallback");
        let malformed = load_fallback_items(&path).await;
        assert!(matches!(malformed, Err(InfraError::Configuration { .. })));
    }
}
