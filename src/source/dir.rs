//! Feature documents exported to a directory as `tree.json`,
//! `tangling.json` and `featureHistory.json`.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{DatasetKey, FeatureSource};
use crate::error::FetchError;

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: DatasetKey) -> PathBuf {
        self.root.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl FeatureSource for DirectorySource {
    async fn fetch(&self, key: DatasetKey) -> Result<String, FetchError> {
        let path = self.path_for(key);
        tracing::debug!("Reading {} from {}", key, path.display());
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            let code = if e.kind() == ErrorKind::NotFound {
                404
            } else {
                FetchError::TRANSPORT
            };
            FetchError::new(key.as_str(), code, format!("{}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_documents_by_key() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tree.json"), r#"{"features":[]}"#).unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(
            source.fetch(DatasetKey::Tree).await.unwrap(),
            r#"{"features":[]}"#
        );

        let missing = source.fetch(DatasetKey::FeatureHistory).await.unwrap_err();
        assert_eq!(missing.code, 404);
        assert_eq!(missing.key, "featureHistory");
    }
}
