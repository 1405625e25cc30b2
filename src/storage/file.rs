// src/storage/file.rs

use crate::error::{AppError, Result};
use crate::storage::ConfigStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Configuration storage backed by a flat YAML map on disk.
///
/// The whole map is held in memory and the file is rewritten after every
/// write call.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is treated as an empty store
    /// and created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| AppError::Io {
                operation: "read_settings_file".to_string(),
                message: format!("Failed to read {}: {e}", path.display()),
            })?;
            Self::parse(&content, &path)?
        } else {
            info!(path = %path.display(), "Settings file not found, starting empty");
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = values.len(), "Opened settings file");
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(content: &str, path: &Path) -> Result<BTreeMap<String, String>> {
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let raw: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(content).map_err(|e| AppError::ConfigParse {
                message: format!("Failed to parse settings file {}: {e}", path.display()),
                line: e.location().map(|loc| loc.line()),
            })?;

        // Scalars of any YAML type are accepted and kept as their string form.
        raw.into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_yaml::Value::Null => String::new(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::String(s) => s,
                    _ => {
                        return Err(AppError::ConfigParse {
                            message: format!(
                                "Settings file {}: value of '{key}' is not a scalar",
                                path.display()
                            ),
                            line: None,
                        })
                    }
                };
                Ok((key, value))
            })
            .collect()
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let yaml = serde_yaml::to_string(values)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, yaml)
            .await
            .map_err(|e| AppError::StoragePersistence {
                message: format!("Failed to write {}: {e}", tmp.display()),
            })?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::StoragePersistence {
                message: format!("Failed to replace {}: {e}", self.path.display()),
            });
        }
        debug!(path = %self.path.display(), "Settings file written");
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)]).await
    }

    /// The in-memory map only changes once the file has been replaced.
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut values = self.values.write().await;
        let mut updated = values.clone();
        for (key, value) in entries {
            updated.insert((*key).to_string(), (*value).to_string());
        }
        self.persist(&updated).await?;
        *values = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("settings.yaml")).await.unwrap();
        assert_eq!(store.get("app.name").await.unwrap(), None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.yaml");

        let store = FileStore::open(&path).await.unwrap();
        store
            .set_many(&[("app.name", "My Site"), ("mail.port", "587")])
            .await
            .unwrap();
        store.set("mail.host", "smtp.example.com").await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("app.name").await.unwrap().as_deref(), Some("My Site"));
        assert_eq!(reopened.get("mail.port").await.unwrap().as_deref(), Some("587"));
        assert_eq!(
            reopened.get("mail.host").await.unwrap().as_deref(),
            Some("smtp.example.com")
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_values_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        tokio::fs::write(&path, "app.name: Old\n").await.unwrap();
        let store = FileStore::open(&path).await.unwrap();

        // Replacing a directory with a file fails after the temp file is written.
        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::create_dir(&path).await.unwrap();

        let err = store.set_many(&[("app.name", "New")]).await.unwrap_err();
        assert!(matches!(err, AppError::StoragePersistence { .. }), "got {err:?}");
        assert!(store.set("mail.host", "smtp.example.com").await.is_err());

        assert_eq!(store.get("app.name").await.unwrap().as_deref(), Some("Old"));
        assert_eq!(store.get("mail.host").await.unwrap(), None);
        assert!(!dir.path().join("settings.yaml.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_is_not_applied() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("missing-dir").join("settings.yaml"))
            .await
            .unwrap();

        assert!(store.set_many(&[("app.name", "New")]).await.is_err());
        assert_eq!(store.get("app.name").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_non_string_scalars_are_stringified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        tokio::fs::write(&path, "mail.port: 25\nmail.encryption: ~\nflag: true\n")
            .await
            .unwrap();

        let store = FileStore::open(&path).await.unwrap();
        assert_eq!(store.get("mail.port").await.unwrap().as_deref(), Some("25"));
        assert_eq!(store.get("mail.encryption").await.unwrap().as_deref(), Some(""));
        assert_eq!(store.get("flag").await.unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_nested_value_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        tokio::fs::write(&path, "mail:\n  host: smtp.example.com\n")
            .await
            .unwrap();

        let err = FileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, AppError::ConfigParse { .. }), "got {err:?}");
    }
}
