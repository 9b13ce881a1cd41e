//! File-backed persistence for the payroll document.
//!
//! The backing store is a single pretty-printed JSON file at a fixed
//! path inside the data directory. Loading bootstraps the directory and
//! file on first use; corrupt or malformed content yields the empty
//! default state so a damaged disk never prevents the server from
//! starting. Saves go through a temp-file rename so a load never
//! observes a partial write.

use std::path::{Path, PathBuf};

use payroll_types::{PayrollState, Validation, validate_candidate};
use tokio::fs;

use crate::error::StoreError;

/// Name of the state file inside the data directory.
pub const STATE_FILE_NAME: &str = "payroll-state.json";

/// File-backed storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    data_dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `data_dir`. Nothing is touched on
    /// disk until the first load or save.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Full path of the persisted state file.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE_NAME)
    }

    /// Ensure the data directory and state file exist, writing the
    /// empty default document when the file is absent. Idempotent.
    pub async fn ensure_storage(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).await?;
        let path = self.state_path();
        if fs::try_exists(&path).await? {
            return Ok(());
        }
        write_atomic(&path, &PayrollState::empty()).await
    }

    /// Load the persisted state.
    ///
    /// Unreadable, unparseable, or invalidly shaped content is logged
    /// and replaced by the empty default; only a failure to bootstrap
    /// the storage itself is surfaced as an error.
    pub async fn load(&self) -> Result<PayrollState, StoreError> {
        self.ensure_storage().await?;
        let raw = match fs::read_to_string(self.state_path()).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read state file; using empty default");
                return Ok(PayrollState::empty());
            }
        };
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => match validate_candidate(&value) {
                Validation::Valid(state) => Ok(state),
                Validation::Invalid(reason) => {
                    tracing::error!(reason, "State file has invalid shape; using empty default");
                    Ok(PayrollState::empty())
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse state file; using empty default");
                Ok(PayrollState::empty())
            }
        }
    }

    /// Persist the state, overwriting the file atomically from the
    /// perspective of a concurrent load.
    pub async fn save(&self, state: &PayrollState) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).await?;
        write_atomic(&self.state_path(), state).await
    }
}

/// Write the serialized state to a temp file in the target directory,
/// then rename it over the destination.
async fn write_atomic(path: &Path, state: &PayrollState) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn load_bootstraps_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("data"));

        let state = backend.load().await.unwrap();
        assert_eq!(state, PayrollState::empty());
        assert!(backend.state_path().exists());
    }

    #[tokio::test]
    async fn ensure_storage_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        let state = PayrollState {
            weeks: vec![json!({"id": 7})],
        };

        backend.ensure_storage().await.unwrap();
        backend.save(&state).await.unwrap();
        // A second bootstrap must not clobber the saved document.
        backend.ensure_storage().await.unwrap();

        assert_eq!(backend.load().await.unwrap(), state);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "expected exactly one state file");
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        let state = PayrollState {
            weeks: vec![json!({"id": 1, "hours": [8, 8, 8]}), json!("note"), json!(2)],
        };

        backend.save(&state).await.unwrap();
        assert_eq!(backend.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn save_overwrites_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());

        backend
            .save(&PayrollState {
                weeks: vec![json!(1)],
            })
            .await
            .unwrap();
        let replacement = PayrollState {
            weeks: vec![json!(2), json!(3)],
        };
        backend.save(&replacement).await.unwrap();

        assert_eq!(backend.load().await.unwrap(), replacement);
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_empty_default() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        std::fs::write(backend.state_path(), "{not json at all").unwrap();

        assert_eq!(backend.load().await.unwrap(), PayrollState::empty());
    }

    #[tokio::test]
    async fn invalid_shape_loads_as_empty_default() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        std::fs::write(backend.state_path(), r#"{"weeks": 5}"#).unwrap();

        assert_eq!(backend.load().await.unwrap(), PayrollState::empty());
    }

    #[tokio::test]
    async fn persisted_file_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend
            .save(&PayrollState {
                weeks: vec![json!({"id": 1})],
            })
            .await
            .unwrap();

        let raw = std::fs::read_to_string(backend.state_path()).unwrap();
        assert!(raw.contains('\n'), "expected stable pretty formatting");
    }
}
