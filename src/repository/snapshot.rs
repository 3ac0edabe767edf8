use std::path::{Path, PathBuf};

use crate::{
    error::{AppError, AppResult},
    repository::ledger_store::LedgerStore,
};

/// Sibling temp file, unique per save so overlapping writers never share one.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    path.with_file_name(name)
}

/// Read a stored snapshot. A missing file is `Ok(None)`.
pub async fn load_snapshot(path: &Path) -> AppResult<Option<LedgerStore>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            tracing::error!(path = %path.display(), error = %error, "Could not read ledger snapshot");
            return Err(AppError::Internal("Could not read ledger snapshot.".to_string()));
        }
    };

    serde_json::from_slice(&raw).map(Some).map_err(|error| {
        tracing::error!(path = %path.display(), error = %error, "Ledger snapshot is not valid JSON");
        AppError::Internal("Ledger snapshot is corrupt.".to_string())
    })
}

/// Write the whole store to a sibling temp file, then rename it over `path`.
pub async fn save_snapshot(path: &Path, store: &LedgerStore) -> AppResult<()> {
    let body = serde_json::to_vec_pretty(store)
        .map_err(|error| AppError::Internal(format!("Could not encode ledger snapshot: {error}")))?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|error| {
            tracing::error!(path = %parent.display(), error = %error, "Could not create snapshot directory");
            AppError::Internal("Could not write ledger snapshot.".to_string())
        })?;
    }

    let temp = temp_path(path);
    tokio::fs::write(&temp, body).await.map_err(|error| {
        tracing::error!(path = %temp.display(), error = %error, "Could not write ledger snapshot");
        AppError::Internal("Could not write ledger snapshot.".to_string())
    })?;
    if let Err(error) = tokio::fs::rename(&temp, path).await {
        tracing::error!(path = %path.display(), error = %error, "Could not replace ledger snapshot");
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(AppError::Internal("Could not write ledger snapshot.".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_snapshot, save_snapshot, temp_path};
    use crate::repository::ledger_store::LedgerStore;
    use std::path::Path;

    #[test]
    fn temp_file_sits_next_to_target() {
        let first = temp_path(Path::new("/data/ledger.json"));
        let second = temp_path(Path::new("/data/ledger.json"));
        assert_eq!(first.parent(), Some(Path::new("/data")));
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("ledger.json.") && name.ends_with(".tmp"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_snapshot(&dir.path().join("absent.json")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn saved_store_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");
        let store = LedgerStore::seeded(&[2024], "2024-01-01T00:00:00Z");

        save_snapshot(&path, &store).await.unwrap();
        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        let loaded = load_snapshot(&path).await.unwrap().unwrap();
        assert_eq!(loaded.ledger, store.ledger);
        assert_eq!(loaded.tenants, store.tenants);
        assert_eq!(loaded.expenses.len(), store.expenses.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_saves_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let store = LedgerStore::seeded(&[2024], "2024-01-01T00:00:00Z");

        let saves = (0..32)
            .map(|_| {
                let path = path.clone();
                let store = store.clone();
                tokio::spawn(async move { save_snapshot(&path, &store).await })
            })
            .collect::<Vec<_>>();
        for save in saves {
            assert!(save.await.unwrap().is_ok());
        }

        let loaded = load_snapshot(&path).await.unwrap().unwrap();
        assert_eq!(loaded.ledger, store.ledger);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(load_snapshot(&path).await.is_err());
    }
}
