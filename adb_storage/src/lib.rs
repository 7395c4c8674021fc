//! ABOUTME: Blob storage for uploaded structure and PDB files
//! ABOUTME: Builds date-partitioned file references and stores bytes with retry logic

use std::path::{Path as FsPath, PathBuf};
use std::time::{Duration, SystemTime};

use adb_core::upload_date_segment;
use backoff::{future::retry, ExponentialBackoff};
use bytes::Bytes;
use object_store::{local::LocalFileSystem, path::Path, ObjectStore, PutPayload};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use ulid::Ulid;

/// Longest reference the `structure_file` and `pdb_file` columns accept
pub const MAX_REFERENCE_LEN: usize = 100;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Invalid file reference: {0}")]
    InvalidReference(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for adb_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidFileName(msg) | StorageError::InvalidReference(msg) => {
                adb_core::Error::Validation(msg)
            }
            StorageError::NotFound(msg) => adb_core::Error::NotFound(msg),
            other => adb_core::Error::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Which upload area a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Structure,
    Pdb,
}

impl FileKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Structure => "structure_files",
            Self::Pdb => "pdb_files",
        }
    }
}

impl std::str::FromStr for FileKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "structure" => Ok(Self::Structure),
            "pdb" => Ok(Self::Pdb),
            other => Err(StorageError::InvalidReference(format!(
                "unknown file kind '{}', expected 'structure' or 'pdb'",
                other
            ))),
        }
    }
}

/// Reduce an uploaded file name to `[A-Za-z0-9._-]`, spaces becoming `_`.
/// Names that carry a path or collapse to nothing are rejected.
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(StorageError::InvalidFileName(format!(
            "'{}' must not contain path separators",
            name
        )));
    }

    let cleaned: String = trimmed
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(StorageError::InvalidFileName(format!(
            "'{}' has no usable characters",
            name
        )));
    }
    Ok(cleaned)
}

/// Build the stored reference for an upload made at `at`:
/// `<prefix>/<YYYYMMDD>/<ulid>_<name>`, shortened to fit the column limit.
pub fn upload_reference(kind: FileKind, file_name: &str, at: SystemTime) -> Result<String> {
    let name = sanitize_file_name(file_name)?;
    let head = format!("{}/{}/{}_", kind.prefix(), upload_date_segment(at), Ulid::new());
    let room = MAX_REFERENCE_LEN.saturating_sub(head.len());

    Ok(format!("{}{}", head, shorten_name(&name, room)))
}

/// Trim the stem first so the extension survives
fn shorten_name(name: &str, room: usize) -> String {
    if name.len() <= room {
        return name.to_string();
    }
    match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot < room => {
            let ext = &name[dot..];
            format!("{}{}", &name[..room - ext.len()], ext)
        }
        _ => name[..room].to_string(),
    }
}

fn object_path(reference: &str) -> Result<Path> {
    if reference.is_empty() || reference.starts_with('/') {
        return Err(StorageError::InvalidReference(format!(
            "'{}' is not a relative reference",
            reference
        )));
    }
    Path::parse(reference)
        .map_err(|e| StorageError::InvalidReference(format!("'{}': {}", reference, e)))
}

/// Outcome of storing a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutReceipt {
    pub reference: String,
    pub size: usize,
    pub checksum: String,
}

/// Storage for uploaded files addressed by relative reference
#[allow(async_fn_in_trait)]
pub trait FileStore: Send + Sync {
    /// Store data under `reference`, replacing anything already there
    async fn put(&self, reference: &str, data: Bytes) -> Result<PutReceipt>;

    async fn get(&self, reference: &str) -> Result<Bytes>;

    async fn exists(&self, reference: &str) -> Result<bool>;

    async fn delete(&self, reference: &str) -> Result<()>;

    /// Store an upload under a fresh date-partitioned reference
    async fn upload(&self, kind: FileKind, file_name: &str, data: Bytes) -> Result<PutReceipt> {
        let reference = upload_reference(kind, file_name, adb_core::utc_now())?;
        self.put(&reference, data).await
    }
}

/// File store rooted at a local media directory
#[derive(Debug)]
pub struct LocalFileStore {
    store: LocalFileSystem,
    root: PathBuf,
    retry_max_elapsed: Duration,
}

impl LocalFileStore {
    /// Open a store under `root`, creating the directory if needed
    pub fn new(root: impl AsRef<FsPath>, retry_max_elapsed: Duration) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let store = LocalFileSystem::new_with_prefix(&root)?;

        debug!("Initialized local file store at: {:?}", root);
        Ok(Self {
            store,
            root,
            retry_max_elapsed,
        })
    }

    pub fn root(&self) -> &FsPath {
        &self.root
    }

    /// Calculate MD5 checksum
    fn calculate_checksum(data: &[u8]) -> String {
        let digest = md5::compute(data);
        hex::encode(digest.0)
    }

    /// Retry transient failures; a missing object is final
    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, object_store::Error>>,
    {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            operation().await.map_err(|e| match e {
                object_store::Error::NotFound { .. } => backoff::Error::permanent(e),
                e => {
                    warn!("Storage operation failed, will retry: {}", e);
                    backoff::Error::transient(e)
                }
            })
        })
        .await
        .map_err(|e| match e {
            object_store::Error::NotFound { path, .. } => StorageError::NotFound(path),
            e => StorageError::ObjectStore(e),
        })
    }
}

impl FileStore for LocalFileStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, reference: &str, data: Bytes) -> Result<PutReceipt> {
        let path = object_path(reference)?;
        let size = data.len();
        let checksum = Self::calculate_checksum(&data);
        let payload = PutPayload::from(data);

        self.with_retry(|| async { self.store.put(&path, payload.clone()).await })
            .await?;

        info!("Stored {} bytes at {}", size, reference);
        Ok(PutReceipt {
            reference: reference.to_string(),
            size,
            checksum,
        })
    }

    #[instrument(skip(self))]
    async fn get(&self, reference: &str) -> Result<Bytes> {
        let path = object_path(reference)?;

        let result = self.with_retry(|| async { self.store.get(&path).await }).await?;
        let data = result.bytes().await?;

        debug!("Retrieved {} bytes from {}", data.len(), reference);
        Ok(data)
    }

    async fn exists(&self, reference: &str) -> Result<bool> {
        let path = object_path(reference)?;

        match self.with_retry(|| async { self.store.head(&path).await }).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, reference: &str) -> Result<()> {
        let path = object_path(reference)?;

        self.with_retry(|| async { self.store.delete(&path).await })
            .await?;

        info!("Deleted {}", reference);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn march_4_2021() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_614_859_200)
    }

    #[test]
    fn test_reference_layout() {
        let reference = upload_reference(FileKind::Structure, "1abc.pdb", march_4_2021()).unwrap();
        let parts: Vec<&str> = reference.split('/').collect();

        assert_eq!(parts[0], "structure_files");
        assert_eq!(parts[1], "20210304");
        let (ulid, name) = parts[2].split_once('_').unwrap();
        assert_eq!(ulid.len(), 26);
        assert_eq!(name, "1abc.pdb");
    }

    #[test]
    fn test_references_are_unique() {
        let a = upload_reference(FileKind::Pdb, "x.cif", march_4_2021()).unwrap();
        let b = upload_reference(FileKind::Pdb, "x.cif", march_4_2021()).unwrap();
        assert!(a.starts_with("pdb_files/20210304/"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_long_names_fit_the_column() {
        let name = format!("{}.pdb", "n".repeat(200));
        let reference = upload_reference(FileKind::Structure, &name, march_4_2021()).unwrap();

        assert_eq!(reference.len(), MAX_REFERENCE_LEN);
        assert!(reference.ends_with("n.pdb"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my model.pdb").unwrap(), "my_model.pdb");
        assert_eq!(sanitize_file_name("a$b(c).cif").unwrap(), "abc.cif");

        assert!(sanitize_file_name("").is_err());
        assert!(sanitize_file_name("..").is_err());
        assert!(sanitize_file_name("../etc/passwd").is_err());
        assert!(sanitize_file_name("dir\\file.pdb").is_err());
        assert!(sanitize_file_name("$$$").is_err());
    }

    #[test]
    fn test_object_path_rejects_escapes() {
        assert!(object_path("/abs/file").is_err());
        assert!(object_path("").is_err());
        assert!(object_path("structure_files/../x").is_err());
        assert!(object_path("structure_files/20210304/a.pdb").is_ok());
    }

    #[test]
    fn test_file_kind_parse() {
        assert_eq!("PDB".parse::<FileKind>().unwrap(), FileKind::Pdb);
        assert_eq!("structure".parse::<FileKind>().unwrap(), FileKind::Structure);
        assert!("model".parse::<FileKind>().is_err());
    }

    #[test]
    fn test_checksum_calculation() {
        let checksum = LocalFileStore::calculate_checksum(b"Hello, world!");
        assert_eq!(checksum, "6cd3556deb0da54bca060b4c39479839");
    }

    #[test]
    fn test_errors_map_onto_core_variants() {
        let err: adb_core::Error = StorageError::InvalidFileName("x".into()).into();
        assert!(matches!(err, adb_core::Error::Validation(_)));

        let err: adb_core::Error = StorageError::NotFound("x".into()).into();
        assert!(err.is_not_found());
    }
}
