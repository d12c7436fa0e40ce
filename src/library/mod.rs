//! Per-user file library on the local filesystem.
//!
//! Layout under the library root:
//!
//! ```text
//! <root>/<user_id>/index.json        metadata records
//! <root>/<user_id>/<uuid>.pdf        stored blobs
//! <root>/<user_id>/<uuid>.pdf.part   blobs still being uploaded
//! ```

pub mod error;
pub mod session;
pub mod upload;

pub use error::LibraryError;
pub use session::Session;
pub use upload::{UploadState, UploadTask, UPLOAD_CHUNK_SIZE};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

const INDEX_FILE: &str = "index.json";
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    pub file_name: String,
    /// Blob path relative to the library root
    pub locator: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Library {
    inner: Arc<LibraryInner>,
}

struct LibraryInner {
    root: PathBuf,
    /// Serializes read-modify-write cycles on index files
    index_lock: Mutex<()>,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(LibraryInner {
                root: root.into(),
                index_lock: Mutex::new(()),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    fn user_dir(&self, session: &Session) -> PathBuf {
        self.inner.root.join(session.user_id())
    }

    /// Absolute path of a record's blob
    pub fn blob_path(&self, record: &FileRecord) -> PathBuf {
        self.inner.root.join(&record.locator)
    }

    /// All records for the user, newest first
    pub async fn list(&self, session: &Session) -> Result<Vec<FileRecord>, LibraryError> {
        let mut records = self.read_index(session).await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<FileRecord, LibraryError> {
        self.read_index(session)
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or(LibraryError::NotFound(id))
    }

    /// Fetch a stored blob
    pub async fn read(&self, session: &Session, id: Uuid) -> Result<Vec<u8>, LibraryError> {
        let record = self.get(session, id).await?;
        let path = self.blob_path(&record);
        tokio::fs::read(&path)
            .await
            .map_err(|e| LibraryError::io(&path, e))
    }

    /// Remove a record and its blob
    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<FileRecord, LibraryError> {
        let _guard = self.inner.index_lock.lock().await;

        let mut records = self.read_index(session).await?;
        let position = records
            .iter()
            .position(|record| record.id == id)
            .ok_or(LibraryError::NotFound(id))?;
        let record = records.remove(position);
        self.write_index(session, &records).await?;

        let path = self.blob_path(&record);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "blob already missing");
            }
            Err(e) => return Err(LibraryError::io(&path, e)),
        }

        tracing::info!(user = session.user_id(), id = %record.id, file = %record.file_name, "deleted file");
        Ok(record)
    }

    /// Start storing `bytes` as a new PDF in the user's library.
    ///
    /// Input is validated up front; the write itself runs on a tokio task that
    /// publishes its progress through the returned [`UploadTask`].
    pub fn upload(
        &self,
        session: &Session,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadTask, LibraryError> {
        let file_name = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| LibraryError::InvalidFileName(file_name.to_string()))?
            .to_string();

        if !bytes.starts_with(PDF_MAGIC) {
            return Err(LibraryError::NotPdf(file_name));
        }

        let id = Uuid::new_v4();
        let locator = format!("{}/{}.pdf", session.user_id(), id);
        let final_path = self.inner.root.join(&locator);
        let partial_path = final_path.with_extension("pdf.part");

        let (tx, rx) = watch::channel(UploadState::Progressing(0.0));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let pending = PendingUpload {
            library: self.clone(),
            session: session.clone(),
            record: FileRecord {
                id,
                file_name,
                locator,
                size: bytes.len() as u64,
                created_at: Utc::now(),
            },
            final_path,
            partial_path,
            cancel: cancel_rx,
        };
        let handle = tokio::spawn(pending.run(bytes, tx));

        Ok(UploadTask {
            state: rx,
            cancel: cancel_tx,
            handle,
        })
    }

    async fn read_index(&self, session: &Session) -> Result<Vec<FileRecord>, LibraryError> {
        let path = self.user_dir(session).join(INDEX_FILE);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LibraryError::io(&path, e)),
        };
        serde_json::from_slice(&data).map_err(|source| LibraryError::Index {
            path: path.display().to_string(),
            source,
        })
    }

    /// Write through a temp file so a crash never leaves half an index
    async fn write_index(
        &self,
        session: &Session,
        records: &[FileRecord],
    ) -> Result<(), LibraryError> {
        let dir = self.user_dir(session);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LibraryError::io(&dir, e))?;

        let path = dir.join(INDEX_FILE);
        let tmp = dir.join(format!("{}.tmp", INDEX_FILE));
        let data = serde_json::to_vec_pretty(records).map_err(|source| LibraryError::Index {
            path: path.display().to_string(),
            source,
        })?;
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| LibraryError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| LibraryError::io(&path, e))
    }
}

struct PendingUpload {
    library: Library,
    session: Session,
    record: FileRecord,
    final_path: PathBuf,
    partial_path: PathBuf,
    cancel: watch::Receiver<bool>,
}

impl PendingUpload {
    async fn run(
        self,
        bytes: Vec<u8>,
        tx: watch::Sender<UploadState>,
    ) -> Result<FileRecord, LibraryError> {
        match self.store(&bytes, &tx).await {
            Ok(record) => {
                tracing::info!(
                    user = self.session.user_id(),
                    id = %record.id,
                    file = %record.file_name,
                    size = record.size,
                    "upload complete"
                );
                tx.send_replace(UploadState::Completed(record.clone()));
                Ok(record)
            }
            Err(e) => {
                // the index is written last, so a blob that made it to its
                // final name is not referenced by any record yet
                let _ = tokio::fs::remove_file(&self.partial_path).await;
                let _ = tokio::fs::remove_file(&self.final_path).await;
                match &e {
                    LibraryError::Cancelled => {
                        tracing::info!(file = %self.record.file_name, "upload cancelled")
                    }
                    _ => tracing::warn!(file = %self.record.file_name, error = %e, "upload failed"),
                }
                tx.send_replace(UploadState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn store(
        &self,
        bytes: &[u8],
        tx: &watch::Sender<UploadState>,
    ) -> Result<FileRecord, LibraryError> {
        let dir = self.library.user_dir(&self.session);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LibraryError::io(&dir, e))?;

        let io_err = |e| LibraryError::io(&self.partial_path, e);
        let mut file = tokio::fs::File::create(&self.partial_path)
            .await
            .map_err(io_err)?;

        let total = bytes.len();
        let mut written = 0;
        for chunk in bytes.chunks(UPLOAD_CHUNK_SIZE) {
            if *self.cancel.borrow() {
                return Err(LibraryError::Cancelled);
            }
            file.write_all(chunk).await.map_err(io_err)?;
            written += chunk.len();
            tx.send_replace(UploadState::Progressing(written as f32 / total as f32));
            tokio::task::yield_now().await;
        }
        file.sync_all().await.map_err(io_err)?;
        drop(file);

        tokio::fs::rename(&self.partial_path, &self.final_path)
            .await
            .map_err(|e| LibraryError::io(&self.final_path, e))?;

        let _guard = self.library.inner.index_lock.lock().await;
        let mut records = self.library.read_index(&self.session).await?;
        records.push(self.record.clone());
        self.library.write_index(&self.session, &records).await?;

        Ok(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::create_test_pdf;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Library, Session) {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::new(dir.path());
        (dir, library, Session::new("alice").unwrap())
    }

    /// File names in the user's directory, sorted
    fn stored_files(library: &Library, session: &Session) -> Vec<String> {
        let dir = library.root().join(session.user_id());
        let mut names: Vec<String> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_upload_stores_blob_and_record() {
        let (_dir, library, alice) = setup();
        let pdf = create_test_pdf(2, "A", 400, 600);

        let task = library.upload(&alice, "report.pdf", pdf.clone()).unwrap();
        let record = task.finish().await.unwrap();

        assert_eq!(record.file_name, "report.pdf");
        assert_eq!(record.size, pdf.len() as u64);
        assert_eq!(record.locator, format!("alice/{}.pdf", record.id));
        assert_eq!(library.read(&alice, record.id).await.unwrap(), pdf);
        assert_eq!(library.list(&alice).await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_upload_reports_completion() {
        let (_dir, library, alice) = setup();
        let mut pdf = b"%PDF-1.5\n".to_vec();
        pdf.resize(UPLOAD_CHUNK_SIZE * 3 + 17, b' ');

        let task = library.upload(&alice, "big.pdf", pdf).unwrap();
        let mut progress = task.subscribe();
        let record = task.finish().await.unwrap();

        let last = progress.borrow_and_update().clone();
        assert_eq!(last, UploadState::Completed(record));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let (_dir, library, alice) = setup();
        assert!(matches!(
            library.upload(&alice, "notes.txt", b"hello".to_vec()),
            Err(LibraryError::NotPdf(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_strips_directories_from_name() {
        let (_dir, library, alice) = setup();
        let pdf = create_test_pdf(1, "A", 400, 600);
        let record = library
            .upload(&alice, "../../etc/passwd.pdf", pdf)
            .unwrap()
            .finish()
            .await
            .unwrap();
        assert_eq!(record.file_name, "passwd.pdf");
        assert!(library.blob_path(&record).starts_with(library.root()));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_per_user() {
        let (_dir, library, alice) = setup();
        let bob = Session::new("bob").unwrap();
        let pdf = create_test_pdf(1, "A", 400, 600);

        let first = library.upload(&alice, "first.pdf", pdf.clone()).unwrap().finish().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = library.upload(&alice, "second.pdf", pdf.clone()).unwrap().finish().await.unwrap();
        library.upload(&bob, "bobs.pdf", pdf).unwrap().finish().await.unwrap();

        let names: Vec<_> = library
            .list(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.file_name)
            .collect();
        assert_eq!(names, vec!["second.pdf", "first.pdf"]);
        assert!(second.created_at > first.created_at);
        assert_eq!(library.list(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_keep_all_records() {
        let (_dir, library, alice) = setup();
        let pdf = create_test_pdf(1, "A", 400, 600);

        let tasks: Vec<_> = (0..8)
            .map(|i| library.upload(&alice, &format!("f{}.pdf", i), pdf.clone()).unwrap())
            .collect();
        for task in tasks {
            task.finish().await.unwrap();
        }

        assert_eq!(library.list(&alice).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_blob() {
        let (_dir, library, alice) = setup();
        let pdf = create_test_pdf(1, "A", 400, 600);
        let record = library.upload(&alice, "gone.pdf", pdf).unwrap().finish().await.unwrap();

        let deleted = library.delete(&alice, record.id).await.unwrap();
        assert_eq!(deleted.id, record.id);
        assert!(!library.blob_path(&record).exists());
        assert!(library.list(&alice).await.unwrap().is_empty());
        assert!(matches!(
            library.delete(&alice, record.id).await,
            Err(LibraryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_other_users_cannot_see_records() {
        let (_dir, library, alice) = setup();
        let mallory = Session::new("mallory").unwrap();
        let pdf = create_test_pdf(1, "A", 400, 600);
        let record = library.upload(&alice, "private.pdf", pdf).unwrap().finish().await.unwrap();

        assert!(matches!(
            library.get(&mallory, record.id).await,
            Err(LibraryError::NotFound(_))
        ));
        assert!(matches!(
            library.delete(&mallory, record.id).await,
            Err(LibraryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_leaves_no_blob() {
        let (_dir, library, alice) = setup();
        let mut pdf = b"%PDF-1.5\n".to_vec();
        pdf.resize(UPLOAD_CHUNK_SIZE * 64, b' ');

        let task = library.upload(&alice, "cancelled.pdf", pdf).unwrap();
        let progress = task.subscribe();
        // current-thread runtime: the upload has not started writing yet
        assert_eq!(task.cancel().await.unwrap(), None);

        assert!(matches!(*progress.borrow(), UploadState::Failed(_)));
        assert!(library.list(&alice).await.unwrap().is_empty());
        assert!(stored_files(&library, &alice).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_after_completion_keeps_file() {
        let (_dir, library, alice) = setup();
        let pdf = create_test_pdf(1, "A", 400, 600);

        let task = library.upload(&alice, "kept.pdf", pdf).unwrap();
        let mut progress = task.subscribe();
        progress
            .wait_for(|state| matches!(state, UploadState::Completed(_)))
            .await
            .unwrap();

        let record = task.cancel().await.unwrap().unwrap();
        assert_eq!(library.list(&alice).await.unwrap(), vec![record.clone()]);
        assert_eq!(
            stored_files(&library, &alice),
            vec![format!("{}.pdf", record.id), INDEX_FILE.to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_index_write_removes_blob() {
        let (dir, library, alice) = setup();
        // a directory where the index should be makes every index read fail
        std::fs::create_dir_all(dir.path().join("alice").join(INDEX_FILE)).unwrap();
        let pdf = create_test_pdf(1, "A", 400, 600);

        let result = library.upload(&alice, "orphan.pdf", pdf.clone()).unwrap().finish().await;
        assert!(matches!(result, Err(LibraryError::Io { .. })));
        assert_eq!(stored_files(&library, &alice), vec![INDEX_FILE.to_string()]);

        // cancelling an upload that already failed reports the failure
        let task = library.upload(&alice, "orphan.pdf", pdf).unwrap();
        let mut progress = task.subscribe();
        progress
            .wait_for(|state| matches!(state, UploadState::Failed(_)))
            .await
            .unwrap();
        assert!(matches!(task.cancel().await, Err(LibraryError::Io { .. })));
        assert_eq!(stored_files(&library, &alice), vec![INDEX_FILE.to_string()]);
    }
}
