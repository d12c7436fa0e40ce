use super::error::LibraryError;
use super::FileRecord;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Blob bytes written between progress updates
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    /// Fraction of bytes written so far, in `0.0..=1.0`
    Progressing(f32),
    Completed(FileRecord),
    Failed(String),
}

/// A running upload. Watch it through [`UploadTask::subscribe`], then either
/// [`finish`](UploadTask::finish) or [`cancel`](UploadTask::cancel) it.
pub struct UploadTask {
    pub(super) state: watch::Receiver<UploadState>,
    pub(super) cancel: watch::Sender<bool>,
    pub(super) handle: JoinHandle<Result<FileRecord, LibraryError>>,
}

impl UploadTask {
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.clone()
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    /// Wait for the upload to complete
    pub async fn finish(self) -> Result<FileRecord, LibraryError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(LibraryError::Cancelled),
            Err(e) => Err(LibraryError::Task(e.to_string())),
        }
    }

    /// Stop the upload and wait for it to clean up after itself.
    ///
    /// Cancellation is only honoured while bytes are still being written.
    /// Once the blob is complete the upload is committed, and the record is
    /// returned here instead of `None`. An upload that had already failed
    /// returns its error.
    pub async fn cancel(self) -> Result<Option<FileRecord>, LibraryError> {
        self.cancel.send_replace(true);

        match self.handle.await {
            Ok(Ok(record)) => Ok(Some(record)),
            Ok(Err(LibraryError::Cancelled)) => Ok(None),
            Ok(Err(e)) => Err(e),
            Err(e) if e.is_cancelled() => Ok(None),
            Err(e) => Err(LibraryError::Task(e.to_string())),
        }
    }
}
