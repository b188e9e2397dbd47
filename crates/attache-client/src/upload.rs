//! Batch uploader: splits a selection into chunks, sends them strictly one
//! at a time so per-session ordering holds, and aggregates progress as a
//! running byte total across chunks.

use std::sync::Arc;

use attache_core::{
    AttachError, AttachmentRecord, FolderTree, ParentRef, UploadFile, UploadLimits,
};

use crate::chunk::{partition_chunks, ChunkProgress, ChunkSender, ProgressFn};
use crate::ApiClient;

/// Events surfaced to the widget observer over one upload's lifetime.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    Started { total_bytes: u64 },
    Progress { percent: f64 },
    Finished,
    Failed { message: String },
    SessionSet { session: String },
}

/// Observer callback registered with the originating upload call.
pub type UploadObserver = Arc<dyn Fn(UploadEvent) + Send + Sync>;

pub struct BatchUploader<'a> {
    client: &'a ApiClient,
    limits: UploadLimits,
}

impl<'a> BatchUploader<'a> {
    pub fn new(client: &'a ApiClient, limits: UploadLimits) -> Self {
        Self { client, limits }
    }

    /// Upload a selection. On success every returned record is inserted
    /// into `tree` by its relative path. A chunk's terminal failure aborts
    /// the remaining chunks; records from already-committed chunks stay
    /// placed.
    pub async fn upload(
        &self,
        parent: &ParentRef,
        files: Vec<UploadFile>,
        session: Option<&str>,
        tree: &mut FolderTree,
        observer: Option<UploadObserver>,
    ) -> Result<Vec<AttachmentRecord>, AttachError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        if files.len() > self.limits.max_batch_files {
            return Err(AttachError::Validation(format!(
                "Selection of {} files exceeds the limit of {}; reduce the selection or upload in batches",
                files.len(),
                self.limits.max_batch_files
            )));
        }

        let total_bytes: u64 = files.iter().map(|f| f.size()).sum();
        let emit = |event: UploadEvent| {
            if let Some(observer) = &observer {
                observer(event);
            }
        };
        emit(UploadEvent::Started { total_bytes });

        let chunks = partition_chunks(files, &self.limits);
        if chunks.len() > 1 {
            tracing::debug!(
                chunks = chunks.len(),
                total_bytes,
                chunk_max_bytes = self.limits.chunk_max_bytes,
                chunk_max_files = self.limits.chunk_max_files,
                "uploading selection in chunks"
            );
        }

        let sender = ChunkSender::new(self.client, self.limits.clone());
        let mut uploaded: u64 = 0;
        let mut records = Vec::new();

        for chunk in chunks {
            let chunk_bytes: u64 = chunk.iter().map(|f| f.size()).sum();
            let progress: Option<ProgressFn> = observer.clone().map(|observer| {
                let completed = uploaded;
                Arc::new(move |p: ChunkProgress| {
                    let percent = ((completed as f64 + p.fraction * chunk_bytes as f64)
                        / total_bytes.max(1) as f64
                        * 100.0)
                        .clamp(0.0, 100.0);
                    observer(UploadEvent::Progress { percent });
                }) as ProgressFn
            });

            match sender.send(parent, &chunk, session, progress).await {
                Ok(data) => {
                    uploaded += chunk_bytes;
                    let percent = (uploaded as f64 / total_bytes.max(1) as f64 * 100.0)
                        .clamp(0.0, 100.0);
                    emit(UploadEvent::Progress { percent });
                    for record in data.files {
                        tree.insert_record(record.clone());
                        records.push(record);
                    }
                }
                Err(err) => {
                    // abort remaining chunks; already-committed records stay
                    emit(UploadEvent::Failed {
                        message: err.to_string(),
                    });
                    return Err(err);
                }
            }
        }

        Ok(records)
    }
}
