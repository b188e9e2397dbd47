//! Chunk partitioning and the single-chunk sender.
//!
//! A selection is split into chunks bounded by both payload bytes and file
//! count so each request stays under network/proxy body limits. One chunk
//! becomes one multipart request; file bytes are streamed through a counting
//! body so the caller observes byte-level progress ticks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use attache_core::{
    extract_error_message, is_terminal_rejection, AttachError, ParentRef, UploadFile, UploadLimits,
    UploadResponse,
};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Body;

use crate::ApiClient;

const STREAM_FRAME_BYTES: usize = 64 * 1024;

/// Progress within one chunk request.
#[derive(Debug, Clone, Copy)]
pub struct ChunkProgress {
    /// Fraction of this chunk's bytes sent, in [0, 1].
    pub fraction: f64,
    /// Bytes sent so far in this chunk.
    pub bytes_sent: u64,
}

/// Progress callback scoped to the originating upload call.
pub type ProgressFn = Arc<dyn Fn(ChunkProgress) + Send + Sync>;

/// Split files into ordered chunks. A file joins the current chunk unless
/// that would cross the byte bound (only closes a non-empty chunk, so a lone
/// oversized file still forms its own chunk) or the count bound.
pub fn partition_chunks(files: Vec<UploadFile>, limits: &UploadLimits) -> Vec<Vec<UploadFile>> {
    let mut chunks = Vec::new();
    let mut current: Vec<UploadFile> = Vec::new();
    let mut current_bytes: u64 = 0;

    for file in files {
        let size = file.size();
        if (!current.is_empty() && current_bytes + size > limits.chunk_max_bytes)
            || current.len() >= limits.chunk_max_files
        {
            chunks.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current_bytes += size;
        current.push(file);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Sends one chunk as a multipart request, retrying transient failures.
pub struct ChunkSender<'a> {
    client: &'a ApiClient,
    limits: UploadLimits,
}

impl<'a> ChunkSender<'a> {
    pub fn new(client: &'a ApiClient, limits: UploadLimits) -> Self {
        Self { client, limits }
    }

    /// Upload `files` as a single multipart submission. Terminal server
    /// rejections surface after exactly one attempt; anything else is
    /// retried with linear backoff until the attempt budget runs out.
    pub async fn send(
        &self,
        parent: &ParentRef,
        files: &[UploadFile],
        session: Option<&str>,
        progress: Option<ProgressFn>,
    ) -> Result<UploadResponse, AttachError> {
        self.client.require_csrf()?;
        let chunk_bytes: u64 = files.iter().map(|f| f.size()).sum();

        let mut last_error = None;
        for attempt in 1..=self.limits.max_attempts {
            // the form is consumed by send, so it is rebuilt per attempt
            let form = build_form(parent, files, session, chunk_bytes, progress.clone())?;
            let request = self.client.post("/attachments/upload/")?.multipart(form);

            let failure = match request.send().await {
                Err(e) => format!("Network error: {}", e),
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    if status.is_success() {
                        match serde_json::from_str::<UploadResponse>(&text) {
                            Ok(data) if data.ok => return Ok(data),
                            Ok(data) => data.error.unwrap_or_else(|| "upload failed".to_string()),
                            // body is not the expected shape: the raw text is the message
                            Err(_) => {
                                if text.is_empty() {
                                    "upload failed".to_string()
                                } else {
                                    text
                                }
                            }
                        }
                    } else {
                        let message = extract_error_message(&text, status.as_u16());
                        if status == reqwest::StatusCode::PAYLOAD_TOO_LARGE {
                            return Err(AttachError::Terminal(message));
                        }
                        message
                    }
                }
            };

            if is_terminal_rejection(&failure) {
                return Err(AttachError::Terminal(failure));
            }

            tracing::debug!(attempt, error = %failure, "chunk upload attempt failed");
            last_error = Some(failure);
            if attempt < self.limits.max_attempts {
                tokio::time::sleep(self.limits.retry_backoff * attempt).await;
            }
        }

        Err(AttachError::Exhausted {
            message: last_error.unwrap_or_else(|| "Unknown upload error".to_string()),
            attempts: self.limits.max_attempts,
        })
    }
}

fn build_form(
    parent: &ParentRef,
    files: &[UploadFile],
    session: Option<&str>,
    chunk_bytes: u64,
    progress: Option<ProgressFn>,
) -> Result<Form, AttachError> {
    let sent = Arc::new(AtomicU64::new(0));
    let mut form = Form::new();
    let mut metas = Vec::with_capacity(files.len());

    for (index, file) in files.iter().enumerate() {
        form = form.part("files", streaming_part(file, &sent, chunk_bytes, &progress)?);
        // per-index path field so the server can map by index reliably
        form = form.text(format!("relative_path[{}]", index), file.meta.path.clone());
        metas.push(file.meta.clone());
    }

    let json = serde_json::to_string(&metas).map_err(|e| AttachError::Parse(e.to_string()))?;
    form = form
        .text("relative_paths_json", json)
        .text("parent_type", parent.parent_type.clone())
        .text("parent_id", parent.parent_id.clone());
    if let Some(session) = session {
        form = form.text("upload_session", session.to_string());
    }
    Ok(form)
}

/// Wrap a file's bytes in a streamed part that advances the shared byte
/// counter and notifies the progress callback per frame.
fn streaming_part(
    file: &UploadFile,
    sent: &Arc<AtomicU64>,
    chunk_bytes: u64,
    progress: &Option<ProgressFn>,
) -> Result<Part, AttachError> {
    let content = file.content.clone();
    let mut frames: Vec<Bytes> = Vec::with_capacity(content.len() / STREAM_FRAME_BYTES + 1);
    let mut offset = 0;
    while offset < content.len() {
        let end = (offset + STREAM_FRAME_BYTES).min(content.len());
        frames.push(content.slice(offset..end));
        offset = end;
    }

    let sent = sent.clone();
    let progress = progress.clone();
    let stream = futures::stream::iter(frames.into_iter().map(move |frame| {
        let bytes_sent = sent.fetch_add(frame.len() as u64, Ordering::Relaxed) + frame.len() as u64;
        if let Some(callback) = &progress {
            callback(ChunkProgress {
                fraction: bytes_sent as f64 / chunk_bytes.max(1) as f64,
                bytes_sent,
            });
        }
        Ok::<Bytes, std::io::Error>(frame)
    }));

    let mut part = Part::stream_with_length(Body::wrap_stream(stream), file.size())
        .file_name(file.meta.name.clone());
    if let Some(content_type) = &file.content_type {
        part = part
            .mime_str(content_type)
            .map_err(|e| AttachError::Validation(format!("invalid content type: {}", e)))?;
    }
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> UploadFile {
        UploadFile::new(name, vec![0u8; size], None, 0, None)
    }

    fn sizes(chunks: &[Vec<UploadFile>]) -> Vec<usize> {
        chunks.iter().map(|c| c.len()).collect()
    }

    #[test]
    fn partition_preserves_order_and_contents() {
        let files: Vec<_> = (0..7).map(|i| file(&format!("f{}", i), 10)).collect();
        let limits = UploadLimits {
            chunk_max_files: 3,
            ..UploadLimits::default()
        };
        let chunks = partition_chunks(files, &limits);
        assert_eq!(sizes(&chunks), vec![3, 3, 1]);
        let names: Vec<_> = chunks
            .iter()
            .flatten()
            .map(|f| f.meta.name.clone())
            .collect();
        assert_eq!(names, vec!["f0", "f1", "f2", "f3", "f4", "f5", "f6"]);
    }

    #[test]
    fn partition_closes_chunk_at_byte_bound() {
        let limits = UploadLimits {
            chunk_max_bytes: 100,
            ..UploadLimits::default()
        };
        let files = vec![file("a", 60), file("b", 60), file("c", 30)];
        let chunks = partition_chunks(files, &limits);
        // a alone (b would cross 100), then b + c
        assert_eq!(sizes(&chunks), vec![1, 2]);
    }

    #[test]
    fn lone_oversized_file_forms_its_own_chunk() {
        let limits = UploadLimits {
            chunk_max_bytes: 100,
            ..UploadLimits::default()
        };
        let files = vec![file("big", 500), file("small", 10)];
        let chunks = partition_chunks(files, &limits);
        assert_eq!(sizes(&chunks), vec![1, 1]);
        assert_eq!(chunks[0][0].meta.name, "big");
    }

    #[test]
    fn hundred_twenty_small_files_split_50_50_20() {
        let files: Vec<_> = (0..120).map(|i| file(&format!("f{}", i), 20 * 1024)).collect();
        let chunks = partition_chunks(files, &UploadLimits::default());
        assert_eq!(sizes(&chunks), vec![50, 50, 20]);
    }

    #[test]
    fn empty_selection_yields_no_chunks() {
        assert!(partition_chunks(Vec::new(), &UploadLimits::default()).is_empty());
    }
}
