//! Configuration module
//!
//! Upload limits and timing knobs for the batch uploader and chunk sender.
//! The bounds exist to keep each request under network/proxy body limits
//! while preserving per-session ordering.

use std::time::Duration;

// Common constants
const MAX_BATCH_FILES: usize = 10_000;
const CHUNK_MAX_FILES: usize = 50;
const CHUNK_MAX_BYTES: u64 = 2 * 1024 * 1024;
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 500;
const AUTO_ASYNC_THRESHOLD: usize = 50;
const PROGRESS_RESET_DELAY_MS: u64 = 800;

/// Limits and timings applied to every upload batch.
#[derive(Clone, Debug)]
pub struct UploadLimits {
    /// Hard ceiling on files per batch; exceeding it rejects the batch whole.
    pub max_batch_files: usize,
    /// Maximum files per chunk request.
    pub chunk_max_files: usize,
    /// Maximum payload bytes per chunk request.
    pub chunk_max_bytes: u64,
    /// Total attempts per chunk (first try included).
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` sleeps `n * retry_backoff` before retrying.
    pub retry_backoff: Duration,
    /// Staged selections above this count are uploaded asynchronously anyway.
    pub auto_async_threshold: usize,
    /// How long the progress indicator shows 100% before resetting.
    pub progress_reset_delay: Duration,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_batch_files: MAX_BATCH_FILES,
            chunk_max_files: CHUNK_MAX_FILES,
            chunk_max_bytes: CHUNK_MAX_BYTES,
            max_attempts: MAX_ATTEMPTS,
            retry_backoff: Duration::from_millis(RETRY_BACKOFF_MS),
            auto_async_threshold: AUTO_ASYNC_THRESHOLD,
            progress_reset_delay: Duration::from_millis(PROGRESS_RESET_DELAY_MS),
        }
    }
}

impl UploadLimits {
    /// Zero-delay variant for tests and non-interactive callers.
    pub fn immediate() -> Self {
        Self {
            retry_backoff: Duration::ZERO,
            progress_reset_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
