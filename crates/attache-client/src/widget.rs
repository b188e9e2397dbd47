//! Per-container widget controller.
//!
//! Owns all transient state the browser version kept in DOM attributes and
//! module globals: the lazily-created upload session, the staged selection,
//! the folder tree, progress accounting, the drag-depth counter and the
//! per-action busy set. One controller per upload-enabled container;
//! lifetime matches the container's.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use attache_core::{
    AttachError, AttachmentRecord, FolderTree, NodeId, ParentRef, ProgressState, StagedFile,
    StagedStore, UploadFile, UploadLimits,
};
use uuid::Uuid;

use crate::delete::{ConfirmPrompt, DeletionController};
use crate::upload::{BatchUploader, UploadEvent, UploadObserver};
use crate::ApiClient;

/// Static description of one upload-enabled container.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub parent: ParentRef,
    pub can_edit: bool,
    /// Container opts out of immediate upload; selections are staged until
    /// submit unless they exceed the auto-async threshold.
    pub no_async: bool,
    pub limits: UploadLimits,
}

impl WidgetConfig {
    pub fn new(parent: ParentRef) -> Self {
        Self {
            parent,
            can_edit: true,
            no_async: false,
            limits: UploadLimits::default(),
        }
    }
}

pub struct WidgetController {
    client: ApiClient,
    config: WidgetConfig,
    session: Option<String>,
    staged: StagedStore,
    tree: FolderTree,
    progress: Arc<Mutex<ProgressState>>,
    drag_depth: i32,
    busy: HashSet<String>,
    observer: Option<UploadObserver>,
}

impl WidgetController {
    pub fn new(client: ApiClient, config: WidgetConfig) -> Self {
        Self {
            client,
            config,
            session: None,
            staged: StagedStore::new(),
            tree: FolderTree::new(),
            progress: Arc::new(Mutex::new(ProgressState::new())),
            drag_depth: 0,
            busy: HashSet::new(),
            observer: None,
        }
    }

    /// Register the observer that receives upload lifecycle events.
    pub fn set_observer(&mut self, observer: UploadObserver) {
        self.observer = Some(observer);
    }

    pub fn tree(&self) -> &FolderTree {
        &self.tree
    }

    pub fn staged_rows(&self) -> Vec<StagedFile> {
        self.staged.rows().cloned().collect()
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn progress(&self) -> ProgressState {
        self.progress
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// The submit control is enabled only while nothing is in flight.
    pub fn submit_enabled(&self) -> bool {
        self.progress().inflight() == 0
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_depth > 0
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }

    /// Mirror a server-rendered record into the tree (initial page state).
    pub fn seed_record(&mut self, record: AttachmentRecord) -> NodeId {
        self.tree.insert_record(record)
    }

    /// Materialize a folder chain by accumulated path and return its
    /// deepest node (the root for an empty path).
    pub fn seed_folder(&mut self, folder_path: &str) -> NodeId {
        self.tree.ensure_folder(folder_path)
    }

    /// Lazily create the per-widget session token correlating all chunks of
    /// one logical upload.
    pub fn ensure_session(&mut self) -> String {
        if let Some(session) = &self.session {
            return session.clone();
        }
        let session = format!("s{}", Uuid::new_v4().simple());
        self.session = Some(session.clone());
        self.emit(UploadEvent::SessionSet {
            session: session.clone(),
        });
        session
    }

    /// Route a file selection: staged containers keep small selections
    /// client-side, everything else uploads immediately.
    pub async fn ingest_selection(
        &mut self,
        files: Vec<UploadFile>,
    ) -> Result<Vec<AttachmentRecord>, AttachError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        if self.config.no_async && files.len() <= self.config.limits.auto_async_threshold {
            self.stage_files(files);
            return Ok(Vec::new());
        }
        if self.config.no_async {
            tracing::debug!("large selection on staged container, uploading asynchronously");
        }
        self.upload(files).await
    }

    /// Stage files without any network traffic; folder structure still
    /// materializes in the tree so previews nest correctly.
    pub fn stage_files(&mut self, files: Vec<UploadFile>) -> Vec<StagedFile> {
        let mut rows = Vec::with_capacity(files.len());
        for file in files {
            if file.meta.path.contains('/') {
                self.tree.ensure_path(&file.meta.path);
            }
            rows.push(self.staged.stage(file));
        }
        rows
    }

    /// Remove staged files matching name and size from the pending
    /// selection.
    pub fn remove_staged(&mut self, name: &str, size: u64) -> bool {
        self.staged.remove(name, size)
    }

    /// Drain the staged selection into a real upload batch.
    pub async fn submit_staged(&mut self) -> Result<Vec<AttachmentRecord>, AttachError> {
        let files = self.staged.drain();
        self.upload(files).await
    }

    /// Upload a batch now. Runs the full bookkeeping cycle on success and
    /// failure alike so the widget never stays stuck disabled.
    pub async fn upload(
        &mut self,
        files: Vec<UploadFile>,
    ) -> Result<Vec<AttachmentRecord>, AttachError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let session = self.ensure_session();
        let total_bytes: u64 = files.iter().map(|f| f.size()).sum();
        if let Ok(mut progress) = self.progress.lock() {
            progress.begin(total_bytes);
        }

        // forward progress ticks into the shared state, then to the host
        let progress_state = self.progress.clone();
        let host_observer = self.observer.clone();
        let observer: UploadObserver = Arc::new(move |event: UploadEvent| {
            if let UploadEvent::Progress { percent } = &event {
                if let Ok(mut progress) = progress_state.lock() {
                    progress.set_percent(*percent);
                }
            }
            if let Some(host) = &host_observer {
                host(event);
            }
        });

        let uploader = BatchUploader::new(&self.client, self.config.limits.clone());
        let result = uploader
            .upload(
                &self.config.parent,
                files,
                Some(session.as_str()),
                &mut self.tree,
                Some(observer),
            )
            .await;

        self.finish_one_upload().await;
        result
    }

    /// Shared "upload finished" bookkeeping: settle the in-flight counter,
    /// hold the bar at 100% for the display delay, then reset and re-enable
    /// submit.
    async fn finish_one_upload(&mut self) {
        let settled = match self.progress.lock() {
            Ok(mut progress) => {
                progress.set_percent(100.0);
                progress.finish_one()
            }
            Err(_) => true,
        };
        if settled {
            tokio::time::sleep(self.config.limits.progress_reset_delay).await;
            if let Ok(mut progress) = self.progress.lock() {
                progress.reset();
            }
            self.emit(UploadEvent::Finished);
        }
    }

    pub fn drag_enter(&mut self) -> bool {
        self.drag_depth += 1;
        true
    }

    pub fn drag_leave(&mut self) -> bool {
        self.drag_depth = (self.drag_depth - 1).max(0);
        self.is_drag_active()
    }

    /// Dropped files reset the drag state and route like a selection.
    pub async fn drop_files(
        &mut self,
        files: Vec<UploadFile>,
    ) -> Result<Vec<AttachmentRecord>, AttachError> {
        self.drag_depth = 0;
        self.ingest_selection(files).await
    }

    /// Expand a folder node, lazily fetching its children the first time.
    /// Re-expanding a loaded node issues no request.
    pub async fn expand_folder(&mut self, node: NodeId) -> Result<(), AttachError> {
        if !self.tree.node(node).collapsed {
            return Ok(());
        }
        if !self.tree.node(node).loaded {
            let path = self.tree.node(node).accumulated_path.clone();
            match self
                .client
                .list_folder(&self.config.parent, &path, self.session.as_deref())
                .await
            {
                Ok(listing) => {
                    for folder in listing.folders {
                        self.tree.add_folder(node, &folder.name, Some(&folder.path));
                    }
                    for file in listing.files {
                        self.tree.add_file(node, file);
                    }
                    self.tree.mark_loaded(node);
                }
                Err(err) => {
                    tracing::warn!(error = %err, folder = %path, "failed to load folder content");
                    // still expands; stays unloaded so the next expand retries
                    self.tree.set_collapsed(node, false);
                    return Err(err);
                }
            }
        }
        self.tree.set_collapsed(node, false);
        Ok(())
    }

    pub fn collapse_folder(&mut self, node: NodeId) {
        self.tree.set_collapsed(node, true);
    }

    /// Delete one attachment after confirmation. Returns false when the
    /// prompt declined or the action is already in flight; the row leaves
    /// the tree only on server-confirmed success.
    pub async fn delete_attachment(
        &mut self,
        id: &str,
        prompt: &dyn ConfirmPrompt,
    ) -> Result<bool, AttachError> {
        let key = format!("attachment:{}", id);
        if self.busy.contains(&key) {
            return Ok(false);
        }
        if !prompt.confirm("Delete this attachment?") {
            return Ok(false);
        }
        self.busy.insert(key.clone());
        let result = DeletionController::new(&self.client)
            .delete_attachment(id)
            .await;
        self.busy.remove(&key);

        result.map(|()| {
            self.tree.remove_file(id);
            true
        })
    }

    /// Delete a folder and its descendants after confirmation; removes the
    /// node and its subtree on success.
    pub async fn delete_folder(
        &mut self,
        node: NodeId,
        prompt: &dyn ConfirmPrompt,
    ) -> Result<bool, AttachError> {
        let path = self.tree.node(node).accumulated_path.clone();
        if path.is_empty() {
            return Ok(false);
        }
        let key = format!("folder:{}", path);
        if self.busy.contains(&key) {
            return Ok(false);
        }
        if !prompt.confirm(&format!(
            "Delete this folder and all of its files?\n{}",
            path
        )) {
            return Ok(false);
        }
        self.busy.insert(key.clone());
        let result = DeletionController::new(&self.client)
            .delete_folder(&self.config.parent, &path)
            .await;
        self.busy.remove(&key);

        result.map(|()| {
            self.tree.remove_folder(node);
            true
        })
    }

    /// Delete a comment after confirmation. The host removes the comment
    /// element on success.
    pub async fn delete_comment(
        &mut self,
        id: &str,
        prompt: &dyn ConfirmPrompt,
    ) -> Result<bool, AttachError> {
        let key = format!("comment:{}", id);
        if self.busy.contains(&key) {
            return Ok(false);
        }
        if !prompt.confirm("Delete this comment? This cannot be undone.") {
            return Ok(false);
        }
        self.busy.insert(key.clone());
        let result = DeletionController::new(&self.client).delete_comment(id).await;
        self.busy.remove(&key);

        result.map(|()| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_depth_tracks_nested_enter_leave() {
        let client = ApiClient::new("http://example.test", None).unwrap();
        let mut widget =
            WidgetController::new(client, WidgetConfig::new(ParentRef::new("entry", "1")));

        assert!(!widget.is_drag_active());
        widget.drag_enter();
        widget.drag_enter();
        assert!(widget.is_drag_active());
        assert!(widget.drag_leave());
        assert!(!widget.drag_leave());
        // never goes negative
        assert!(!widget.drag_leave());
        widget.drag_enter();
        assert!(widget.is_drag_active());
    }

    #[test]
    fn staged_selection_builds_tree_and_rows() {
        let client = ApiClient::new("http://example.test", None).unwrap();
        let mut config = WidgetConfig::new(ParentRef::new("entry", "1"));
        config.no_async = true;
        let mut widget = WidgetController::new(client, config);

        let rows = widget.stage_files(vec![
            UploadFile::new("a.txt", b"aa".to_vec(), Some("docs/a.txt"), 0, None),
            UploadFile::new("b.txt", b"bbb".to_vec(), None, 0, None),
        ]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.id.starts_with("staged-")));
        assert!(widget.tree().find_folder("docs").is_some());

        assert!(widget.remove_staged("a.txt", 2));
        assert_eq!(widget.staged_rows().len(), 1);
    }

    #[test]
    fn session_is_created_once() {
        let client = ApiClient::new("http://example.test", None).unwrap();
        let mut widget =
            WidgetController::new(client, WidgetConfig::new(ParentRef::new("entry", "1")));
        assert!(widget.session().is_none());
        let first = widget.ensure_session();
        assert!(first.starts_with('s'));
        assert_eq!(widget.ensure_session(), first);
    }
}
