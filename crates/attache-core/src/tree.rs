//! DOM-free folder tree.
//!
//! The widget's folder view is kept as an explicit arena-backed tree and
//! projected to rows for display, so path insertion and lazy-loading rules
//! are testable without any UI. Node invariant: `accumulated_path` equals
//! the `/`-join of ancestor names plus the node's own name.

use crate::models::AttachmentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
pub struct FolderNode {
    pub name: String,
    pub accumulated_path: String,
    /// Folders start collapsed; toggling never discards children.
    pub collapsed: bool,
    /// Gates the at-most-one lazy listing fetch.
    pub loaded: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    files: Vec<AttachmentRecord>,
}

#[derive(Debug)]
pub struct FolderTree {
    nodes: Vec<FolderNode>,
}

impl Default for FolderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![FolderNode {
                name: String::new(),
                accumulated_path: String::new(),
                collapsed: false,
                // The root listing is rendered by the host up front.
                loaded: true,
                parent: None,
                children: Vec::new(),
                files: Vec::new(),
            }],
        }
    }

    pub fn node(&self, id: NodeId) -> &FolderNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut FolderNode {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn files(&self, id: NodeId) -> &[AttachmentRecord] {
        &self.nodes[id.0].files
    }

    /// Exact-name lookup among the immediate children of `parent`.
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].name == name)
    }

    fn join_path(parent_path: &str, name: &str) -> String {
        if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent_path, name)
        }
    }

    /// Create a folder under `parent`. `path` overrides the accumulated path
    /// when the server supplied one (lazy listing); otherwise it is derived
    /// from the parent. New folders start collapsed and unloaded.
    pub fn add_folder(&mut self, parent: NodeId, name: &str, path: Option<&str>) -> NodeId {
        let accumulated = match path {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => Self::join_path(&self.nodes[parent.0].accumulated_path, name),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(FolderNode {
            name: name.to_string(),
            accumulated_path: accumulated,
            collapsed: true,
            loaded: false,
            parent: Some(parent),
            children: Vec::new(),
            files: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Ensure every intermediate directory of `relative_path` exists and
    /// return the container a file row belongs in. The final segment is the
    /// file name and never becomes a node. Revisiting existing nodes
    /// refreshes their accumulated path, guarding against earlier partial
    /// values.
    pub fn ensure_path(&mut self, relative_path: &str) -> NodeId {
        let segments: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Self::ROOT;
        }
        self.ensure_chain(&segments[..segments.len() - 1])
    }

    /// Ensure a pure directory path exists (every segment is a folder) and
    /// return its deepest node.
    pub fn ensure_folder(&mut self, folder_path: &str) -> NodeId {
        let segments: Vec<&str> = folder_path.split('/').filter(|s| !s.is_empty()).collect();
        self.ensure_chain(&segments)
    }

    fn ensure_chain(&mut self, chain: &[&str]) -> NodeId {
        let mut container = Self::ROOT;
        let mut accumulated = String::new();
        for &name in chain {
            accumulated = Self::join_path(&accumulated, name);
            match self.child_by_name(container, name) {
                Some(found) => {
                    self.node_mut(found).accumulated_path = accumulated.clone();
                    container = found;
                }
                None => {
                    container = self.add_folder(container, name, Some(&accumulated));
                }
            }
        }
        container
    }

    /// Place a server record according to its relative path and return the
    /// container it landed in.
    pub fn insert_record(&mut self, record: AttachmentRecord) -> NodeId {
        let container = match record.relative_path.as_deref() {
            Some(path) if path.contains('/') => self.ensure_path(path),
            _ => Self::ROOT,
        };
        self.node_mut(container).files.push(record);
        container
    }

    /// Append a file to an explicit container (lazy-listing insertion).
    pub fn add_file(&mut self, container: NodeId, record: AttachmentRecord) {
        self.node_mut(container).files.push(record);
    }

    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) {
        if id != Self::ROOT {
            self.node_mut(id).collapsed = collapsed;
        }
    }

    pub fn mark_loaded(&mut self, id: NodeId) {
        self.node_mut(id).loaded = true;
    }

    /// Find an attached folder by accumulated path.
    pub fn find_folder(&self, path: &str) -> Option<NodeId> {
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            if id != Self::ROOT && self.nodes[id.0].accumulated_path == path {
                return Some(id);
            }
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        None
    }

    /// Detach a folder row and its whole subtree. The root cannot be
    /// removed.
    pub fn remove_folder(&mut self, id: NodeId) -> bool {
        if id == Self::ROOT {
            return false;
        }
        let Some(parent) = self.nodes[id.0].parent else {
            return false;
        };
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.nodes[id.0].parent = None;
        true
    }

    /// Remove a file row by server id anywhere in the tree.
    pub fn remove_file(&mut self, file_id: &str) -> bool {
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id.0];
            if let Some(pos) = node.files.iter().position(|f| f.id == file_id) {
                node.files.remove(pos);
                return true;
            }
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        false
    }

    /// Every file reachable from the root, depth-first.
    pub fn all_files(&self) -> Vec<&AttachmentRecord> {
        let mut out = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            out.extend(self.nodes[id.0].files.iter());
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, path: Option<&str>) -> AttachmentRecord {
        AttachmentRecord {
            id: id.into(),
            name: path
                .and_then(|p| p.rsplit('/').next())
                .unwrap_or(id)
                .into(),
            size: 1,
            is_image: false,
            is_video: false,
            is_audio: false,
            is_text: false,
            relative_path: path.map(String::from),
        }
    }

    #[test]
    fn nested_path_creates_accumulated_chain() {
        let mut tree = FolderTree::new();
        let container = tree.insert_record(record("1", Some("docs/sub/report.pdf")));

        let docs = tree.child_by_name(FolderTree::ROOT, "docs").unwrap();
        assert_eq!(tree.node(docs).accumulated_path, "docs");
        assert!(tree.node(docs).collapsed);
        assert!(!tree.node(docs).loaded);

        let sub = tree.child_by_name(docs, "sub").unwrap();
        assert_eq!(tree.node(sub).accumulated_path, "docs/sub");
        assert_eq!(container, sub);
        assert_eq!(tree.files(sub)[0].id, "1");
    }

    #[test]
    fn top_level_and_single_segment_paths_stay_at_root() {
        let mut tree = FolderTree::new();
        assert_eq!(tree.insert_record(record("1", None)), FolderTree::ROOT);
        assert_eq!(
            tree.insert_record(record("2", Some("plain.txt"))),
            FolderTree::ROOT
        );
        assert_eq!(tree.files(FolderTree::ROOT).len(), 2);
    }

    #[test]
    fn existing_nodes_are_reused_not_recreated() {
        let mut tree = FolderTree::new();
        tree.insert_record(record("1", Some("docs/a.txt")));
        tree.insert_record(record("2", Some("docs/b.txt")));

        assert_eq!(tree.children(FolderTree::ROOT).len(), 1);
        let docs = tree.child_by_name(FolderTree::ROOT, "docs").unwrap();
        assert_eq!(tree.files(docs).len(), 2);
    }

    #[test]
    fn revisit_refreshes_partial_accumulated_path() {
        let mut tree = FolderTree::new();
        let docs = tree.add_folder(FolderTree::ROOT, "docs", None);
        // simulate a stale partial path recorded by an earlier insertion
        let sub = tree.add_folder(docs, "sub", Some("sub"));
        assert_eq!(tree.node(sub).accumulated_path, "sub");

        tree.ensure_path("docs/sub/x.txt");
        assert_eq!(tree.node(sub).accumulated_path, "docs/sub");
    }

    #[test]
    fn collapse_and_expand_keep_children() {
        let mut tree = FolderTree::new();
        tree.insert_record(record("1", Some("docs/a.txt")));
        let docs = tree.child_by_name(FolderTree::ROOT, "docs").unwrap();

        tree.set_collapsed(docs, false);
        tree.set_collapsed(docs, true);
        assert_eq!(tree.files(docs).len(), 1);
    }

    #[test]
    fn remove_folder_detaches_subtree() {
        let mut tree = FolderTree::new();
        tree.insert_record(record("1", Some("docs/sub/a.txt")));
        let docs = tree.child_by_name(FolderTree::ROOT, "docs").unwrap();

        assert!(tree.remove_folder(docs));
        assert!(tree.children(FolderTree::ROOT).is_empty());
        assert!(tree.find_folder("docs/sub").is_none());
        assert!(tree.all_files().is_empty());
        assert!(!tree.remove_folder(FolderTree::ROOT));
    }

    #[test]
    fn ensure_folder_treats_every_segment_as_directory() {
        let mut tree = FolderTree::new();
        let node = tree.ensure_folder("docs/sub");
        assert_eq!(tree.node(node).accumulated_path, "docs/sub");
        assert_eq!(tree.ensure_folder(""), FolderTree::ROOT);
        // reuses the chain ensure_path created
        tree.ensure_path("docs/sub/a.txt");
        assert_eq!(tree.ensure_folder("docs/sub"), node);
    }

    #[test]
    fn remove_file_by_id() {
        let mut tree = FolderTree::new();
        tree.insert_record(record("7", Some("docs/a.txt")));
        assert!(tree.remove_file("7"));
        assert!(!tree.remove_file("7"));
    }

    #[test]
    fn find_folder_by_accumulated_path() {
        let mut tree = FolderTree::new();
        tree.insert_record(record("1", Some("a/b/c/d.bin")));
        let found = tree.find_folder("a/b/c").unwrap();
        assert_eq!(tree.node(found).name, "c");
    }
}
