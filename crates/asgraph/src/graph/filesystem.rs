//! File-system tree: folders and files under the file-system root.

use super::arena::{Arena, FILE_SYSTEM_ID};
use super::node::NodeId;
use crate::error::{AsgError, Result};
use crate::schema::{EdgeKind, NodeKind};
use log::debug;

/// Name of the folder standing for the root of absolute paths.
const ROOT_FOLDER_NAME: &str = "/";

impl Arena {
    /// File node for `path` under the file-system root, creating missing folders.
    ///
    /// # Errors
    ///
    /// See [`Arena::create_file_under`].
    pub fn create_file(&mut self, path: &str) -> Result<NodeId> {
        self.create_file_under(path, FILE_SYSTEM_ID)
    }

    /// File node for `path` below an explicit folder (or the file-system root).
    ///
    /// Backslashes are treated as slashes. A leading slash anchors the path at
    /// a folder named `/`. Folders are matched by exact name under the current
    /// folder, so differently spelled variants of a path live side by side.
    /// Calling this twice with the same path returns the same file and creates
    /// nothing the second time.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidPath`] if the path is empty, if a segment is
    /// empty (doubled or trailing separator) or if `under` is not an existing
    /// folder or file-system root.
    pub fn create_file_under(&mut self, path: &str, under: NodeId) -> Result<NodeId> {
        if path.is_empty() {
            return Err(AsgError::invalid_path(path, "empty path"));
        }
        match self.get_pointer(under).map(|n| n.kind()) {
            Some(NodeKind::FileSystem | NodeKind::Folder) => {}
            Some(kind) => {
                return Err(AsgError::invalid_path(
                    path,
                    format!("anchor {under} is a {kind}, not a folder"),
                ))
            }
            None => {
                return Err(AsgError::invalid_path(
                    path,
                    format!("anchor {under} does not exist"),
                ))
            }
        }

        let normalized = path.replace('\\', "/");
        let (absolute, relative) = match normalized.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, normalized.as_str()),
        };
        let mut segments: Vec<&str> = relative.split('/').collect();
        let file_name = segments.pop().unwrap_or_default();
        if file_name.is_empty() {
            return Err(AsgError::invalid_path(path, "missing file name"));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(AsgError::invalid_path(path, "empty folder name"));
        }

        let mut current = under;
        if absolute {
            current = self.child_entry(current, ROOT_FOLDER_NAME, NodeKind::Folder)?;
        }
        for segment in segments {
            current = self.child_entry(current, segment, NodeKind::Folder)?;
        }
        self.child_entry(current, file_name, NodeKind::File)
    }

    /// Existing child of `parent` with this name and kind, or a new one.
    fn child_entry(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId> {
        let edge = match self.get_ref(parent)?.kind() {
            NodeKind::FileSystem => EdgeKind::FileSystemHasFSEntry,
            _ => EdgeKind::FolderContains,
        };

        let existing = self.get_ref(parent)?.targets(edge).find(|&child| {
            self.get_pointer(child).is_some_and(|n| n.kind() == kind) && self.name(child) == name
        });
        if let Some(child) = existing {
            return Ok(child);
        }

        let child = self.create_node(kind)?;
        self.set_name(child, name)?;
        self.add_edge(parent, edge, child)?;
        debug!("Created {kind} '{name}' ({child}) under {parent}");
        Ok(child)
    }
}
