//! Error types for arena, traversal and persistence operations.
//!
//! Every fallible operation returns [`Result<T>`]. Errors abort the current
//! operation and propagate to the caller; the only reported-but-tolerated event
//! (a safe-mode double visit) is logged by the traversal instead of raised.

use crate::graph::NodeId;
use crate::schema::{EdgeKind, NodeKind};
use thiserror::Error;

/// Result type alias for asgraph operations.
pub type Result<T> = std::result::Result<T, AsgError>;

/// Error type for all graph operations.
#[derive(Error, Debug)]
pub enum AsgError {
    /// The id is out of range or its slot is empty
    #[error("Invalid node id: {id}")]
    InvalidNodeId {
        /// Offending id
        id: NodeId,
    },

    /// The kind cannot be instantiated through this operation
    #[error("Invalid node kind: {kind} ({reason})")]
    InvalidNodeKind {
        /// Offending kind
        kind: NodeKind,
        /// Why the kind was rejected
        reason: &'static str,
    },

    /// A node kind code read from a file is not part of the schema
    #[error("Unknown node kind code: {code}")]
    UnknownNodeKind {
        /// Raw wire code
        code: u16,
    },

    /// The node was already destroyed (or never existed)
    #[error("Node does not exist: {id}")]
    NodeDoesNotExist {
        /// Offending id
        id: NodeId,
    },

    /// An explicit-id creation hit a reserved or occupied slot
    #[error("Node id {id} is reserved or already in use")]
    DuplicateNodeId {
        /// Offending id
        id: NodeId,
    },

    /// The node kind has no specialization target
    #[error("Node {id} of kind {kind} cannot be replaced")]
    ReplaceUnsupported {
        /// Node being replaced
        id: NodeId,
        /// Its current kind
        kind: NodeKind,
    },

    /// Destruction needs the reverse edge index
    #[error("Reverse edges are disabled")]
    ReverseEdgesDisabled,

    /// A traversal was started without any visitor
    #[error("No visitor attached to the traversal")]
    NoVisitor,

    /// `create_file` rejected its path or anchor folder
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// Path as given
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// `end_*`/`add_*` called on an interning build stack without `begin_*`
    #[error("Build stack for {what} is empty")]
    EmptyBuildStack {
        /// Which build stack
        what: &'static str,
    },

    /// Edge does not fit the schema (source kind, target kind or association)
    #[error("Invalid edge {kind} from {source_id} to {target_id}: {reason}")]
    InvalidEdge {
        /// Edge kind
        kind: EdgeKind,
        /// Source node
        source_id: NodeId,
        /// Target node
        target_id: NodeId,
        /// Which rule was broken
        reason: &'static str,
    },

    /// The target of an owning edge already has a parent
    #[error("Node {id} already has parent {parent}")]
    AlreadyOwned {
        /// Child node
        id: NodeId,
        /// Its current parent
        parent: NodeId,
    },

    /// The stream does not start with a known tag
    #[error("Bad file tag: {found:?}")]
    BadTag {
        /// Bytes found instead of the tag
        found: Vec<u8>,
    },

    /// A header type appears both among caller headers and stored unknown headers
    #[error("Header type {header_type} is already present")]
    HeaderCollision {
        /// Colliding header type code
        header_type: u16,
    },

    /// Mandatory metadata key is absent
    #[error("Missing {key} information")]
    MissingMetadata {
        /// Metadata key
        key: &'static str,
    },

    /// Mandatory metadata does not match the running schema
    #[error("Wrong {key} ({expected} required, {found} found)")]
    MetadataMismatch {
        /// Metadata key
        key: &'static str,
        /// Value this build requires
        expected: String,
        /// Value found in the file
        found: String,
    },

    /// A loaded filter is longer than the arena it is applied to
    #[error("The filter does not match: {filter_len} entries for an arena of {arena_len}")]
    FilterMismatch {
        /// Entries in the filter file
        filter_len: usize,
        /// Current arena size
        arena_len: usize,
    },

    /// Structurally invalid binary data
    #[error("Corrupt data: {message}")]
    Corrupt {
        /// What could not be decoded
        message: String,
    },

    /// Underlying I/O failure
    #[error("I/O error: {message}")]
    Io {
        /// Context of the failure
        message: String,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AsgError {
    /// Create an I/O error with context.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a corrupt-data error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Create a configuration error from a message and optional source.
    pub fn config<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for AsgError {
    fn from(source: std::io::Error) -> Self {
        Self::io("stream operation failed", source)
    }
}
