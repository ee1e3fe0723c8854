//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::types::NodeType;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent warpper for [`serde_json::Error`]
    #[cfg(feature = "serde")]
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    /// the leading bytes are neither "BY" nor "YB"
    #[error("unrecognized magic {magic:02X?}, expected \"BY\" or \"YB\"")]
    #[diagnostic(help("compressed files have to be decompressed before reading"))]
    UnrecognizedMagic {
        /// The bytes found at the start of the buffer
        magic: [u8; 2],
    },

    /// version is unknown, or cannot hold a node present in the tree
    #[error("byml version {version} is not supported{}", for_node(.node_type))]
    UnsupportedVersion {
        /// The offending version
        version: u16,
        /// The node type the version is unable to hold, if any
        node_type: Option<NodeType>,
    },

    /// a field or table extends past the end of the buffer
    #[error("input truncated: {length} bytes required at offset {offset:#x}")]
    TruncatedInput {
        /// Where the field starts
        offset: usize,
        /// How many bytes the field needs
        length: usize,
    },

    /// an offset leaves the buffer or does not land on a node boundary
    #[error("invalid offset {offset:#x} referenced at {at:#x}")]
    InvalidOffset {
        /// The offset that failed to resolve
        offset: u32,
        /// Where the offset was read from
        at: usize,
    },

    /// a pool or path index outside of its table
    #[error("index {index} referenced at {at:#x} is outside of a table holding {len} entries")]
    InvalidReference {
        /// The index that failed to resolve
        index: u32,
        /// Number of entries in the referenced table
        len: usize,
        /// Where the index was read from
        at: usize,
    },

    /// a string can not be stored or decoded
    #[error("invalid string at {at:#x}")]
    InvalidString {
        /// Where the string starts, or zero while writing
        at: usize,
    },

    /// node tag unknown or not valid for the document version
    #[error("node type {tag:#04X} at {at:#x} is not valid for byml version {version}")]
    UnsupportedNodeType {
        /// The tag byte found
        tag: u8,
        /// Version of the document being read
        version: u16,
        /// Where the tag was read from
        at: usize,
    },

    /// node accessed as a type it does not hold
    #[error("expected a {expected} node but found a {found} node")]
    TypeMismatch {
        /// The type the caller asked for
        expected: NodeType,
        /// The type actually stored
        found: NodeType,
    },

    /// a dictionary key was given more than once
    #[error("duplicate dictionary key {0:?}")]
    DuplicateKey(String),

    /// document roots have to be an array or a dictionary
    #[error("a {0} node can not be the root of a document")]
    NonRootType(NodeType),

    /// array index past the end
    #[error("index {index} is out of bounds for an array of length {len}")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// Length of the array
        len: usize,
    },

    /// count does not fit in the 24 bit count field
    #[error("{len} entries do not fit in a single byml container")]
    ContainerTooLarge {
        /// Number of entries requested
        len: usize,
    },
}

fn for_node(node_type: &Option<NodeType>) -> String {
    node_type
        .as_ref()
        .map(|t| format!(" for {t} nodes"))
        .unwrap_or_default()
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
