//! Byte order and version negotiation shared by the reader and writer.

use binrw::{BinRead, BinWrite};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use derive_more::derive::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::NodeType;

/// Magic of big endian documents
pub const MAGIC_BIG: [u8; 2] = *b"BY";
/// Magic of little endian documents
pub const MAGIC_LITTLE: [u8; 2] = *b"YB";

/// Versions this library can read and write
pub const SUPPORTED_VERSIONS: [u16; 4] = [2, 3, 4, 5];
/// Version given to newly created documents
pub const DEFAULT_VERSION: u16 = 2;

pub(crate) const TAG_STRING: u8 = 0xA0;
pub(crate) const TAG_BINARY_OR_PATH: u8 = 0xA1;
pub(crate) const TAG_ARRAY: u8 = 0xC0;
pub(crate) const TAG_DICTIONARY: u8 = 0xC1;
pub(crate) const TAG_STRING_TABLE: u8 = 0xC2;
pub(crate) const TAG_PATH_TABLE: u8 = 0xC3;
pub(crate) const TAG_BOOL: u8 = 0xD0;
pub(crate) const TAG_INT32: u8 = 0xD1;
pub(crate) const TAG_FLOAT32: u8 = 0xD2;
pub(crate) const TAG_UINT32: u8 = 0xD3;
pub(crate) const TAG_INT64: u8 = 0xD4;
pub(crate) const TAG_UINT64: u8 = 0xD5;
pub(crate) const TAG_DOUBLE: u8 = 0xD6;
pub(crate) const TAG_NULL: u8 = 0xFF;

/// Size of a single path point record
pub(crate) const PATH_POINT_SIZE: usize = 28;
/// Largest count representable by the 24 bit count fields
pub(crate) const MAX_COUNT: usize = 0xFF_FFFF;

/// Byte order of a document
#[derive(Display, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Endianness {
    #[display("big endian")]
    Big,
    #[default]
    #[display("little endian")]
    Little,
}

impl From<Endianness> for binrw::Endian {
    fn from(value: Endianness) -> Self {
        match value {
            Endianness::Big => binrw::Endian::Big,
            Endianness::Little => binrw::Endian::Little,
        }
    }
}

/// Magic bytes identifying a document of the given byte order
pub fn magic_for(endianness: Endianness) -> [u8; 2] {
    match endianness {
        Endianness::Big => MAGIC_BIG,
        Endianness::Little => MAGIC_LITTLE,
    }
}

/// Determine byte order and version from the start of a buffer.
///
/// Only the magic is validated here; whether the version is supported is
/// decided by [`Capabilities::for_version`].
pub fn detect(bytes: &[u8]) -> Result<(Endianness, u16)> {
    if bytes.len() < 4 {
        return Err(Error::TruncatedInput {
            offset: 0,
            length: 4,
        });
    }

    let magic = [bytes[0], bytes[1]];
    let endianness = match magic {
        MAGIC_BIG => Endianness::Big,
        MAGIC_LITTLE => Endianness::Little,
        _ => return Err(Error::UnrecognizedMagic { magic }),
    };

    let version = match endianness {
        Endianness::Big => BigEndian::read_u16(&bytes[2..4]),
        Endianness::Little => LittleEndian::read_u16(&bytes[2..4]),
    };

    Ok((endianness, version))
}

/// What a given version of the format is able to store
///
/// | Version | Null | Int64/UInt64/Double | Binary | Paths |
/// |---------|------|---------------------|--------|-------|
/// | 2       | no   | no                  | no     | yes   |
/// | 3       | yes  | yes                 | no     | yes   |
/// | 4, 5    | yes  | yes                 | yes    | no    |
///
/// Binary nodes and path nodes share the same tag, which is why a version
/// never supports both. Every version sorts dictionary keys and pool strings
/// by their bytes and aligns out of line data to four bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub version: u16,
    pub null: bool,
    pub wide_scalars: bool,
    pub binary: bool,
    pub paths: bool,
    pub alignment: usize,
}

impl Capabilities {
    /// Look up the capabilities of a version, failing for unknown versions
    pub fn for_version(version: u16) -> Result<Capabilities> {
        let (null, wide_scalars, binary, paths) = match version {
            2 => (false, false, false, true),
            3 => (true, true, false, true),
            4 | 5 => (true, true, true, false),
            _ => {
                return Err(Error::UnsupportedVersion {
                    version,
                    node_type: None,
                })
            }
        };

        Ok(Capabilities {
            version,
            null,
            wide_scalars,
            binary,
            paths,
            alignment: 4,
        })
    }

    /// Whether a node of the given type may appear in a document of this version
    pub fn allows(&self, node_type: NodeType) -> bool {
        match node_type {
            NodeType::Null => self.null,
            NodeType::Int64 | NodeType::UInt64 | NodeType::Double => self.wide_scalars,
            NodeType::Binary => self.binary,
            NodeType::Path => self.paths,
            NodeType::String
            | NodeType::Array
            | NodeType::Dictionary
            | NodeType::Bool
            | NodeType::Int32
            | NodeType::UInt32
            | NodeType::Float32 => true,
        }
    }

    /// Fail if path support was requested for a version that cannot hold paths
    pub fn check_paths(&self, support_paths: bool) -> Result<()> {
        if support_paths && !self.paths {
            return Err(Error::UnsupportedVersion {
                version: self.version,
                node_type: Some(NodeType::Path),
            });
        }
        Ok(())
    }

    /// Tag byte used to store a node type
    pub(crate) fn tag_for(&self, node_type: NodeType) -> u8 {
        match node_type {
            NodeType::String => TAG_STRING,
            NodeType::Binary | NodeType::Path => TAG_BINARY_OR_PATH,
            NodeType::Array => TAG_ARRAY,
            NodeType::Dictionary => TAG_DICTIONARY,
            NodeType::Bool => TAG_BOOL,
            NodeType::Int32 => TAG_INT32,
            NodeType::Float32 => TAG_FLOAT32,
            NodeType::UInt32 => TAG_UINT32,
            NodeType::Int64 => TAG_INT64,
            NodeType::UInt64 => TAG_UINT64,
            NodeType::Double => TAG_DOUBLE,
            NodeType::Null => TAG_NULL,
        }
    }

    /// Node type stored under a tag byte, if the tag is valid for this version
    pub(crate) fn node_type_for(&self, tag: u8, support_paths: bool) -> Option<NodeType> {
        let node_type = match tag {
            TAG_STRING => NodeType::String,
            TAG_BINARY_OR_PATH if support_paths => NodeType::Path,
            TAG_BINARY_OR_PATH => NodeType::Binary,
            TAG_ARRAY => NodeType::Array,
            TAG_DICTIONARY => NodeType::Dictionary,
            TAG_BOOL => NodeType::Bool,
            TAG_INT32 => NodeType::Int32,
            TAG_FLOAT32 => NodeType::Float32,
            TAG_UINT32 => NodeType::UInt32,
            TAG_INT64 => NodeType::Int64,
            TAG_UINT64 => NodeType::UInt64,
            TAG_DOUBLE => NodeType::Double,
            TAG_NULL => NodeType::Null,
            _ => return None,
        };
        self.allows(node_type).then_some(node_type)
    }
}

/// Fixed header following the magic
///
/// The path table offset is only present for documents with path support.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[br(import(support_paths: bool))]
pub struct BymlHeader {
    /// Format version
    pub version: u16,

    /// Offset of the key pool, zero if the document has no dictionary keys
    pub key_table: u32,

    /// Offset of the string value pool, zero if the document has no strings
    pub string_table: u32,

    /// Offset of the path table
    #[br(if(support_paths))]
    pub path_table: Option<u32>,

    /// Offset of the root container
    pub root: u32,
}

impl BymlHeader {
    /// Size of the header including the magic
    pub fn size(support_paths: bool) -> usize {
        if support_paths {
            20
        } else {
            16
        }
    }
}
