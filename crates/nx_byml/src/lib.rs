//! This library handles reading from and creating **BYML** files used by Nintendo game engines.
//!
//! # BYML Format Documentation
//!
//! BYML ("binary YAML") stores a tree of typed values: arrays and dictionaries at the inner nodes,
//! strings, numbers, booleans, null, binary blobs and paths at the leaves. Files are typically
//! identified with the `.byml` or `.bgyml` extensions and are often stored compressed; this crate
//! only handles the decompressed form.
//!
//! ## File Structure
//!
//! A BYML file consists of a header, up to three tables of shared data, and the node tree.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 2 bytes: "BY" for big endian, "YB" for little endian       |
//! | 0x0002         | Version                | 2 bytes: Format version, 2 through 5                       |
//! | 0x0004         | Key Table Offset       | 4 bytes: Offset of the dictionary key table, or zero       |
//! | 0x0008         | String Table Offset    | 4 bytes: Offset of the string value table, or zero         |
//! | 0x000C         | Path Table Offset      | 4 bytes: Only present in documents with path support       |
//! | 0x000C/0x0010  | Root Offset            | 4 bytes: Offset of the root array or dictionary, or zero   |
//!
//! Every multi-byte field is stored in the byte order named by the magic. All offsets are relative
//! to the start of the file and point to four byte aligned positions.
//!
//! ### String Tables
//!
//! Dictionary keys and string values are stored once each, in two separate tables sorted by their
//! bytes. A table starts with the tag byte `0xC2` and a 3-byte count, followed by `count + 1` 4-byte
//! offsets relative to the start of the table, and then the null terminated strings themselves.
//! Nodes refer to strings by their index in the table.
//!
//! ### Path Table
//!
//! Documents with path support may carry a table tagged `0xC3`, shaped like a string table but
//! holding runs of 28-byte points: a position and a normal as three 4-byte floats each, plus one
//! trailing 4-byte word.
//!
//! ### Nodes
//!
//! Each value is identified by a 1-byte tag:
//!
//! | Tag  | Type       | Value slot holds                                  | Versions          |
//! |------|------------|---------------------------------------------------|-------------------|
//! | 0xA0 | String     | Index into the string table                       | all               |
//! | 0xA1 | Path       | Index into the path table                         | 2, 3 (with paths) |
//! | 0xA1 | Binary     | Offset of a 4-byte length followed by the data    | 4, 5              |
//! | 0xC0 | Array      | Offset of the array                               | all               |
//! | 0xC1 | Dictionary | Offset of the dictionary                          | all               |
//! | 0xD0 | Bool       | 0 or 1                                            | all               |
//! | 0xD1 | Int32      | The value                                         | all               |
//! | 0xD2 | Float32    | The value                                         | all               |
//! | 0xD3 | UInt32     | The value                                         | all               |
//! | 0xD4 | Int64      | Offset of the 8-byte value                        | 3 and later       |
//! | 0xD5 | UInt64     | Offset of the 8-byte value                        | 3 and later       |
//! | 0xD6 | Double     | Offset of the 8-byte value                        | 3 and later       |
//! | 0xFF | Null       | Zero                                              | 3 and later       |
//!
//! An array is the tag `0xC0` and a 3-byte count, the tag of every element padded to four bytes,
//! and then one 4-byte value slot per element. A dictionary is the tag `0xC1` and a 3-byte count,
//! followed by 8-byte entries made of a 3-byte key table index, the value tag and the value slot.
//! Dictionary entries are sorted by key.
//!
//! Data referenced by offset may be shared by several slots.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.byml`, `.bgyml`
//! - **Endianness**: Given by the magic, big endian on older consoles
//!

mod bytes;
pub mod error;
pub mod format;
pub mod read;
#[cfg(feature = "serde")]
mod serde;
pub mod types;
pub mod write;

pub use format::{detect, magic_for, Capabilities, Endianness};
pub use read::{BymlReader, ReaderOptions};
pub use types::{Dictionary, Document, Node, NodeType, PathPoint};
pub use write::BymlWriter;

/// Read a document without path support
pub fn read(bytes: &[u8]) -> error::Result<Document> {
    BymlReader::default().read(bytes)
}

/// Serialize a document
pub fn write(document: &Document) -> error::Result<Vec<u8>> {
    BymlWriter::new(document).write()
}
