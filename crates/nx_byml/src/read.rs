//! Types for reading BYML documents
//!

use binrw::BinRead;
use bon::Builder;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use tracing::{debug, instrument, trace};

use crate::bytes::ByteReader;
use crate::error::{Error, Result};
use crate::format::{
    detect, BymlHeader, Capabilities, PATH_POINT_SIZE, TAG_ARRAY, TAG_DICTIONARY,
    TAG_PATH_TABLE, TAG_STRING_TABLE,
};
use crate::types::{Dictionary, Document, Node, NodeType, PathPoint};

/// Options for how a BYML document should be read
#[derive(Debug, Default, Clone, Copy, Builder)]
pub struct ReaderOptions {
    /// Whether the document carries a path table. This cannot be detected from
    /// the data and changes the meaning of tag `0xA1`.
    #[builder(default)]
    pub support_paths: bool,
}

/// BYML document reader
///
/// ```no_run
/// fn dump(bytes: &[u8]) -> nx_byml::error::Result<()> {
///     let reader = nx_byml::BymlReader::new(
///         nx_byml::ReaderOptions::builder().support_paths(false).build(),
///     );
///     let document = reader.read(bytes)?;
///
///     println!("{:#?}", document.root());
///     Ok(())
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct BymlReader {
    options: ReaderOptions,
}

impl BymlReader {
    pub fn new(options: ReaderOptions) -> Self {
        BymlReader { options }
    }

    /// Parse a complete document. Either the whole tree is reconstructed or an
    /// error is returned.
    #[instrument(skip_all, err, fields(size = bytes.len()))]
    pub fn read(&self, bytes: &[u8]) -> Result<Document> {
        let support_paths = self.options.support_paths;

        let (endianness, version) = detect(bytes)?;
        let capabilities = Capabilities::for_version(version)?;
        capabilities.check_paths(support_paths)?;

        let header_size = BymlHeader::size(support_paths);
        if bytes.len() < header_size {
            return Err(Error::TruncatedInput {
                offset: 0,
                length: header_size,
            });
        }

        let mut cursor = Cursor::new(bytes);
        cursor.set_position(2);
        let header = BymlHeader::read_options(&mut cursor, endianness.into(), (support_paths,))?;
        debug!(%endianness, ?header, "read header");

        let mut state = ReadState {
            data: ByteReader::new(bytes, endianness),
            capabilities,
            support_paths,
            header_size,
            keys: Vec::new(),
            strings: Vec::new(),
            paths: Vec::new(),
            leaves: HashMap::new(),
        };

        state.keys = state.string_table(header.key_table, 0x04)?;
        state.strings = state.string_table(header.string_table, 0x08)?;
        if let Some(path_table) = header.path_table {
            state.paths = state.path_table(path_table, 0x0C)?;
        }
        debug!(
            keys = state.keys.len(),
            strings = state.strings.len(),
            paths = state.paths.len(),
            "read pools"
        );

        let root = if header.root == 0 {
            debug!("document has no root, using an empty dictionary");
            Node::Dictionary(Dictionary::new())
        } else {
            state.tree(header.root, header_size - 4)?
        };

        Ok(Document {
            root,
            version,
            endianness,
            support_paths,
        })
    }
}

/// Containers stored by the format
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ContainerKind {
    Array,
    Dictionary,
}

impl ContainerKind {
    fn tag(self) -> u8 {
        match self {
            ContainerKind::Array => TAG_ARRAY,
            ContainerKind::Dictionary => TAG_DICTIONARY,
        }
    }
}

/// Leaves stored out of line and referenced by offset
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum LeafKind {
    Binary,
    Int64,
    UInt64,
    Double,
}

/// A decoded value slot
enum Slot {
    Ready(Node),
    Container {
        kind: ContainerKind,
        offset: u32,
        at: usize,
    },
}

/// A container whose table has been read but whose child containers are not built yet
struct Shell {
    kind: ContainerKind,
    /// Entry keys, empty for arrays
    keys: Vec<String>,
    slots: Vec<Slot>,
}

enum Step {
    Enter {
        kind: ContainerKind,
        offset: u32,
        at: usize,
    },
    Exit {
        kind: ContainerKind,
        offset: u32,
    },
}

enum Visit {
    Open,
    Closed(ContainerKind),
}

/// State scoped to a single read call
struct ReadState<'a> {
    data: ByteReader<'a>,
    capabilities: Capabilities,
    support_paths: bool,
    header_size: usize,
    keys: Vec<String>,
    strings: Vec<String>,
    paths: Vec<Vec<PathPoint>>,
    /// Out of line leaves already decoded, by offset and kind
    leaves: HashMap<(u32, LeafKind), Node>,
}

impl ReadState<'_> {
    /// Validate an offset read at `at` and convert it into a buffer position
    fn position(&self, offset: u32, at: usize) -> Result<usize> {
        let position = offset as usize;
        if position < self.header_size
            || position >= self.data.len()
            || position % self.capabilities.alignment != 0
        {
            return Err(Error::InvalidOffset { offset, at });
        }
        Ok(position)
    }

    fn node_type(&self, tag: u8, at: usize) -> Result<NodeType> {
        self.capabilities
            .node_type_for(tag, self.support_paths)
            .ok_or(Error::UnsupportedNodeType {
                tag,
                version: self.capabilities.version,
                at,
            })
    }

    fn string_table(&self, offset: u32, at: usize) -> Result<Vec<String>> {
        if offset == 0 {
            return Ok(Vec::new());
        }

        let start = self.position(offset, at)?;
        if self.data.u8(start)? != TAG_STRING_TABLE {
            return Err(Error::InvalidOffset { offset, at });
        }
        let count = self.data.u24(start + 1)? as usize;
        self.data.slice(start + 4, (count + 1) * 4)?;

        (0..count)
            .map(|i| {
                let entry = start + 4 + i * 4;
                let relative = self.data.u32(entry)?;
                let position = start + relative as usize;
                if position >= self.data.len() {
                    return Err(Error::InvalidOffset {
                        offset: relative,
                        at: entry,
                    });
                }

                let raw = self.data.null_terminated(position)?;
                std::str::from_utf8(raw)
                    .map(str::to_owned)
                    .map_err(|_| Error::InvalidString { at: position })
            })
            .collect()
    }

    fn path_table(&self, offset: u32, at: usize) -> Result<Vec<Vec<PathPoint>>> {
        if offset == 0 {
            return Ok(Vec::new());
        }

        let start = self.position(offset, at)?;
        if self.data.u8(start)? != TAG_PATH_TABLE {
            return Err(Error::InvalidOffset { offset, at });
        }
        let count = self.data.u24(start + 1)? as usize;
        self.data.slice(start + 4, (count + 1) * 4)?;

        (0..count)
            .map(|i| {
                let entry = start + 4 + i * 4;
                let begin = self.data.u32(entry)?;
                let end = self.data.u32(entry + 4)?;
                if end < begin || (end - begin) as usize % PATH_POINT_SIZE != 0 {
                    return Err(Error::InvalidOffset {
                        offset: end,
                        at: entry + 4,
                    });
                }

                let first = start + begin as usize;
                let points = (end - begin) as usize / PATH_POINT_SIZE;
                self.data.slice(first, points * PATH_POINT_SIZE)?;
                (0..points)
                    .map(|p| self.path_point(first + p * PATH_POINT_SIZE))
                    .collect()
            })
            .collect()
    }

    fn path_point(&self, position: usize) -> Result<PathPoint> {
        let f = |i: usize| self.data.f32(position + i * 4);
        Ok(PathPoint {
            position: [f(0)?, f(1)?, f(2)?],
            normal: [f(3)?, f(4)?, f(5)?],
            extra: self.data.u32(position + 24)?,
        })
    }

    /// Decode the container tree below the root.
    ///
    /// Container tables are read depth first from an explicit stack, then the
    /// containers are assembled children first. A container referenced from
    /// several slots is decoded once and cloned for all but its last use.
    fn tree(&mut self, offset: u32, at: usize) -> Result<Node> {
        let position = self.position(offset, at)?;
        let kind = match self.data.u8(position)? {
            TAG_ARRAY => ContainerKind::Array,
            TAG_DICTIONARY => ContainerKind::Dictionary,
            _ => return Err(Error::InvalidOffset { offset, at }),
        };

        let mut visits: HashMap<u32, Visit> = HashMap::new();
        let mut shells: HashMap<u32, Shell> = HashMap::new();
        let mut references: HashMap<u32, usize> = HashMap::new();
        let mut order = Vec::new();

        let mut stack = vec![Step::Enter { kind, offset, at }];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter { kind, offset, at } => {
                    match visits.get(&offset) {
                        // Still being read, so the offset points at one of its ancestors
                        Some(Visit::Open) => return Err(Error::InvalidOffset { offset, at }),
                        Some(Visit::Closed(seen)) if *seen != kind => {
                            return Err(Error::InvalidOffset { offset, at })
                        }
                        Some(Visit::Closed(_)) => {
                            trace!(offset, "reusing decoded container");
                            *references.entry(offset).or_default() += 1;
                            continue;
                        }
                        None => {}
                    }

                    let shell = self.shell(kind, offset, at)?;
                    visits.insert(offset, Visit::Open);
                    *references.entry(offset).or_default() += 1;

                    stack.push(Step::Exit { kind, offset });
                    stack.extend(shell.slots.iter().rev().filter_map(|slot| match slot {
                        Slot::Container { kind, offset, at } => Some(Step::Enter {
                            kind: *kind,
                            offset: *offset,
                            at: *at,
                        }),
                        Slot::Ready(_) => None,
                    }));
                    shells.insert(offset, shell);
                }
                Step::Exit { kind, offset } => {
                    visits.insert(offset, Visit::Closed(kind));
                    order.push(offset);
                }
            }
        }
        debug!(containers = order.len(), "read container tables");

        let mut built: HashMap<u32, Node> = HashMap::with_capacity(order.len());
        for container in order {
            let Some(shell) = shells.remove(&container) else {
                continue;
            };

            let mut children = Vec::with_capacity(shell.slots.len());
            for slot in shell.slots {
                children.push(match slot {
                    Slot::Ready(node) => node,
                    Slot::Container { offset, at, .. } => {
                        take(&mut built, &mut references, offset, at)?
                    }
                });
            }

            let node = match shell.kind {
                ContainerKind::Array => Node::Array(children),
                ContainerKind::Dictionary => {
                    Node::Dictionary(shell.keys.into_iter().zip(children).collect())
                }
            };
            built.insert(container, node);
        }

        take(&mut built, &mut references, offset, at)
    }

    /// Read the table of a single container
    fn shell(&mut self, kind: ContainerKind, offset: u32, at: usize) -> Result<Shell> {
        let position = self.position(offset, at)?;
        if self.data.u8(position)? != kind.tag() {
            return Err(Error::InvalidOffset { offset, at });
        }
        let count = self.data.u24(position + 1)? as usize;

        match kind {
            ContainerKind::Array => {
                trace!(offset, count, "reading array");
                let types = self.data.slice(position + 4, count)?;
                let values = position + 4 + count.next_multiple_of(4);
                self.data.slice(values, count * 4)?;

                let mut slots = Vec::with_capacity(count);
                for (i, tag) in types.iter().enumerate() {
                    let node_type = self.node_type(*tag, position + 4 + i)?;
                    let slot = values + i * 4;
                    let value = self.data.u32(slot)?;
                    slots.push(self.slot(node_type, value, slot)?);
                }
                Ok(Shell {
                    kind,
                    keys: Vec::new(),
                    slots,
                })
            }
            ContainerKind::Dictionary => {
                trace!(offset, count, "reading dictionary");
                self.data.slice(position + 4, count * 8)?;

                let mut keys = Vec::with_capacity(count);
                let mut seen = HashSet::with_capacity(count);
                let mut slots = Vec::with_capacity(count);
                for i in 0..count {
                    let entry = position + 4 + i * 8;
                    let index = self.data.u24(entry)?;
                    let key = lookup(&self.keys, index, entry)?;
                    let node_type = self.node_type(self.data.u8(entry + 3)?, entry + 3)?;
                    let value = self.data.u32(entry + 4)?;

                    if !seen.insert(index) {
                        return Err(Error::DuplicateKey(key));
                    }
                    slots.push(self.slot(node_type, value, entry + 4)?);
                    keys.push(key);
                }
                Ok(Shell { kind, keys, slots })
            }
        }
    }

    /// Decode the value slot at `at`, leaving child containers for later
    fn slot(&mut self, node_type: NodeType, value: u32, at: usize) -> Result<Slot> {
        let node = match node_type {
            NodeType::String => Node::String(lookup(&self.strings, value, at)?),
            NodeType::Path => Node::Path(lookup(&self.paths, value, at)?),
            NodeType::Bool => Node::Bool(value != 0),
            NodeType::Int32 => Node::Int32(value as i32),
            NodeType::UInt32 => Node::UInt32(value),
            NodeType::Float32 => Node::Float32(f32::from_bits(value)),
            NodeType::Null => Node::Null,
            NodeType::Binary => self.leaf(LeafKind::Binary, value, at)?,
            NodeType::Int64 => self.leaf(LeafKind::Int64, value, at)?,
            NodeType::UInt64 => self.leaf(LeafKind::UInt64, value, at)?,
            NodeType::Double => self.leaf(LeafKind::Double, value, at)?,
            NodeType::Array => {
                return Ok(Slot::Container {
                    kind: ContainerKind::Array,
                    offset: value,
                    at,
                })
            }
            NodeType::Dictionary => {
                return Ok(Slot::Container {
                    kind: ContainerKind::Dictionary,
                    offset: value,
                    at,
                })
            }
        };
        Ok(Slot::Ready(node))
    }

    /// Decode out of line leaf data, once per distinct offset
    fn leaf(&mut self, kind: LeafKind, offset: u32, at: usize) -> Result<Node> {
        let position = self.position(offset, at)?;
        if let Some(node) = self.leaves.get(&(offset, kind)) {
            trace!(offset, ?kind, "reusing decoded leaf");
            return Ok(node.clone());
        }

        let node = match kind {
            LeafKind::Binary => {
                let length = self.data.u32(position)? as usize;
                Node::Binary(self.data.slice(position + 4, length)?.to_vec())
            }
            LeafKind::Int64 => Node::Int64(self.data.u64(position)? as i64),
            LeafKind::UInt64 => Node::UInt64(self.data.u64(position)?),
            LeafKind::Double => Node::Double(self.data.f64(position)?),
        };

        self.leaves.insert((offset, kind), node.clone());
        Ok(node)
    }
}

/// Hand out a built container, cloning it while other slots still refer to it
fn take(
    built: &mut HashMap<u32, Node>,
    references: &mut HashMap<u32, usize>,
    offset: u32,
    at: usize,
) -> Result<Node> {
    let node = match references.get_mut(&offset) {
        Some(remaining) if *remaining > 1 => {
            *remaining -= 1;
            built.get(&offset).cloned()
        }
        _ => built.remove(&offset),
    };
    node.ok_or(Error::InvalidOffset { offset, at })
}

fn lookup<T: Clone>(table: &[T], index: u32, at: usize) -> Result<T> {
    table
        .get(index as usize)
        .cloned()
        .ok_or(Error::InvalidReference {
            index,
            len: table.len(),
            at,
        })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::{Error, Result};
    use crate::format::Endianness;
    use crate::read::{BymlReader, ReaderOptions};
    use crate::types::{Document, Node, PathPoint};

    #[traced_test]
    #[test]
    fn read_little_endian_dictionary() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            // Header
            0x59, 0x42, 0x02, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x20, 0x00, 0x00, 0x00,
            // Keys
            0xC2, 0x01, 0x00, 0x00,
            0x0C, 0x00, 0x00, 0x00,
            0x0E, 0x00, 0x00, 0x00,
            0x61, 0x00, 0x00, 0x00,
            // Root
            0xC1, 0x01, 0x00, 0x00,
            0x00, 0x00, 0x00, 0xD3,
            0x01, 0x00, 0x00, 0x00,
        ];

        let document = Document::from_binary(&input)?;
        assert_eq!(document.version(), 2);
        assert_eq!(document.endianness(), Endianness::Little);
        assert!(!document.supports_paths());
        assert_eq!(document.root(), &Node::dictionary([("a", Node::UInt32(1))])?);

        Ok(())
    }

    #[traced_test]
    #[test]
    fn read_big_endian_dictionary() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            // Header
            0x42, 0x59, 0x00, 0x02,
            0x00, 0x00, 0x00, 0x10,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x20,
            // Keys
            0xC2, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x0C,
            0x00, 0x00, 0x00, 0x0E,
            0x61, 0x00, 0x00, 0x00,
            // Root
            0xC1, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0xD3,
            0x00, 0x00, 0x00, 0x01,
        ];

        let document = Document::from_binary(&input)?;
        assert_eq!(document.endianness(), Endianness::Big);
        assert_eq!(document.root(), &Node::dictionary([("a", Node::UInt32(1))])?);

        Ok(())
    }

    #[traced_test]
    #[test]
    fn read_shared_offsets() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            // Header
            0x59, 0x42, 0x03, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x24, 0x00, 0x00, 0x00,
            // Keys
            0xC2, 0x02, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0x12, 0x00, 0x00, 0x00,
            0x14, 0x00, 0x00, 0x00,
            0x61, 0x00, 0x62, 0x00,
            // Root, both entries point at the same value
            0xC1, 0x02, 0x00, 0x00,
            0x00, 0x00, 0x00, 0xD5,
            0x38, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0xD5,
            0x38, 0x00, 0x00, 0x00,
            // UInt64
            0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let document = Document::from_binary(&input)?;
        assert_eq!(
            document.root(),
            &Node::dictionary([("a", Node::UInt64(7)), ("b", Node::UInt64(7))])?
        );

        Ok(())
    }

    #[traced_test]
    #[test]
    fn read_paths() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            // Header
            0x59, 0x42, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x14, 0x00, 0x00, 0x00,
            0x3C, 0x00, 0x00, 0x00,
            // Paths
            0xC3, 0x01, 0x00, 0x00,
            0x0C, 0x00, 0x00, 0x00,
            0x28, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x80, 0x3F,
            0x00, 0x00, 0x00, 0x40,
            0x00, 0x00, 0x40, 0x40,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x80, 0x3F,
            0x00, 0x00, 0x00, 0x00,
            0x05, 0x00, 0x00, 0x00,
            // Root
            0xC0, 0x01, 0x00, 0x00,
            0xA1, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let document = BymlReader::new(ReaderOptions::builder().support_paths(true).build())
            .read(&input)?;
        assert!(document.supports_paths());
        assert_eq!(
            document.root(),
            &Node::Array(vec![Node::Path(vec![PathPoint {
                position: [1.0, 2.0, 3.0],
                normal: [0.0, 1.0, 0.0],
                extra: 5,
            }])])
        );

        // Without path support the header is one word shorter, so the root offset
        // is taken from the path table field
        assert!(matches!(
            Document::from_binary(&input),
            Err(Error::InvalidOffset { offset: 0x14, .. })
        ));

        Ok(())
    }

    #[test]
    fn read_missing_root() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x59, 0x42, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let document = Document::from_binary(&input)?;
        assert_eq!(document.root(), &Node::dictionary::<String, _>([])?);
        Ok(())
    }

    #[test]
    fn read_null_requires_version_3() -> Result<()> {
        #[rustfmt::skip]
        let mut input = [
            0x59, 0x42, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0xC0, 0x01, 0x00, 0x00,
            0xFF, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        assert!(matches!(
            Document::from_binary(&input),
            Err(Error::UnsupportedNodeType {
                tag: 0xFF,
                version: 2,
                at: 0x14
            })
        ));

        input[2] = 0x03;
        let document = Document::from_binary(&input)?;
        assert_eq!(document.root(), &Node::Array(vec![Node::Null]));
        Ok(())
    }

    #[test]
    fn read_unknown_tag() {
        #[rustfmt::skip]
        let input = [
            0x59, 0x42, 0x05, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0xC0, 0x01, 0x00, 0x00,
            0x42, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        assert!(matches!(
            Document::from_binary(&input),
            Err(Error::UnsupportedNodeType { tag: 0x42, .. })
        ));
    }

    #[test]
    fn read_cycle() {
        #[rustfmt::skip]
        let input = [
            0x59, 0x42, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            // Array holding itself
            0xC0, 0x01, 0x00, 0x00,
            0xC0, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
        ];

        assert!(matches!(
            Document::from_binary(&input),
            Err(Error::InvalidOffset {
                offset: 0x10,
                at: 0x18
            })
        ));
    }

    #[test]
    fn read_misaligned_offset() {
        #[rustfmt::skip]
        let input = [
            0x59, 0x42, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0xC0, 0x01, 0x00, 0x00,
            0xC0, 0x00, 0x00, 0x00,
            0x11, 0x00, 0x00, 0x00,
        ];

        assert!(matches!(
            Document::from_binary(&input),
            Err(Error::InvalidOffset {
                offset: 0x11,
                at: 0x18
            })
        ));
    }

    #[test]
    fn read_invalid_string_index() {
        #[rustfmt::skip]
        let input = [
            0x59, 0x42, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0xC0, 0x01, 0x00, 0x00,
            0xA0, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        assert!(matches!(
            Document::from_binary(&input),
            Err(Error::InvalidReference {
                index: 0,
                len: 0,
                at: 0x18
            })
        ));
    }

    #[traced_test]
    #[test]
    fn read_shared_container() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            // Header
            0x59, 0x42, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            // Root, both slots point at the same array
            0xC0, 0x02, 0x00, 0x00,
            0xC0, 0xC0, 0x00, 0x00,
            0x20, 0x00, 0x00, 0x00,
            0x20, 0x00, 0x00, 0x00,
            // Shared
            0xC0, 0x01, 0x00, 0x00,
            0xD3, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x00, 0x00,
        ];

        let document = Document::from_binary(&input)?;
        let shared = Node::Array(vec![Node::UInt32(7)]);
        assert_eq!(document.root(), &Node::Array(vec![shared.clone(), shared]));

        Ok(())
    }

    #[test]
    fn read_shared_container_with_other_type() {
        #[rustfmt::skip]
        let input = [
            0x59, 0x42, 0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            // The second slot claims the array is a dictionary
            0xC0, 0x02, 0x00, 0x00,
            0xC0, 0xC1, 0x00, 0x00,
            0x20, 0x00, 0x00, 0x00,
            0x20, 0x00, 0x00, 0x00,
            0xC0, 0x00, 0x00, 0x00,
        ];

        assert!(matches!(
            Document::from_binary(&input),
            Err(Error::InvalidOffset {
                offset: 0x20,
                at: 0x1C
            })
        ));
    }
}
