//! Types for writing BYML documents
//!

use binrw::BinWrite;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::io::Cursor;
use tracing::{debug, instrument, trace};

use crate::bytes::{to_offset, ByteWriter};
use crate::error::{Error, Result};
use crate::format::{
    magic_for, BymlHeader, Capabilities, Endianness, PATH_POINT_SIZE, TAG_ARRAY,
    TAG_DICTIONARY, TAG_PATH_TABLE, TAG_STRING_TABLE,
};
use crate::types::{Dictionary, Document, Node, PathPoint};

/// BYML document serializer
///
/// Output only depends on the document: writing the same document twice
/// produces identical bytes.
///
/// ```
/// # fn doit() -> nx_byml::error::Result<()>
/// # {
/// use nx_byml::{BymlWriter, Document, NodeType};
///
/// let mut document = Document::empty(NodeType::Array)?;
/// document.root_mut().push("hello")?;
///
/// let bytes = BymlWriter::new(&document).write()?;
/// assert_eq!(&bytes[..2], b"YB");
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct BymlWriter<'a> {
    document: &'a Document,
}

impl<'a> BymlWriter<'a> {
    pub fn new(document: &'a Document) -> Self {
        BymlWriter { document }
    }

    /// Serialize the document.
    ///
    /// Fails without producing output if the document version cannot hold a
    /// node present in the tree.
    #[instrument(skip_all, err, fields(version = self.document.version))]
    pub fn write(&self) -> Result<Vec<u8>> {
        let document = self.document;
        let capabilities = Capabilities::for_version(document.version)?;
        capabilities.check_paths(document.support_paths)?;

        let pools = Pools::collect(document, &capabilities)?;
        debug!(
            keys = pools.keys.len(),
            strings = pools.strings.len(),
            paths = pools.paths.len(),
            "collected pools"
        );

        let header_size = BymlHeader::size(document.support_paths);
        let mut state = WriteState {
            out: ByteWriter::new(document.endianness),
            capabilities,
            pools,
        };
        state.out.bytes(&vec![0; header_size]);

        let mut header = BymlHeader {
            version: document.version,
            ..Default::default()
        };
        header.key_table = write_string_table(&mut state.out, &capabilities, &state.pools.keys)?;
        header.string_table =
            write_string_table(&mut state.out, &capabilities, &state.pools.strings)?;
        if document.support_paths {
            header.path_table = Some(state.path_table()?);
        }
        header.root = state.nodes(Queued::root(&document.root)?)?;
        debug!(?header, "laid out document");

        state.out.align(capabilities.alignment);
        let mut bytes = state.out.into_inner();
        bytes[..2].copy_from_slice(&magic_for(document.endianness));
        header.write_options(
            &mut Cursor::new(&mut bytes[2..header_size]),
            document.endianness.into(),
            (),
        )?;

        Ok(bytes)
    }
}

/// Distinct strings and paths of a document, in the order they are stored
struct Pools<'a> {
    keys: Vec<&'a str>,
    key_index: HashMap<&'a str, u32>,
    strings: Vec<&'a str>,
    string_index: HashMap<&'a str, u32>,
    paths: Vec<&'a [PathPoint]>,
    path_index: HashMap<Vec<u32>, u32>,
}

impl<'a> Pools<'a> {
    /// Walk the tree once, collecting pool entries and rejecting nodes the
    /// version cannot hold
    fn collect(document: &'a Document, capabilities: &Capabilities) -> Result<Pools<'a>> {
        let mut keys = BTreeSet::new();
        let mut strings = BTreeSet::new();
        let mut paths = Vec::new();
        let mut path_index = HashMap::new();

        let mut stack = vec![&document.root];
        while let Some(node) = stack.pop() {
            let node_type = node.node_type();
            let allowed = match node {
                Node::Path(_) => document.support_paths,
                _ => capabilities.allows(node_type),
            };
            if !allowed {
                return Err(Error::UnsupportedVersion {
                    version: capabilities.version,
                    node_type: Some(node_type),
                });
            }

            match node {
                Node::String(value) => {
                    strings.insert(checked(value)?);
                }
                Node::Path(points) => {
                    let key = path_key(points);
                    if !path_index.contains_key(&key) {
                        path_index.insert(key, paths.len() as u32);
                        paths.push(points.as_slice());
                    }
                }
                Node::Array(items) => stack.extend(items.iter().rev()),
                Node::Dictionary(map) => {
                    for key in map.keys() {
                        keys.insert(checked(key)?);
                    }
                    stack.extend(sorted_entries(map).into_iter().rev().map(|(_, v)| v));
                }
                _ => {}
            }
        }

        let keys: Vec<&str> = keys.into_iter().collect();
        let strings: Vec<&str> = strings.into_iter().collect();
        Ok(Pools {
            key_index: index_of(&keys),
            string_index: index_of(&strings),
            keys,
            strings,
            paths,
            path_index,
        })
    }
}

/// A container waiting for its table to be written
#[derive(Clone, Copy)]
enum Queued<'a> {
    Array(&'a [Node]),
    Dictionary(&'a Dictionary),
}

impl<'a> Queued<'a> {
    fn root(node: &'a Node) -> Result<Self> {
        match node {
            Node::Array(items) => Ok(Queued::Array(items)),
            Node::Dictionary(map) => Ok(Queued::Dictionary(map)),
            other => Err(Error::NonRootType(other.node_type())),
        }
    }
}

/// A value stored after the containers and referenced by offset
#[derive(Clone, Copy)]
enum Leaf<'a> {
    Binary(&'a [u8]),
    Int64(i64),
    UInt64(u64),
    Double(f64),
}

struct WriteState<'a> {
    out: ByteWriter,
    capabilities: Capabilities,
    pools: Pools<'a>,
}

impl<'a> WriteState<'a> {
    /// Write the path table, returning its offset or zero when it is empty
    fn path_table(&mut self) -> Result<u32> {
        if self.pools.paths.is_empty() {
            return Ok(0);
        }

        self.out.align(self.capabilities.alignment);
        let start = self.out.position();
        self.out.u8(TAG_PATH_TABLE);
        self.out.u24(self.pools.paths.len())?;

        let mut relative = 4 + (self.pools.paths.len() + 1) * 4;
        for points in &self.pools.paths {
            self.out.u32(to_offset(relative)?)?;
            relative += points.len() * PATH_POINT_SIZE;
        }
        self.out.u32(to_offset(relative)?)?;

        for point in self.pools.paths.iter().flat_map(|p| p.iter()) {
            for word in point.position.iter().chain(point.normal.iter()) {
                self.out.u32(word.to_bits())?;
            }
            self.out.u32(point.extra)?;
        }
        to_offset(start)
    }

    /// Lay out every container breadth first, then every out of line leaf,
    /// returning the offset of the root
    fn nodes(&mut self, root: Queued<'a>) -> Result<u32> {
        let mut queue: VecDeque<(Queued<'a>, Option<usize>)> = VecDeque::from([(root, None)]);
        let mut leaves: Vec<(Leaf<'a>, usize)> = Vec::new();
        let mut root_offset = 0;

        while let Some((node, slot)) = queue.pop_front() {
            self.out.align(self.capabilities.alignment);
            let offset = to_offset(self.out.position())?;
            match slot {
                Some(at) => self.out.patch_u32(at, offset),
                None => root_offset = offset,
            }

            match node {
                Queued::Array(items) => {
                    trace!(offset, count = items.len(), "writing array");
                    self.out.u8(TAG_ARRAY);
                    self.out.u24(items.len())?;
                    for item in items {
                        self.out.u8(self.capabilities.tag_for(item.node_type()));
                    }
                    self.out.align(4);
                    for item in items {
                        self.slot(item, &mut queue, &mut leaves)?;
                    }
                }
                Queued::Dictionary(map) => {
                    trace!(offset, count = map.len(), "writing dictionary");
                    self.out.u8(TAG_DICTIONARY);
                    self.out.u24(map.len())?;
                    for (key, value) in sorted_entries(map) {
                        self.out.u24(self.pools.key_index[key.as_str()] as usize)?;
                        self.out.u8(self.capabilities.tag_for(value.node_type()));
                        self.slot(value, &mut queue, &mut leaves)?;
                    }
                }
            }
        }

        let mut written: HashMap<Vec<u8>, u32> = HashMap::new();
        for (leaf, at) in leaves {
            let payload = leaf_payload(leaf, self.out.endianness())?;
            let offset = match written.get(&payload) {
                Some(offset) => *offset,
                None => {
                    self.out.align(self.capabilities.alignment);
                    let offset = to_offset(self.out.position())?;
                    self.out.bytes(&payload);
                    written.insert(payload, offset);
                    offset
                }
            };
            self.out.patch_u32(at, offset);
        }

        Ok(root_offset)
    }

    /// Write the value slot of a node, queueing anything that lives out of line
    fn slot(
        &mut self,
        node: &'a Node,
        queue: &mut VecDeque<(Queued<'a>, Option<usize>)>,
        leaves: &mut Vec<(Leaf<'a>, usize)>,
    ) -> Result<()> {
        let at = self.out.position();
        match node {
            Node::String(value) => self.out.u32(self.pools.string_index[value.as_str()])?,
            Node::Path(points) => self.out.u32(self.pools.path_index[&path_key(points)])?,
            Node::Bool(value) => self.out.u32(u32::from(*value))?,
            Node::Int32(value) => self.out.u32(*value as u32)?,
            Node::UInt32(value) => self.out.u32(*value)?,
            Node::Float32(value) => self.out.u32(value.to_bits())?,
            Node::Null => self.out.u32(0)?,
            Node::Array(items) => {
                self.out.u32(0)?;
                queue.push_back((Queued::Array(items), Some(at)));
            }
            Node::Dictionary(map) => {
                self.out.u32(0)?;
                queue.push_back((Queued::Dictionary(map), Some(at)));
            }
            Node::Binary(data) => {
                self.out.u32(0)?;
                leaves.push((Leaf::Binary(data), at));
            }
            Node::Int64(value) => {
                self.out.u32(0)?;
                leaves.push((Leaf::Int64(*value), at));
            }
            Node::UInt64(value) => {
                self.out.u32(0)?;
                leaves.push((Leaf::UInt64(*value), at));
            }
            Node::Double(value) => {
                self.out.u32(0)?;
                leaves.push((Leaf::Double(*value), at));
            }
        }
        Ok(())
    }
}

/// Write a string pool, returning its offset or zero when it is empty
fn write_string_table(
    out: &mut ByteWriter,
    capabilities: &Capabilities,
    strings: &[&str],
) -> Result<u32> {
    if strings.is_empty() {
        return Ok(0);
    }

    out.align(capabilities.alignment);
    let start = out.position();
    out.u8(TAG_STRING_TABLE);
    out.u24(strings.len())?;

    let mut relative = 4 + (strings.len() + 1) * 4;
    for value in strings {
        out.u32(to_offset(relative)?)?;
        relative += value.len() + 1;
    }
    out.u32(to_offset(relative)?)?;

    for value in strings {
        out.bytes(value.as_bytes());
        out.u8(0);
    }
    to_offset(start)
}

/// Encoded form of an out of line leaf
fn leaf_payload(leaf: Leaf, endianness: Endianness) -> Result<Vec<u8>> {
    let mut payload = ByteWriter::new(endianness);
    match leaf {
        Leaf::Binary(data) => {
            payload.u32(to_offset(data.len())?)?;
            payload.bytes(data);
        }
        Leaf::Int64(value) => payload.u64(value as u64)?,
        Leaf::UInt64(value) => payload.u64(value)?,
        Leaf::Double(value) => payload.u64(value.to_bits())?,
    }
    Ok(payload.into_inner())
}

/// Strings are stored null terminated, so they cannot hold a NUL themselves
fn checked(value: &str) -> Result<&str> {
    if value.contains('\0') {
        return Err(Error::InvalidString { at: 0 });
    }
    Ok(value)
}

fn index_of<'a>(sorted: &[&'a str]) -> HashMap<&'a str, u32> {
    sorted
        .iter()
        .enumerate()
        .map(|(i, value)| (*value, i as u32))
        .collect()
}

fn sorted_entries(map: &Dictionary) -> Vec<(&String, &Node)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Bit exact identity of a path, used to store equal paths once
fn path_key(points: &[PathPoint]) -> Vec<u32> {
    points
        .iter()
        .flat_map(|p| {
            p.position
                .iter()
                .chain(p.normal.iter())
                .map(|f| f.to_bits())
                .chain(std::iter::once(p.extra))
        })
        .collect()
}
