//! In memory representation of a BYML document.

use std::io::{Read, Write};

use derive_more::derive::{Display, From};
use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::{Capabilities, Endianness, DEFAULT_VERSION};
use crate::read::{BymlReader, ReaderOptions};
use crate::write::BymlWriter;

/// Kind of value held by a [`Node`]
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    #[display("string")]
    String,
    #[display("binary")]
    Binary,
    #[display("array")]
    Array,
    #[display("dictionary")]
    Dictionary,
    #[display("bool")]
    Bool,
    #[display("int32")]
    Int32,
    #[display("uint32")]
    UInt32,
    #[display("float32")]
    Float32,
    #[display("int64")]
    Int64,
    #[display("uint64")]
    UInt64,
    #[display("double")]
    Double,
    #[display("null")]
    Null,
    #[display("path")]
    Path,
}

impl NodeType {
    /// Whether values of this type live out of line and are referenced by offset
    pub fn is_out_of_line(self) -> bool {
        matches!(
            self,
            NodeType::Array
                | NodeType::Dictionary
                | NodeType::Binary
                | NodeType::Int64
                | NodeType::UInt64
                | NodeType::Double
        )
    }

    /// Whether this type can be the root of a [`Document`]
    pub fn is_container(self) -> bool {
        matches!(self, NodeType::Array | NodeType::Dictionary)
    }
}

/// A single point of a path
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathPoint {
    #[cfg_attr(feature = "serde", serde(with = "crate::serde::float32_triple"))]
    pub position: [f32; 3],
    #[cfg_attr(feature = "serde", serde(with = "crate::serde::float32_triple"))]
    pub normal: [f32; 3],
    /// Trailing word of the record, its meaning depends on the game
    pub extra: u32,
}

/// Dictionary storage. Iteration follows insertion order, equality ignores it.
pub type Dictionary = IndexMap<String, Node>;

/// One value in a BYML tree
///
/// Nodes own their children, cloning a node clones the entire subtree.
#[derive(From, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Node {
    String(String),
    Binary(Vec<u8>),
    Array(Vec<Node>),
    Dictionary(Dictionary),
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Float32(#[cfg_attr(feature = "serde", serde(with = "crate::serde::float32"))] f32),
    Int64(i64),
    UInt64(u64),
    Double(#[cfg_attr(feature = "serde", serde(with = "crate::serde::float64"))] f64),
    #[from(ignore)]
    Null,
    Path(Vec<PathPoint>),
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::String(value.to_owned())
    }
}

macro_rules! accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&self) -> Result<$ty> {
            match self {
                Node::$variant(v) => Ok(*v),
                other => Err(other.mismatch(NodeType::$variant)),
            }
        }
    };
}

impl Node {
    /// Create an empty array node
    pub fn array() -> Node {
        Node::Array(Vec::new())
    }

    /// Create a dictionary node from key/value pairs, rejecting repeated keys
    pub fn dictionary<K, I>(entries: I) -> Result<Node>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        let mut map = Dictionary::new();
        for (key, value) in entries {
            let key = key.into();
            if map.contains_key(&key) {
                return Err(Error::DuplicateKey(key));
            }
            map.insert(key, value);
        }
        Ok(Node::Dictionary(map))
    }

    /// The kind of value this node holds
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::String(_) => NodeType::String,
            Node::Binary(_) => NodeType::Binary,
            Node::Array(_) => NodeType::Array,
            Node::Dictionary(_) => NodeType::Dictionary,
            Node::Bool(_) => NodeType::Bool,
            Node::Int32(_) => NodeType::Int32,
            Node::UInt32(_) => NodeType::UInt32,
            Node::Float32(_) => NodeType::Float32,
            Node::Int64(_) => NodeType::Int64,
            Node::UInt64(_) => NodeType::UInt64,
            Node::Double(_) => NodeType::Double,
            Node::Null => NodeType::Null,
            Node::Path(_) => NodeType::Path,
        }
    }

    fn mismatch(&self, expected: NodeType) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.node_type(),
        }
    }

    /// Whether this is a null node
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    accessor!(as_bool, Bool, bool);
    accessor!(as_i32, Int32, i32);
    accessor!(as_u32, UInt32, u32);
    accessor!(as_f32, Float32, f32);
    accessor!(as_i64, Int64, i64);
    accessor!(as_u64, UInt64, u64);
    accessor!(as_f64, Double, f64);

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Node::String(s) => Ok(s),
            other => Err(other.mismatch(NodeType::String)),
        }
    }

    pub fn as_binary(&self) -> Result<&[u8]> {
        match self {
            Node::Binary(b) => Ok(b),
            other => Err(other.mismatch(NodeType::Binary)),
        }
    }

    pub fn as_path(&self) -> Result<&[PathPoint]> {
        match self {
            Node::Path(p) => Ok(p),
            other => Err(other.mismatch(NodeType::Path)),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Node>> {
        match self {
            Node::Array(a) => Ok(a),
            other => Err(other.mismatch(NodeType::Array)),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Node>> {
        match self {
            Node::Array(a) => Ok(a),
            other => Err(other.mismatch(NodeType::Array)),
        }
    }

    pub fn as_dictionary(&self) -> Result<&Dictionary> {
        match self {
            Node::Dictionary(d) => Ok(d),
            other => Err(other.mismatch(NodeType::Dictionary)),
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Result<&mut Dictionary> {
        match self {
            Node::Dictionary(d) => Ok(d),
            other => Err(other.mismatch(NodeType::Dictionary)),
        }
    }

    /// Number of children of an array or dictionary
    pub fn len(&self) -> Result<usize> {
        match self {
            Node::Array(a) => Ok(a.len()),
            Node::Dictionary(d) => Ok(d.len()),
            other => Err(other.mismatch(NodeType::Array)),
        }
    }

    /// Whether an array or dictionary holds no children
    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// Look up a dictionary value by key
    pub fn get(&self, key: &str) -> Result<Option<&Node>> {
        Ok(self.as_dictionary()?.get(key))
    }

    /// Look up a dictionary value by key for modification
    pub fn get_mut(&mut self, key: &str) -> Result<Option<&mut Node>> {
        Ok(self.as_dictionary_mut()?.get_mut(key))
    }

    /// Set a dictionary value, returning the value previously stored under `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Result<Option<Node>> {
        Ok(self.as_dictionary_mut()?.insert(key.into(), value.into()))
    }

    /// Remove a dictionary value
    pub fn remove(&mut self, key: &str) -> Result<Option<Node>> {
        Ok(self.as_dictionary_mut()?.shift_remove(key))
    }

    /// Look up an array element
    pub fn at(&self, index: usize) -> Result<Option<&Node>> {
        Ok(self.as_array()?.get(index))
    }

    /// Look up an array element for modification
    pub fn at_mut(&mut self, index: usize) -> Result<Option<&mut Node>> {
        Ok(self.as_array_mut()?.get_mut(index))
    }

    /// Append a value to an array
    pub fn push(&mut self, value: impl Into<Node>) -> Result<()> {
        self.as_array_mut()?.push(value.into());
        Ok(())
    }

    /// Replace an array element, returning the previous one
    pub fn set(&mut self, index: usize, value: impl Into<Node>) -> Result<Node> {
        let array = self.as_array_mut()?;
        let len = array.len();
        let slot = array
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;
        Ok(std::mem::replace(slot, value.into()))
    }

    /// Remove an array element, shifting the following ones down
    pub fn remove_at(&mut self, index: usize) -> Result<Node> {
        let array = self.as_array_mut()?;
        if index >= array.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: array.len(),
            });
        }
        Ok(array.remove(index))
    }
}

/// A BYML document: a root container plus the format metadata needed to write it back
///
/// ```
/// # fn doit() -> nx_byml::error::Result<()>
/// # {
/// use nx_byml::{Document, Node, NodeType};
///
/// let mut document = Document::empty(NodeType::Dictionary)?;
/// document.root_mut().insert("count", 3u32)?;
///
/// let bytes = document.to_binary()?;
/// let read = Document::from_binary(&bytes)?;
/// assert_eq!(read.root().get("count")?, Some(&Node::UInt32(3)));
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) root: Node,
    pub(crate) version: u16,
    pub(crate) endianness: Endianness,
    pub(crate) support_paths: bool,
}

impl Document {
    /// Wrap a root node using the default version, little endian and no path support
    pub fn new(root: Node) -> Result<Document> {
        check_root(&root)?;
        Ok(Document {
            root,
            version: DEFAULT_VERSION,
            endianness: Endianness::default(),
            support_paths: false,
        })
    }

    /// Create a document with an empty array or dictionary root
    pub fn empty(root_type: NodeType) -> Result<Document> {
        match root_type {
            NodeType::Array => Document::new(Node::Array(Vec::new())),
            NodeType::Dictionary => Document::new(Node::Dictionary(Dictionary::new())),
            other => Err(Error::NonRootType(other)),
        }
    }

    /// Read a document from its binary form
    pub fn from_binary(bytes: &[u8]) -> Result<Document> {
        BymlReader::default().read(bytes)
    }

    /// Read a document from its binary form with the given options
    pub fn from_binary_with(bytes: &[u8], options: ReaderOptions) -> Result<Document> {
        BymlReader::new(options).read(bytes)
    }

    /// Read a complete document from a reader
    pub fn from_reader(mut reader: impl Read, options: ReaderOptions) -> Result<Document> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Document::from_binary_with(&bytes, options)
    }

    /// Serialize the document to its binary form
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        BymlWriter::new(self).write()
    }

    /// Serialize the document into a writer
    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        writer.write_all(&self.to_binary()?)?;
        Ok(())
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Mutable access to the root. The root stays a container because only its
    /// contents can be changed through this reference; use [`Document::set_root`]
    /// to swap it.
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Replace the root, which has to be an array or a dictionary
    pub fn set_root(&mut self, root: Node) -> Result<Node> {
        check_root(&root)?;
        Ok(std::mem::replace(&mut self.root, root))
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    /// Change the version used when writing. Only known versions are accepted;
    /// whether the tree fits the version is checked on write.
    pub fn set_version(&mut self, version: u16) -> Result<()> {
        Capabilities::for_version(version)?;
        self.version = version;
        Ok(())
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    pub fn supports_paths(&self) -> bool {
        self.support_paths
    }

    pub fn set_support_paths(&mut self, support_paths: bool) {
        self.support_paths = support_paths;
    }
}

fn check_root(root: &Node) -> Result<()> {
    if root.node_type().is_container() {
        Ok(())
    } else {
        Err(Error::NonRootType(root.node_type()))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::types::{Document, Node, NodeType};

    #[test]
    fn accessor_type_mismatch() {
        let node = Node::UInt32(3);
        assert_eq!(node.as_u32().ok(), Some(3));
        assert!(matches!(
            node.as_i32(),
            Err(Error::TypeMismatch {
                expected: NodeType::Int32,
                found: NodeType::UInt32
            })
        ));
        assert!(matches!(
            node.get("key"),
            Err(Error::TypeMismatch {
                expected: NodeType::Dictionary,
                ..
            })
        ));
    }

    #[test]
    fn dictionary_rejects_duplicate_keys() {
        let result = Node::dictionary([("a", Node::Bool(true)), ("a", Node::Bool(false))]);
        assert!(matches!(result, Err(Error::DuplicateKey(key)) if key == "a"));
    }

    #[test]
    fn dictionary_equality_ignores_order() -> Result<()> {
        let first = Node::dictionary([("a", 1u32.into()), ("b", 2u32.into())])?;
        let second = Node::dictionary([("b", 2u32.into()), ("a", 1u32.into())])?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn array_operations() -> Result<()> {
        let mut array = Node::array();
        array.push("first")?;
        array.push(2i32)?;
        array.push(Node::Null)?;
        assert_eq!(array.len()?, 3);

        let previous = array.set(1, 5i32)?;
        assert_eq!(previous, Node::Int32(2));
        assert_eq!(array.at(1)?, Some(&Node::Int32(5)));

        assert_eq!(array.remove_at(0)?, Node::String("first".into()));
        assert_eq!(array.at(0)?, Some(&Node::Int32(5)));
        assert!(matches!(
            array.set(7, Node::Null),
            Err(Error::IndexOutOfBounds { index: 7, len: 2 })
        ));
        assert!(matches!(
            array.remove_at(2),
            Err(Error::IndexOutOfBounds { index: 2, len: 2 })
        ));
        Ok(())
    }

    #[test]
    fn clone_is_deep() -> Result<()> {
        let mut original = Document::empty(NodeType::Dictionary)?;
        original.root_mut().insert("list", vec![Node::from(1u32)])?;

        let mut copy = original.clone();
        copy.root_mut()
            .get_mut("list")?
            .expect("list was inserted")
            .push(2u32)?;

        assert_eq!(original.root().get("list")?.map(|l| l.len().ok()), Some(Some(1)));
        assert_eq!(copy.root().get("list")?.map(|l| l.len().ok()), Some(Some(2)));
        Ok(())
    }

    #[test]
    fn root_has_to_be_a_container() -> Result<()> {
        assert!(matches!(
            Document::new(Node::Int32(1)),
            Err(Error::NonRootType(NodeType::Int32))
        ));
        assert!(matches!(
            Document::empty(NodeType::String),
            Err(Error::NonRootType(NodeType::String))
        ));

        let mut document = Document::empty(NodeType::Array)?;
        assert!(document.set_root(Node::Null).is_err());
        assert_eq!(document.root(), &Node::Array(Vec::new()));

        let previous = document.set_root(Node::dictionary([("a", Node::Null)])?)?;
        assert_eq!(previous, Node::Array(Vec::new()));
        Ok(())
    }

    #[test]
    fn unknown_versions_are_rejected() -> Result<()> {
        let mut document = Document::empty(NodeType::Dictionary)?;
        assert_eq!(document.version(), 2);
        document.set_version(5)?;
        assert_eq!(document.version(), 5);
        assert!(matches!(
            document.set_version(1),
            Err(Error::UnsupportedVersion { version: 1, .. })
        ));
        assert_eq!(document.version(), 5);
        Ok(())
    }
}
