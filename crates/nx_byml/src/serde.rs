use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::format::{Capabilities, Endianness};
use crate::types::{Document, Node};

/// Serialized form of a document: the tree plus what is needed to write it back
#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u16,
    endianness: Endianness,
    support_paths: bool,
    root: &'a Node,
}

#[derive(Deserialize)]
struct DocumentRepr {
    version: u16,
    #[serde(default)]
    endianness: Endianness,
    #[serde(default)]
    support_paths: bool,
    root: Node,
}

impl TryFrom<DocumentRepr> for Document {
    type Error = Error;

    fn try_from(repr: DocumentRepr) -> Result<Self> {
        Capabilities::for_version(repr.version)?.check_paths(repr.support_paths)?;

        let mut document = Document::new(repr.root)?;
        document.version = repr.version;
        document.endianness = repr.endianness;
        document.support_paths = repr.support_paths;
        Ok(document)
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        DocumentRef {
            version: self.version,
            endianness: self.endianness,
            support_paths: self.support_paths,
            root: &self.root,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Document::try_from(DocumentRepr::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

/// Floats that JSON numbers cannot carry are written as strings: `NaN`,
/// `inf` and `-inf`, or the hex bit pattern of a NaN with a payload.
macro_rules! lossless_float {
    ($name:ident, $float:ty, $bits:ty) => {
        pub(crate) mod $name {
            use std::fmt;

            use serde::de::{Error, Unexpected, Visitor};
            use serde::{Deserialize, Deserializer, Serialize, Serializer};

            pub fn serialize<S>(value: &$float, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                if value.is_finite() {
                    value.serialize(serializer)
                } else if value.is_nan() && value.to_bits() != <$float>::NAN.to_bits() {
                    serializer.collect_str(&format_args!("{:#x}", value.to_bits()))
                } else if value.is_nan() {
                    serializer.serialize_str("NaN")
                } else if value.is_sign_positive() {
                    serializer.serialize_str("inf")
                } else {
                    serializer.serialize_str("-inf")
                }
            }

            pub fn deserialize<'de, D>(deserializer: D) -> Result<$float, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(FloatVisitor)
            }

            struct FloatVisitor;

            impl Visitor<'_> for FloatVisitor {
                type Value = $float;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("a number, NaN, inf, -inf or a hex bit pattern")
                }

                fn visit_f64<E: Error>(self, value: f64) -> Result<$float, E> {
                    Ok(value as $float)
                }

                fn visit_u64<E: Error>(self, value: u64) -> Result<$float, E> {
                    Ok(value as $float)
                }

                fn visit_i64<E: Error>(self, value: i64) -> Result<$float, E> {
                    Ok(value as $float)
                }

                fn visit_str<E: Error>(self, value: &str) -> Result<$float, E> {
                    match value {
                        "NaN" => Ok(<$float>::NAN),
                        "inf" => Ok(<$float>::INFINITY),
                        "-inf" => Ok(<$float>::NEG_INFINITY),
                        other => other
                            .strip_prefix("0x")
                            .and_then(|hex| <$bits>::from_str_radix(hex, 16).ok())
                            .map(<$float>::from_bits)
                            .ok_or_else(|| E::invalid_value(Unexpected::Str(other), &self)),
                    }
                }
            }

            /// A float that serializes without loss
            #[allow(dead_code)]
            pub struct Lossless(pub $float);

            impl Serialize for Lossless {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: Serializer,
                {
                    serialize(&self.0, serializer)
                }
            }

            impl<'de> Deserialize<'de> for Lossless {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserialize(deserializer).map(Lossless)
                }
            }
        }
    };
}

lossless_float!(float32, f32, u32);
lossless_float!(float64, f64, u64);

/// Path point vectors
pub(crate) mod float32_triple {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::float32::Lossless;

    pub fn serialize<S>(values: &[f32; 3], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        values.map(Lossless).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[f32; 3], D::Error>
    where
        D: Deserializer<'de>,
    {
        <[Lossless; 3]>::deserialize(deserializer).map(|values| values.map(|value| value.0))
    }
}

impl Document {
    /// Render the document as pretty printed JSON. Every node keeps its type.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document previously rendered by [`Document::to_json`]
    pub fn from_json(json: &str) -> Result<Document> {
        let repr: DocumentRepr = serde_json::from_str(json)?;
        Document::try_from(repr)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::format::Endianness;
    use crate::types::{Document, Node, NodeType, PathPoint};

    #[test]
    fn json_keeps_types_and_metadata() -> Result<()> {
        let mut document = Document::new(Node::dictionary([
            ("count", Node::UInt32(3)),
            ("signed", Node::Int32(3)),
            ("big", Node::UInt64(u64::MAX)),
            ("nothing", Node::Null),
            ("tags", Node::Array(vec!["a".into(), "b".into()])),
        ])?)?;
        document.set_version(3)?;
        document.set_endianness(Endianness::Big);

        let json = document.to_json()?;
        let parsed = Document::from_json(&json)?;

        assert_eq!(parsed, document);
        assert_eq!(parsed.root().get("count")?, Some(&Node::UInt32(3)));
        assert_eq!(parsed.root().get("signed")?, Some(&Node::Int32(3)));
        Ok(())
    }

    #[test]
    fn json_requires_container_root() {
        let json = r#"{ "version": 2, "root": { "UInt32": 1 } }"#;
        assert!(matches!(
            Document::from_json(json),
            Err(Error::NonRootType(NodeType::UInt32))
        ));
    }

    #[test]
    fn json_rejects_unknown_version() {
        let json = r#"{ "version": 7, "root": { "Array": [] } }"#;
        assert!(matches!(
            Document::from_json(json),
            Err(Error::UnsupportedVersion { version: 7, .. })
        ));
    }

    #[test]
    fn json_defaults_metadata() -> Result<()> {
        let json = r#"{ "version": 4, "root": { "Dictionary": {} } }"#;
        let document = Document::from_json(json)?;
        assert_eq!(document.endianness(), Endianness::Little);
        assert!(!document.supports_paths());
        Ok(())
    }

    /// Bit patterns of every float node in a tree, in document order
    fn float_bits(node: &Node) -> Vec<u64> {
        let mut bits = Vec::new();
        let mut pending = vec![node];
        while let Some(node) = pending.pop() {
            match node {
                Node::Float32(value) => bits.push(u64::from(value.to_bits())),
                Node::Double(value) => bits.push(value.to_bits()),
                Node::Path(points) => bits.extend(
                    points
                        .iter()
                        .flat_map(|p| p.position.iter().chain(p.normal.iter()))
                        .map(|value| u64::from(value.to_bits())),
                ),
                Node::Array(items) => pending.extend(items.iter().rev()),
                Node::Dictionary(map) => pending.extend(map.values().rev()),
                _ => {}
            }
        }
        bits
    }

    fn json_round_trip(document: &Document) -> Result<Document> {
        Document::from_json(&document.to_json()?)
    }

    #[test]
    fn json_keeps_special_floats() -> Result<()> {
        let payload_f32 = f32::from_bits(0x7FC0_0001);
        let payload_f64 = f64::from_bits(0xFFF8_0000_0000_0002);
        let mut document = Document::new(Node::Array(vec![
            Node::Float32(f32::NAN),
            Node::Float32(f32::INFINITY),
            Node::Float32(f32::NEG_INFINITY),
            Node::Float32(-0.0),
            Node::Float32(payload_f32),
            Node::Double(f64::NAN),
            Node::Double(f64::INFINITY),
            Node::Double(f64::NEG_INFINITY),
            Node::Double(-0.0),
            Node::Double(payload_f64),
            Node::Double(f64::MIN_POSITIVE / 2.0),
        ]))?;
        document.set_version(3)?;

        let json = document.to_json()?;
        assert!(json.contains(r#""Float32": "NaN""#));
        assert!(json.contains(r#""Double": "-inf""#));
        assert!(json.contains(r#""Float32": "0x7fc00001""#));

        let parsed = json_round_trip(&document)?;
        assert_eq!(float_bits(parsed.root()), float_bits(document.root()));
        assert_eq!(parsed.to_binary()?, document.to_binary()?);
        Ok(())
    }

    #[test]
    fn json_keeps_every_float_bit() -> Result<()> {
        // xorshift, so failures are reproducible
        let mut state = 0x2545_F491_4F6C_DD1Du64;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        let mut values = Vec::new();
        let mut route = Vec::new();
        for _ in 0..500 {
            values.push(Node::Double(f64::from_bits(next())));
            values.push(Node::Float32(f32::from_bits(next() as u32)));
            route.push(PathPoint {
                position: [0, 1, 2].map(|_| f32::from_bits(next() as u32)),
                normal: [0, 1, 2].map(|_| f32::from_bits(next() as u32)),
                extra: next() as u32,
            });
        }
        values.push(Node::Path(route));

        let mut document = Document::new(Node::Array(values))?;
        document.set_version(3)?;
        document.set_support_paths(true);

        let parsed = json_round_trip(&document)?;
        assert_eq!(float_bits(parsed.root()), float_bits(document.root()));
        assert_eq!(parsed.to_binary()?, document.to_binary()?);
        Ok(())
    }

    #[test]
    fn json_rejects_unknown_float_text() {
        let json = r#"{ "version": 3, "root": { "Array": [{ "Double": "infinity" }] } }"#;
        assert!(matches!(Document::from_json(json), Err(Error::JsonError(_))));
    }
}
