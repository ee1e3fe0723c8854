use miette::Result;
use nx_byml::{error::Error, Document, Endianness, Node, NodeType, PathPoint, ReaderOptions};
use pretty_assertions::assert_eq;
use tracing::info;
use tracing_test::traced_test;

/// A document touching every node type a version 4 document can hold
fn sample_document() -> Result<Document> {
    let mut root = Node::dictionary([
        ("name", Node::from("sample")),
        ("enabled", Node::Bool(true)),
        ("count", Node::UInt32(3)),
        ("delta", Node::Int32(-3)),
        ("scale", Node::Float32(0.5)),
        ("id", Node::UInt64(0xDEAD_BEEF_0000_0001)),
        ("offset", Node::Int64(-1)),
        ("ratio", Node::Double(1.0 / 3.0)),
        ("nothing", Node::Null),
        ("blob", Node::Binary(vec![0xCA, 0xFE, 0xBA, 0xBE, 0x01])),
    ])?;

    let mut list = Node::array();
    for i in 0..4 {
        let mut entry = Node::dictionary::<String, _>([])?;
        entry.insert("name", format!("entry {i}"))?;
        entry.insert("tags", Node::Array(vec!["a".into(), "b".into()]))?;
        list.push(entry)?;
    }
    root.insert("list", list)?;

    let mut document = Document::new(root)?;
    document.set_version(4)?;
    Ok(document)
}

#[traced_test]
#[test]
fn round_trip_every_type() -> Result<()> {
    let document = sample_document()?;
    let bytes = document.to_binary()?;
    info!(size = bytes.len(), "wrote sample");

    let read = Document::from_binary(&bytes)?;
    assert_eq!(read, document);
    assert_eq!(read.version(), 4);
    assert_eq!(read.endianness(), Endianness::Little);
    Ok(())
}

#[traced_test]
#[test]
fn writing_is_deterministic() -> Result<()> {
    let document = sample_document()?;
    let first = document.to_binary()?;
    let second = document.to_binary()?;
    assert_eq!(first, second);

    // Output does not depend on insertion order
    let mut reordered = Node::dictionary::<String, _>([])?;
    for (key, value) in document.root().as_dictionary()?.iter().rev() {
        reordered.insert(key.clone(), value.clone())?;
    }
    let mut reordered = Document::new(reordered)?;
    reordered.set_version(4)?;
    assert_eq!(reordered.to_binary()?, first);

    // Nor on whether it was read back first
    assert_eq!(Document::from_binary(&first)?.to_binary()?, first);
    Ok(())
}

#[test]
fn byte_order_is_symmetric() -> Result<()> {
    let mut document = sample_document()?;
    let little = document.to_binary()?;

    document.set_endianness(Endianness::Big);
    let big = document.to_binary()?;

    assert_eq!(&little[..2], b"YB");
    assert_eq!(&big[..2], b"BY");
    assert_eq!(little.len(), big.len());

    let from_big = Document::from_binary(&big)?;
    assert_eq!(from_big.endianness(), Endianness::Big);
    assert_eq!(from_big.root(), Document::from_binary(&little)?.root());
    Ok(())
}

#[test]
fn null_requires_version_3() -> Result<()> {
    let mut document = Document::new(Node::dictionary([("x", Node::Null)])?)?;

    document.set_version(2)?;
    assert!(matches!(
        document.to_binary(),
        Err(Error::UnsupportedVersion {
            version: 2,
            node_type: Some(NodeType::Null)
        })
    ));

    document.set_version(3)?;
    let bytes = document.to_binary()?;
    let read = Document::from_binary(&bytes)?;
    assert_eq!(read.root().get("x")?, Some(&Node::Null));
    Ok(())
}

#[test]
fn repeated_keys_are_stored_once() -> Result<()> {
    let mut root = Node::array();
    for i in 0..1000u32 {
        root.push(Node::dictionary([("name", Node::UInt32(i))])?)?;
    }
    let bytes = Document::new(root)?.to_binary()?;

    let occurrences = bytes.windows(5).filter(|w| w == b"name\0").count();
    assert_eq!(occurrences, 1);
    Ok(())
}

#[test]
fn scenario_counts_and_tags() -> Result<()> {
    let mut document = Document::empty(NodeType::Dictionary)?;
    document.root_mut().insert("count", 3u32)?;
    document
        .root_mut()
        .insert("tags", Node::Array(vec!["a".into(), "b".into()]))?;

    let read = Document::from_binary(&document.to_binary()?)?;
    assert_eq!(read.root().get("count")?.map(Node::as_u32).transpose()?, Some(3));

    let tags = read.root().get("tags")?.map(Node::as_array).transpose()?;
    assert_eq!(
        tags.map(|t| t.iter().map(Node::as_str).collect::<Result<Vec<_>, _>>())
            .transpose()?,
        Some(vec!["a", "b"])
    );
    Ok(())
}

#[test]
fn paths_round_trip() -> Result<()> {
    let route = vec![
        PathPoint {
            position: [0.0, 1.0, 2.0],
            normal: [0.0, 1.0, 0.0],
            extra: 0,
        },
        PathPoint {
            position: [4.0, 1.0, 2.0],
            normal: [0.0, 1.0, 0.0],
            extra: 1,
        },
    ];
    let mut document = Document::new(Node::dictionary([
        ("first", Node::Path(route.clone())),
        ("second", Node::Path(route)),
    ])?)?;
    document.set_version(3)?;
    document.set_support_paths(true);

    let bytes = document.to_binary()?;
    let read = Document::from_binary_with(
        &bytes,
        ReaderOptions::builder().support_paths(true).build(),
    )?;
    assert_eq!(read, document);

    document.set_version(4)?;
    assert!(matches!(
        document.to_binary(),
        Err(Error::UnsupportedVersion {
            version: 4,
            node_type: Some(NodeType::Path)
        })
    ));
    Ok(())
}

#[test]
fn json_round_trip() -> Result<()> {
    let document = sample_document()?;
    let json = document.to_json()?;
    let parsed = Document::from_json(&json)?;

    assert_eq!(parsed, document);
    assert_eq!(parsed.to_binary()?, document.to_binary()?);
    Ok(())
}

#[test]
fn write_to_matches_to_binary() -> Result<()> {
    let document = sample_document()?;
    let mut buffer = Vec::new();
    document.write_to(&mut buffer)?;
    assert_eq!(buffer, nx_byml::write(&document)?);
    Ok(())
}

/// Free a tree without recursing through it
fn dismantle(root: Node) {
    let mut pending = vec![root];
    while let Some(mut node) = pending.pop() {
        if let Ok(children) = node.as_array_mut() {
            pending.append(children);
        }
    }
}

#[traced_test]
#[test]
fn deeply_nested_round_trip() -> Result<()> {
    let mut root = Node::array();
    for _ in 0..3000 {
        root = Node::Array(vec![root]);
    }
    let document = Document::new(root)?;
    let bytes = document.to_binary()?;
    info!(size = bytes.len(), "wrote nested arrays");

    let read = Document::from_binary(&bytes)?;
    let mut depth = 1;
    let mut node = read.root();
    while let Some(child) = node.at(0)? {
        depth += 1;
        node = child;
    }
    assert_eq!(depth, 3001);
    assert_eq!(node, &Node::array());

    dismantle(read.into_root());
    dismantle(document.into_root());
    Ok(())
}
