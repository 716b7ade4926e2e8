//! Structural check of a rendered IP-XACT document.
//!
//! This is not a full XSD validation. It re-reads the document with
//! quick-xml and verifies the vendor / memory-map / address-block /
//! register / field subset produced by [`crate::to_xml`]: namespace, required
//! children in schema order, numeric payloads and field placement.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{ModelError, Numeric, SchemaVersion};

/// Outcome of a structural check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub diagnostics: Vec<String>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn fail(&mut self, path: &str, message: impl AsRef<str>) {
        self.diagnostics
            .push(format!("{path}: {}", message.as_ref()));
    }
}

#[derive(Debug, Default)]
struct Node {
    prefix: Option<String>,
    local: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.local == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.local == name)
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Check `xml` against the modelled subset of `version`.
///
/// Malformed XML is reported as an error; schema violations are collected
/// into the returned report.
pub fn check(xml: &[u8], version: SchemaVersion) -> Result<CheckReport, ModelError> {
    let root = parse_tree(xml)?;
    let mut report = CheckReport::default();

    if root.local != "component" {
        report.fail("/", format!("root element is '{}', expected 'component'", root.local));
        return Ok(report);
    }
    let prefix = root.prefix.as_deref().unwrap_or_default();
    let declared = if prefix.is_empty() {
        root.attribute("xmlns")
    } else {
        root.attribute(&format!("xmlns:{prefix}"))
    };
    if declared != Some(version.namespace()) {
        report.fail(
            "/component",
            format!(
                "namespace is {:?}, expected '{}'",
                declared.unwrap_or("<none>"),
                version.namespace()
            ),
        );
    }

    expect_leading(&mut report, "/component", &root, &["vendor", "library", "name", "version"]);
    if let Some(maps) = root.child("memoryMaps") {
        for (index, map) in maps.children_named("memoryMap").enumerate() {
            check_memory_map(&mut report, &format!("/component/memoryMap[{index}]"), map);
        }
    }
    Ok(report)
}

fn check_memory_map(report: &mut CheckReport, path: &str, map: &Node) {
    expect_leading(report, path, map, &["name"]);
    for block in map.children_named("addressBlock") {
        let name = text_of(block, "name");
        let block_path = format!("{path}/addressBlock[{name}]");
        expect_in_order(report, &block_path, block, &["name", "baseAddress", "range", "width"]);
        expect_number(report, &block_path, block, "baseAddress");
        expect_number(report, &block_path, block, "range");
        expect_number(report, &block_path, block, "width");
        for register in block.children_named("register") {
            check_register(report, &block_path, register);
        }
    }
}

fn check_register(report: &mut CheckReport, parent: &str, register: &Node) {
    let path = format!("{parent}/register[{}]", text_of(register, "name"));
    expect_in_order(report, &path, register, &["name", "addressOffset", "size"]);
    expect_number(report, &path, register, "addressOffset");
    let size = expect_number(report, &path, register, "size");
    if size == Some(0) {
        report.fail(&path, "size must be positive");
    }
    for field in register.children_named("field") {
        let field_path = format!("{path}/field[{}]", text_of(field, "name"));
        expect_in_order(report, &field_path, field, &["name", "bitOffset", "bitWidth"]);
        let offset = expect_number(report, &field_path, field, "bitOffset");
        let width = expect_number(report, &field_path, field, "bitWidth");
        if width == Some(0) {
            report.fail(&field_path, "bitWidth must be positive");
        }
        if let (Some(offset), Some(width), Some(size)) = (offset, width, size) {
            if offset.saturating_add(width) > size {
                report.fail(
                    &field_path,
                    format!("bits {offset}+{width} exceed register size {size}"),
                );
            }
        }
        if let Some(access) = field.child("access") {
            const ACCESS: [&str; 5] = [
                "read-only",
                "write-only",
                "read-write",
                "writeOnce",
                "read-writeOnce",
            ];
            if !ACCESS.contains(&access.text.as_str()) {
                report.fail(&field_path, format!("invalid access '{}'", access.text));
            }
        }
    }
}

fn text_of<'a>(node: &'a Node, name: &str) -> &'a str {
    node.child(name).map(|c| c.text.as_str()).unwrap_or("?")
}

/// The first children of `node` must be exactly `names`, in order.
fn expect_leading(report: &mut CheckReport, path: &str, node: &Node, names: &[&str]) {
    for (index, name) in names.iter().enumerate() {
        match node.children.get(index) {
            Some(child) if child.local == *name => {
                if child.text.trim().is_empty() {
                    report.fail(path, format!("'{name}' is empty"));
                }
            }
            Some(child) => report.fail(
                path,
                format!("expected '{name}' at position {index}, found '{}'", child.local),
            ),
            None => report.fail(path, format!("missing '{name}'")),
        }
    }
}

/// `names` must all be present and appear in the given relative order.
fn expect_in_order(report: &mut CheckReport, path: &str, node: &Node, names: &[&str]) {
    let mut last = None;
    for name in names {
        match node.children.iter().position(|child| child.local == *name) {
            Some(pos) => {
                if last.is_some_and(|prev| pos < prev) {
                    report.fail(path, format!("'{name}' is out of order"));
                }
                last = Some(pos);
            }
            None => report.fail(path, format!("missing '{name}'")),
        }
    }
}

fn expect_number(report: &mut CheckReport, path: &str, node: &Node, name: &str) -> Option<u64> {
    let child = node.child(name)?;
    match Numeric::parse(&child.text) {
        Ok(value) => value.to_u64(),
        Err(_) => {
            report.fail(path, format!("'{name}' is not a number: '{}'", child.text));
            None
        }
    }
}

fn parse_tree(xml: &[u8]) -> Result<Node, ModelError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(open_node(&reader, &e)?),
            Ok(Event::Empty(e)) => {
                let node = open_node(&reader, &e)?;
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|err| ModelError::Xml(err.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| ModelError::Xml("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ModelError::Xml(err.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ModelError::Xml("unexpected end of document".into()));
    }
    root.ok_or_else(|| ModelError::Xml("document has no root element".into()))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

fn open_node<R>(reader: &Reader<R>, event: &BytesStart<'_>) -> Result<Node, ModelError> {
    let qname = String::from_utf8_lossy(event.name().as_ref()).to_string();
    let (prefix, local) = match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, qname),
    };
    let mut attributes = Vec::new();
    for attr in event.attributes() {
        let attr = attr.map_err(|err| ModelError::Xml(err.to_string()))?;
        let value = attr
            .decode_and_unescape_value(reader)
            .map_err(|err| ModelError::Xml(err.to_string()))?;
        attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).to_string(),
            value.to_string(),
        ));
    }
    Ok(Node {
        prefix,
        local,
        attributes,
        ..Node::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://www.accellera.org/XMLSchema/IPXACT/1685-2014";

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <ipxact:component xmlns:ipxact="{NS}">
              <ipxact:vendor>acme</ipxact:vendor>
              <ipxact:library>lib</ipxact:library>
              <ipxact:name>soc</ipxact:name>
              <ipxact:version>1.0</ipxact:version>
              <ipxact:memoryMaps><ipxact:memoryMap>
                <ipxact:name>soc</ipxact:name>
                {body}
              </ipxact:memoryMap></ipxact:memoryMaps>
            </ipxact:component>"#
        )
    }

    #[test]
    fn well_formed_subset_passes() {
        let xml = doc(
            r#"<ipxact:addressBlock>
                 <ipxact:name>uart</ipxact:name>
                 <ipxact:baseAddress>0x0</ipxact:baseAddress>
                 <ipxact:range>4096</ipxact:range>
                 <ipxact:width>32</ipxact:width>
                 <ipxact:register>
                   <ipxact:name>CTRL</ipxact:name>
                   <ipxact:addressOffset>0x0</ipxact:addressOffset>
                   <ipxact:size>8</ipxact:size>
                   <ipxact:field>
                     <ipxact:name>EN</ipxact:name>
                     <ipxact:bitOffset>7</ipxact:bitOffset>
                     <ipxact:bitWidth>1</ipxact:bitWidth>
                     <ipxact:access>read-write</ipxact:access>
                   </ipxact:field>
                 </ipxact:register>
               </ipxact:addressBlock>"#,
        );
        let report = check(xml.as_bytes(), SchemaVersion::Ieee1685_2014).expect("parse");
        assert!(report.passed(), "{:?}", report.diagnostics);
    }

    #[test]
    fn field_past_register_end_is_reported() {
        let xml = doc(
            r#"<ipxact:addressBlock>
                 <ipxact:name>uart</ipxact:name>
                 <ipxact:baseAddress>0x0</ipxact:baseAddress>
                 <ipxact:range>0x100</ipxact:range>
                 <ipxact:width>32</ipxact:width>
                 <ipxact:register>
                   <ipxact:name>CTRL</ipxact:name>
                   <ipxact:addressOffset>0x0</ipxact:addressOffset>
                   <ipxact:size>8</ipxact:size>
                   <ipxact:field>
                     <ipxact:name>EN</ipxact:name>
                     <ipxact:bitOffset>6</ipxact:bitOffset>
                     <ipxact:bitWidth>4</ipxact:bitWidth>
                     <ipxact:access>rw</ipxact:access>
                   </ipxact:field>
                 </ipxact:register>
               </ipxact:addressBlock>"#,
        );
        let report = check(xml.as_bytes(), SchemaVersion::Ieee1685_2014).expect("parse");
        assert_eq!(report.diagnostics.len(), 2, "{:?}", report.diagnostics);
        assert!(report.diagnostics[0].contains("field[EN]"));
        assert!(report.diagnostics[0].contains("exceed register size 8"));
        assert!(report.diagnostics[1].contains("invalid access 'rw'"));
    }

    #[test]
    fn wrong_namespace_and_order_are_reported() {
        let xml = r#"<ipxact:component xmlns:ipxact="urn:other">
              <ipxact:library>lib</ipxact:library>
              <ipxact:vendor>acme</ipxact:vendor>
              <ipxact:name>soc</ipxact:name>
              <ipxact:version>1.0</ipxact:version>
            </ipxact:component>"#;
        let report = check(xml.as_bytes(), SchemaVersion::Ieee1685_2014).expect("parse");
        assert!(!report.passed());
        assert!(report.diagnostics[0].contains("namespace"));
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.contains("expected 'vendor' at position 0")));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = check(b"<a><b></a>", SchemaVersion::Ieee1685_2014).unwrap_err();
        assert!(matches!(err, ModelError::Xml(_)));
    }
}
