//! Render a [`Component`] as an IP-XACT XML document.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use crate::{AddressBlock, Component, Field, MemoryMap, ModelError, Register, SchemaVersion};

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Serialize `component` for the given schema revision.
///
/// Elements are written in schema sequence order, optional properties that
/// are absent are omitted, and namespace declarations plus
/// `xsi:schemaLocation` are placed as attributes on the root element.
pub fn to_xml(component: &Component, version: SchemaVersion) -> Result<Vec<u8>, ModelError> {
    let version = version.ensure_supported()?;
    let mut out = Emitter::new(version.prefix());
    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let root = out.qualify("component");
    let xmlns = format!("xmlns:{}", version.prefix());
    let location = version.schema_location();
    let start = BytesStart::new(root.as_str()).with_attributes([
        (xmlns.as_str(), version.namespace()),
        ("xmlns:xsi", XSI_NAMESPACE),
        ("xsi:schemaLocation", location.as_str()),
    ]);
    out.event(Event::Start(start))?;
    out.text_element("vendor", component.vendor())?;
    out.text_element("library", component.library())?;
    out.text_element("name", component.name())?;
    out.text_element("version", component.version())?;
    if !component.memory_maps().is_empty() {
        out.start("memoryMaps")?;
        for map in component.memory_maps() {
            write_memory_map(&mut out, map)?;
        }
        out.end("memoryMaps")?;
    }
    out.optional_element("description", component.description())?;
    out.event(Event::End(BytesEnd::new(root.as_str())))?;

    let mut bytes = out.finish();
    bytes.push(b'\n');
    debug!(len = bytes.len(), version = %version, "rendered IP-XACT document");
    Ok(bytes)
}

fn write_memory_map(out: &mut Emitter, map: &MemoryMap) -> Result<(), ModelError> {
    out.start("memoryMap")?;
    out.text_element("name", map.name())?;
    for block in map.address_blocks() {
        write_address_block(out, block)?;
    }
    out.end("memoryMap")
}

fn write_address_block(out: &mut Emitter, block: &AddressBlock) -> Result<(), ModelError> {
    out.start("addressBlock")?;
    out.text_element("name", block.name())?;
    out.optional_element("description", block.description())?;
    out.text_element("baseAddress", block.base_address().as_str())?;
    out.text_element("range", block.range().as_str())?;
    out.text_element("width", &block.width().to_string())?;
    for register in block.registers() {
        write_register(out, register)?;
    }
    out.end("addressBlock")
}

fn write_register(out: &mut Emitter, register: &Register) -> Result<(), ModelError> {
    out.start("register")?;
    out.text_element("name", register.name())?;
    out.optional_element("description", register.description())?;
    out.text_element("addressOffset", register.address_offset().as_str())?;
    out.text_element("size", &register.size_in_bits().to_string())?;
    for field in register.fields() {
        write_field(out, field)?;
    }
    out.end("register")
}

fn write_field(out: &mut Emitter, field: &Field) -> Result<(), ModelError> {
    out.start("field")?;
    out.text_element("name", &field.name)?;
    out.optional_element("description", field.description.as_deref())?;
    out.text_element("bitOffset", &field.bit_offset.to_string())?;
    if let Some(reset) = field.reset_value.as_deref() {
        out.start("resets")?;
        out.start("reset")?;
        out.text_element("value", reset)?;
        out.end("reset")?;
        out.end("resets")?;
    }
    out.text_element("bitWidth", &field.bit_width.to_string())?;
    out.text_element("access", field.access.as_str())?;
    out.optional_element(
        "modifiedWriteValue",
        field.modified_write_value.map(|value| value.as_str()),
    )?;
    out.optional_element("readAction", field.read_action.map(|value| value.as_str()))?;
    out.end("field")
}

struct Emitter {
    writer: Writer<Vec<u8>>,
    prefix: &'static str,
}

impl Emitter {
    fn new(prefix: &'static str) -> Self {
        Emitter {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
            prefix,
        }
    }

    fn qualify(&self, tag: &str) -> String {
        format!("{}:{tag}", self.prefix)
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), ModelError> {
        self.writer
            .write_event(event)
            .map_err(|err| ModelError::Xml(err.to_string()))
    }

    fn start(&mut self, tag: &str) -> Result<(), ModelError> {
        let name = self.qualify(tag);
        self.event(Event::Start(BytesStart::new(name.as_str())))
    }

    fn end(&mut self, tag: &str) -> Result<(), ModelError> {
        let name = self.qualify(tag);
        self.event(Event::End(BytesEnd::new(name.as_str())))
    }

    fn text_element(&mut self, tag: &str, text: &str) -> Result<(), ModelError> {
        self.start(tag)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(tag)
    }

    fn optional_element(&mut self, tag: &str, text: Option<&str>) -> Result<(), ModelError> {
        match text {
            Some(text) if !text.trim().is_empty() => self.text_element(tag, text),
            _ => Ok(()),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
