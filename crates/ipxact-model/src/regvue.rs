//! RegVue register-description-format JSON export.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::{AccessMode, Component, Field, ModelError, ModifiedWrite, ReadAction};

/// Version string written into the `schema` object.
pub const REGVUE_SCHEMA_VERSION: &str = "v1";

#[derive(Debug, Serialize)]
struct Document<'a> {
    schema: Schema,
    root: Root<'a>,
    elements: Elements<'a>,
}

#[derive(Debug, Serialize)]
struct Schema {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct Root<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    desc: Option<&'a str>,
    version: &'a str,
    children: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_width: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum Element<'a> {
    #[serde(rename = "blk")]
    Block {
        id: String,
        name: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        desc: Option<&'a str>,
        offset: &'a str,
        size: &'a str,
        children: Vec<String>,
        data_width: u32,
    },
    #[serde(rename = "reg")]
    Register {
        id: String,
        name: &'a str,
        offset: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        desc: Option<&'a str>,
        fields: Vec<FieldObject<'a>>,
    },
}

#[derive(Debug, Serialize)]
struct FieldObject<'a> {
    name: &'a str,
    nbits: u32,
    lsb: u32,
    access: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc: Option<&'a str>,
}

/// Elements keyed by id, emitted in insertion order.
#[derive(Debug)]
struct Elements<'a>(Vec<(String, Element<'a>)>);

impl Serialize for Elements<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, element) in &self.0 {
            map.serialize_entry(id, element)?;
        }
        map.end()
    }
}

/// Render `component` as a pretty-printed RegVue JSON document.
///
/// Blocks get their address-block name as id; registers get
/// `<block>.<register>`.
pub fn to_regvue_json(component: &Component) -> Result<Vec<u8>, ModelError> {
    let mut elements = Vec::new();
    let mut root_children = Vec::new();
    let mut data_width = None;

    for block in component.address_blocks() {
        let block_id = block.name().to_string();
        data_width.get_or_insert(block.width());
        let mut children = Vec::new();
        let mut registers = Vec::new();
        for register in block.registers() {
            let id = format!("{block_id}.{}", register.name());
            children.push(id.clone());
            let fields = register.fields().iter().map(field_object).collect();
            registers.push((
                id.clone(),
                Element::Register {
                    id,
                    name: register.name(),
                    offset: register.address_offset().as_str(),
                    desc: register.description(),
                    fields,
                },
            ));
        }
        root_children.push(block_id.clone());
        elements.push((
            block_id.clone(),
            Element::Block {
                id: block_id,
                name: block.name(),
                desc: block.description(),
                offset: block.base_address().as_str(),
                size: block.range().as_str(),
                children,
                data_width: block.width(),
            },
        ));
        elements.extend(registers);
    }

    let document = Document {
        schema: Schema {
            name: "register-description-format",
            version: REGVUE_SCHEMA_VERSION,
        },
        root: Root {
            desc: component.description(),
            version: component.version(),
            children: root_children,
            data_width,
        },
        elements: Elements(elements),
    };
    let mut bytes =
        serde_json::to_vec_pretty(&document).map_err(|err| ModelError::Json(err.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn field_object(field: &Field) -> FieldObject<'_> {
    FieldObject {
        name: &field.name,
        nbits: field.bit_width,
        lsb: field.bit_offset,
        access: access_code(field),
        reset: field.reset_value.as_deref(),
        doc: field.description.as_deref(),
    }
}

/// Lower-case RegVue access mnemonic for the field's access triple.
pub fn access_code(field: &Field) -> &'static str {
    use ModifiedWrite as W;
    use ReadAction as R;

    match (field.access, field.modified_write_value, field.read_action) {
        (AccessMode::WriteOnce, ..) => "w1",
        (AccessMode::ReadOnly, _, Some(R::Clear)) => "rc",
        (AccessMode::ReadOnly, _, Some(R::Set)) => "rs",
        (AccessMode::ReadOnly, ..) => "ro",
        (AccessMode::WriteOnly, Some(W::Clear), _) => "wc",
        (AccessMode::WriteOnly, Some(W::Set), _) => "ws",
        (AccessMode::WriteOnly, ..) => "wo",
        (AccessMode::ReadWrite, None, None) => "rw",
        (AccessMode::ReadWrite, None, Some(R::Clear)) => "rc",
        (AccessMode::ReadWrite, None, Some(R::Set)) => "rs",
        (AccessMode::ReadWrite, Some(W::OneToClear), None) => "w1c",
        (AccessMode::ReadWrite, Some(W::OneToClear), Some(R::Clear)) => "wrc",
        (AccessMode::ReadWrite, Some(W::OneToClear), Some(R::Set)) => "w1crs",
        (AccessMode::ReadWrite, Some(W::OneToSet), None) => "w1s",
        (AccessMode::ReadWrite, Some(W::OneToSet), Some(R::Clear)) => "w1src",
        (AccessMode::ReadWrite, Some(W::OneToSet), Some(R::Set)) => "wrs",
        (AccessMode::ReadWrite, Some(W::OneToToggle), _) => "w1t",
        (AccessMode::ReadWrite, Some(W::ZeroToClear), Some(R::Set)) => "w0crs",
        (AccessMode::ReadWrite, Some(W::ZeroToClear), _) => "w0c",
        (AccessMode::ReadWrite, Some(W::ZeroToSet), Some(R::Clear)) => "w0src",
        (AccessMode::ReadWrite, Some(W::ZeroToSet), _) => "w0s",
        (AccessMode::ReadWrite, Some(W::ZeroToToggle), _) => "w0t",
        (AccessMode::ReadWrite, Some(W::Clear), _) => "wc",
        (AccessMode::ReadWrite, Some(W::Set), _) => "ws",
    }
}
