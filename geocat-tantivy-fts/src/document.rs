//! Mapping between catalog entities and tantivy documents.

use std::collections::HashSet;

use geocat::common::Value;
use geocat::errors::CatalogResult;
use geocat::model::{CatalogInfo, InfoId};
use indexmap::IndexMap;
use tantivy::schema::{Field, Schema, Value as TantivyValue, STORED, STRING, TEXT};
use tantivy::TantivyDocument;

use crate::config::DocumentMapping;
use crate::fts_error;

/// Stored, untokenized entity id.
pub const ID_FIELD: &str = "id";

/// Stored, untokenized type names; one value per type covering the entity.
pub const TYPE_FIELD: &str = "type";

/// Tokenized searchable text.
pub const FULL_TEXT_FIELD: &str = "fullText";

const SORT_FIELD_PREFIX: &str = "sort_";

/// Handles to the fields of an index schema.
#[derive(Debug, Clone)]
pub(crate) struct IndexFields {
    pub(crate) id: Field,
    pub(crate) types: Field,
    pub(crate) full_text: Field,
    sortable: IndexMap<String, Field>,
}

impl IndexFields {
    pub(crate) fn sort_field(&self, property: &str) -> Option<Field> {
        self.sortable.get(property).copied()
    }
}

pub(crate) fn build_schema(mapping: &DocumentMapping) -> (Schema, IndexFields) {
    let mut builder = Schema::builder();
    let id = builder.add_text_field(ID_FIELD, STRING | STORED);
    let types = builder.add_text_field(TYPE_FIELD, STRING | STORED);
    let full_text = builder.add_text_field(FULL_TEXT_FIELD, TEXT);

    let mut names = HashSet::new();
    let mut sortable = IndexMap::new();
    for property in mapping.sortable_properties() {
        let name = sort_field_name(&property);
        if !names.insert(name.clone()) {
            log::warn!(
                "Sortable property {} clashes with another one on field {}, it will be sorted in memory",
                property,
                name
            );
            continue;
        }
        let field = builder.add_bytes_field(&name, STORED);
        sortable.insert(property, field);
    }

    (
        builder.build(),
        IndexFields {
            id,
            types,
            full_text,
            sortable,
        },
    )
}

/// Builds the document mirroring `info`.
pub(crate) fn to_document(
    info: &CatalogInfo,
    fields: &IndexFields,
    mapping: &DocumentMapping,
) -> TantivyDocument {
    let mut doc = TantivyDocument::default();
    doc.add_text(fields.id, info.id().as_str());
    for type_name in info.kind().type_names() {
        doc.add_text(fields.types, type_name);
    }

    let properties = mapping.full_text_properties(info.base_type());
    doc.add_text(fields.full_text, full_text_of(info, &properties));

    for (property, field) in &fields.sortable {
        let key = sort_key(&info.property(property));
        doc.add_bytes(*field, key.as_slice());
    }
    doc
}

pub(crate) fn stored_id(doc: &TantivyDocument, fields: &IndexFields) -> CatalogResult<InfoId> {
    doc.get_first(fields.id)
        .and_then(|value| value.as_str().map(InfoId::new))
        .ok_or_else(|| fts_error("Document without a stored id", "missing field"))
}

/// The stored sort key of `field`; missing keys sort like nulls.
pub(crate) fn stored_sort_key(doc: &TantivyDocument, field: Field) -> Vec<u8> {
    doc.get_first(field)
        .and_then(|value| value.as_bytes().map(|bytes| bytes.to_vec()))
        .unwrap_or_default()
}

/// The searchable text of an entity: its name followed by the textual
/// values of `properties`, arrays flattened. Booleans and nulls are skipped.
pub fn full_text_of(info: &CatalogInfo, properties: &[String]) -> String {
    let mut words = vec![info.name().to_string()];
    for property in properties {
        collect_text(&info.property(property), &mut words);
    }
    words.join(" ")
}

fn collect_text(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null | Value::Bool(_) => {}
        Value::Array(values) => {
            for value in values {
                collect_text(value, out);
            }
        }
        other => {
            if let Some(text) = other.to_text() {
                if !text.is_empty() {
                    out.push(text);
                }
            }
        }
    }
}

/// Encodes a value so that byte order follows value order.
///
/// Nulls encode empty and sort first. Integers are big-endian with the sign
/// bit flipped; floats use the usual total-order bit trick. Arrays sort by
/// their first element.
pub fn sort_key(value: &Value) -> Vec<u8> {
    match value {
        Value::Null => Vec::new(),
        Value::Bool(b) => b.to_string().into_bytes(),
        Value::Int(i) => ((*i as u64) ^ (1 << 63)).to_be_bytes().to_vec(),
        Value::Float(f) => {
            let bits = f.to_bits();
            let ordered = if bits >> 63 == 1 { !bits } else { bits | (1 << 63) };
            ordered.to_be_bytes().to_vec()
        }
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Array(values) => values.first().map(sort_key).unwrap_or_default(),
    }
}

fn sort_field_name(property: &str) -> String {
    let sanitized: String = property
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}{}", SORT_FIELD_PREFIX, sanitized)
}
