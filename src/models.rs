//! Data models for stored news items and the request bodies that create them.
//!
//! - [`Record`]: one news item as persisted in the data file
//! - [`RecordBody`]: the four fields a client submits to create or replace a record
//!
//! Field names are Spanish to match the data file written by the collector and
//! read by existing clients. No field is required and no field is type-checked:
//! a record carries whatever JSON value it was given.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A news item as stored in the collection.
///
/// Identity is positional: a record has no id of its own and is addressed by
/// its index in the collection. An absent field stays absent when written back
/// and an explicit `null` stays `null`.
///
/// Keys other than the four named fields are kept in `extra` so that records
/// the service does not replace round-trip through a rewrite unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Record {
    /// The headline.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub titulo: Option<Value>,
    /// Image URL.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub imagen: Option<Value>,
    /// Short description or lede.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<Value>,
    /// Link to the full article.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub enlace: Option<Value>,
    /// Any other keys present in the data file.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deserialize a key that is present, `null` included, as `Some`.
///
/// Paired with `#[serde(default)]`, a missing key stays `None` while
/// `"titulo": null` becomes `Some(Value::Null)` and is written back as such.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Record {
    /// Build a record from plain text fields, leaving `None` fields absent.
    pub fn from_text(
        titulo: Option<String>,
        imagen: Option<String>,
        descripcion: Option<String>,
        enlace: Option<String>,
    ) -> Self {
        Self {
            titulo: titulo.map(Value::String),
            imagen: imagen.map(Value::String),
            descripcion: descripcion.map(Value::String),
            enlace: enlace.map(Value::String),
            extra: Map::new(),
        }
    }

    /// The link as a string, if it is one.
    pub fn enlace_str(&self) -> Option<&str> {
        self.enlace.as_ref().and_then(Value::as_str)
    }
}

/// The fields a client may submit for a create or replace.
///
/// Only these four keys are read; anything else in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordBody {
    #[serde(deserialize_with = "present")]
    pub titulo: Option<Value>,
    #[serde(deserialize_with = "present")]
    pub imagen: Option<Value>,
    #[serde(deserialize_with = "present")]
    pub descripcion: Option<Value>,
    #[serde(deserialize_with = "present")]
    pub enlace: Option<Value>,
}

impl RecordBody {
    /// Read the fields out of an arbitrary JSON document.
    ///
    /// Anything other than an object (an array, a string, `null`) yields an
    /// empty body, the same as a request that sent no fields at all.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Read the fields out of decoded form data.
    pub fn from_form(mut form: HashMap<String, String>) -> Self {
        let mut take = |key: &str| form.remove(key).map(Value::String);
        Self {
            titulo: take("titulo"),
            imagen: take("imagen"),
            descripcion: take("descripcion"),
            enlace: take("enlace"),
        }
    }
}

impl From<RecordBody> for Record {
    /// A new record holds exactly the submitted fields; nothing is merged in.
    fn from(body: RecordBody) -> Self {
        Self {
            titulo: body.titulo,
            imagen: body.imagen,
            descripcion: body.descripcion,
            enlace: body.enlace,
            extra: Map::new(),
        }
    }
}
