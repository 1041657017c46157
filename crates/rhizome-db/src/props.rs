//! Helpers for reading and writing untyped property maps.
//!
//! Records parse from and serialize to [`Properties`]. These helpers keep the
//! conventions in one place: a required key that is absent is a
//! [`DbError::MissingField`], a key with the wrong shape is a
//! [`DbError::InvalidField`], and relationship keys holding the empty string
//! mean "no reference".

use chrono::{DateTime, FixedOffset};
use rhizome_types::{Id, Properties};
use serde_json::Value;

use crate::error::{DbError, DbResult};

fn missing(key: &str) -> DbError {
    DbError::MissingField {
        key: key.to_string(),
    }
}

fn invalid(key: &str, expected: &'static str) -> DbError {
    DbError::InvalidField {
        key: key.to_string(),
        expected,
    }
}

pub(crate) fn require_str(props: &Properties, key: &str) -> DbResult<String> {
    let value = props.get(key).ok_or_else(|| missing(key))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(key, "string"))
}

/// An absent key reads as the empty string.
pub(crate) fn optional_str(props: &Properties, key: &str) -> DbResult<String> {
    match props.get(key) {
        None => Ok(String::new()),
        Some(value) => value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid(key, "string")),
    }
}

/// An absent key or an empty string reads as "no reference".
pub(crate) fn optional_id(props: &Properties, key: &str) -> DbResult<Option<Id>> {
    match props.get(key) {
        None => Ok(None),
        Some(value) => {
            let s = value.as_str().ok_or_else(|| invalid(key, "string"))?;
            if s.is_empty() {
                Ok(None)
            } else {
                Id::parse(s).map(Some).map_err(|_| invalid(key, "id"))
            }
        }
    }
}

/// A list of reference ids; an absent key reads as the empty list.
pub(crate) fn id_list(props: &Properties, key: &str) -> DbResult<Vec<Id>> {
    let Some(value) = props.get(key) else {
        return Ok(Vec::new());
    };
    let array = value.as_array().ok_or_else(|| invalid(key, "array"))?;
    let mut ids = Vec::with_capacity(array.len());
    for item in array {
        let s = item.as_str().ok_or_else(|| invalid(key, "array of ids"))?;
        ids.push(Id::parse(s).map_err(|_| invalid(key, "array of ids"))?);
    }
    Ok(ids)
}

pub(crate) fn require_object<'a>(props: &'a Properties, key: &str) -> DbResult<&'a Properties> {
    let value = props.get(key).ok_or_else(|| missing(key))?;
    value.as_object().ok_or_else(|| invalid(key, "object"))
}

pub(crate) fn optional_object<'a>(
    props: &'a Properties,
    key: &str,
) -> DbResult<Option<&'a Properties>> {
    match props.get(key) {
        None => Ok(None),
        Some(value) => value.as_object().map(Some).ok_or_else(|| invalid(key, "object")),
    }
}

/// A free-form map property; an absent key reads as the empty map.
pub(crate) fn optional_map(props: &Properties, key: &str) -> DbResult<Properties> {
    Ok(optional_object(props, key)?.cloned().unwrap_or_default())
}

/// A list of embedded objects; an absent key reads as the empty list.
pub(crate) fn object_list<'a>(props: &'a Properties, key: &str) -> DbResult<Vec<&'a Properties>> {
    let Some(value) = props.get(key) else {
        return Ok(Vec::new());
    };
    let array = value.as_array().ok_or_else(|| invalid(key, "array"))?;
    array
        .iter()
        .map(|item| item.as_object().ok_or_else(|| invalid(key, "array of objects")))
        .collect()
}

pub(crate) fn require_date(props: &Properties, key: &str) -> DbResult<DateTime<FixedOffset>> {
    let s = require_str(props, key)?;
    DateTime::parse_from_rfc3339(&s).map_err(|_| invalid(key, "RFC 3339 date"))
}

// -----------------------------------------------------------------------
// Serialization side
// -----------------------------------------------------------------------

pub(crate) fn put_str(props: &mut Properties, key: &str, value: &str) {
    props.insert(key.to_string(), Value::String(value.to_string()));
}

pub(crate) fn put_id(props: &mut Properties, key: &str, id: &Id) {
    put_str(props, key, id.as_str());
}

/// A cleared reference serializes as the empty string.
pub(crate) fn put_opt_id(props: &mut Properties, key: &str, id: Option<&Id>) {
    match id {
        Some(id) => put_id(props, key, id),
        None => put_str(props, key, ""),
    }
}

pub(crate) fn put_id_list<'a>(
    props: &mut Properties,
    key: &str,
    ids: impl Iterator<Item = &'a Id>,
) {
    let array = ids
        .map(|id| Value::String(id.as_str().to_string()))
        .collect();
    props.insert(key.to_string(), Value::Array(array));
}

pub(crate) fn put_value(props: &mut Properties, key: &str, value: Value) {
    props.insert(key.to_string(), value);
}
