//! Helpers shared by every JSON endpoint.

use axum::extract::{FromRequest, FromRequestParts};
use bson::oid::ObjectId;
use bson::Bson;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;

/// Query string extractor whose rejections render as `{ "error": ... }`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// JSON body extractor whose rejections render as `{ "error": ... }`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Parse a path id. Anything that is not a valid ObjectId cannot name a
/// stored record, so it is reported as not found.
pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::NotFound(format!("{what} not found")))
}

/// Render a stored document as client JSON.
///
/// Goes through BSON so that the same serde attributes apply, then turns
/// ObjectIds into hex strings and datetimes into RFC 3339 strings.
pub fn render<T: Serialize>(value: &T) -> Result<Value, AppError> {
    let bson = bson::to_bson(value)?;
    Ok(bson_to_json(bson))
}

/// Render each element of a list.
pub fn render_all<T: Serialize>(values: &[T]) -> Result<Value, AppError> {
    values
        .iter()
        .map(render)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::Document(doc) => Value::Object(
            doc.into_iter()
                .map(|(k, v)| (k, bson_to_json(v)))
                .collect::<Map<_, _>>(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Value::from(dt.timestamp_millis()),
        },
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::Double(f) => Value::from(f),
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.into_relaxed_extjson(),
    }
}
