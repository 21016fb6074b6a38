//! Body codecs (converters).
//!
//! A closed, tagged set of codec variants sits behind one capability
//! trait: each codec declares the media types it serves and whether it can
//! read a payload kind or write a given value, so converter selection is a
//! pure function of declared capability rather than type introspection.
//!
//! `read`/`write` are the only places in the dispatch path that touch the
//! request/response byte stream, and both are suspension points: callers
//! must not hold locks across them, and cancelling the surrounding request
//! future aborts them cleanly.

mod builtin;

pub use builtin::{
    FormCodec, JsonCodec, OctetStreamCodec, TextCodec, XmlCodec, default_converters,
};

use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;
use http_body_util::BodyExt;
use thiserror::Error;

use crate::media::MediaRange;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("{value:?} value cannot be written as {media}")]
    Unwritable { value: PayloadKind, media: String },
}

/// The shape a body reader is asked to produce, or that a value to be
/// written has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Json,
    Text,
    Form,
    Bytes,
}

/// A materialized body: what argument binding hands to handlers and what
/// handlers return for serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyValue {
    Json(serde_json::Value),
    Text(String),
    Form(Vec<(String, String)>),
    Bytes(Bytes),
}

impl BodyValue {
    pub fn kind(&self) -> PayloadKind {
        match self {
            BodyValue::Json(_) => PayloadKind::Json,
            BodyValue::Text(_) => PayloadKind::Text,
            BodyValue::Form(_) => PayloadKind::Form,
            BodyValue::Bytes(_) => PayloadKind::Bytes,
        }
    }
}

/// One codec in the declared converter list.
#[async_trait]
pub trait BodyConverter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Media types this codec advertises; feeds the producible set when a
    /// route declares no produces condition.
    fn supported_media(&self) -> &[MediaRange];

    fn can_read(&self, target: PayloadKind, content_type: &MediaRange) -> bool;

    fn can_write(&self, value: &BodyValue, media: &MediaRange) -> bool;

    /// Reads and decodes the request body. Suspension point.
    async fn read(
        &self,
        target: PayloadKind,
        content_type: &MediaRange,
        body: Body,
    ) -> Result<BodyValue, CodecError>;

    /// Encodes the value for the selected media type. Suspension point.
    async fn write(&self, value: &BodyValue, media: &MediaRange) -> Result<Bytes, CodecError>;
}

/// Drains a request body to bytes; the one await shared by all readers.
pub(crate) async fn collect_bytes(body: Body) -> Result<Bytes, CodecError> {
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|err| CodecError::BodyRead(err.to_string()))
}
