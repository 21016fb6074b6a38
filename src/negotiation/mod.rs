//! Content negotiation engine.
//!
//! Decides the response media type from the request's Accept header and
//! the matched route's producible set, then picks the first capable codec
//! to serialize. The read path is symmetric: declared Content-Type, first
//! codec that can read the target payload kind.

use std::sync::Arc;

use axum::body::Body;
use bytes::Bytes;
use tracing::debug;

use crate::codec::{BodyConverter, BodyValue, CodecError, PayloadKind};
use crate::error::DispatchError;
use crate::media::MediaRange;
use crate::request::RouteRequest;

pub struct ContentNegotiator {
    converters: Vec<Arc<dyn BodyConverter>>,
    /// Substituted when negotiation ends on a bare wildcard.
    fallback: MediaRange,
}

impl ContentNegotiator {
    pub fn new(converters: Vec<Arc<dyn BodyConverter>>) -> Self {
        Self {
            converters,
            fallback: MediaRange::octet_stream(),
        }
    }

    pub fn with_fallback(mut self, fallback: MediaRange) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn converters(&self) -> &[Arc<dyn BodyConverter>] {
        &self.converters
    }

    /// The producible set: the narrowed route declaration when present,
    /// otherwise whatever registered codecs can write for this value,
    /// otherwise `*/*`.
    fn producible_media(&self, narrowed: &[MediaRange], value: &BodyValue) -> Vec<MediaRange> {
        if !narrowed.is_empty() {
            return narrowed.to_vec();
        }
        let any = MediaRange::all();
        let mut out: Vec<MediaRange> = Vec::new();
        for converter in &self.converters {
            if converter.can_write(value, &any) {
                for media in converter.supported_media() {
                    if !out.contains(media) {
                        out.push(media.clone());
                    }
                }
            }
        }
        if out.is_empty() { vec![any] } else { out }
    }

    /// Selects the response media type: compatible (accepted, producible)
    /// pairs collapse to the more specific side carrying the accepted
    /// quality, sorted by specificity then quality, first concrete type
    /// wins, a surviving bare wildcard falls back to the configured
    /// binary type.
    pub fn select_media(
        &self,
        request: &RouteRequest,
        narrowed: &[MediaRange],
        value: &BodyValue,
    ) -> Result<MediaRange, DispatchError> {
        let accepted = request.accepted_media();
        let producible = self.producible_media(narrowed, value);

        let mut compatible: Vec<MediaRange> = Vec::new();
        for accept in &accepted {
            for produce in &producible {
                if accept.is_compatible_with(produce) {
                    let candidate = MediaRange::most_specific(accept, produce);
                    if !compatible.contains(&candidate) {
                        compatible.push(candidate);
                    }
                }
            }
        }

        if compatible.is_empty() {
            return Err(DispatchError::NotAcceptable {
                producible: producible.iter().map(|m| m.to_string()).collect(),
            });
        }

        compatible.sort_by(MediaRange::compare_specificity_and_quality);

        for media in &compatible {
            if media.is_concrete() {
                debug!(selected = %media, "negotiated response media type");
                return Ok(media.clone());
            }
            if media.is_wildcard_type() {
                debug!(fallback = %self.fallback, "wildcard survived negotiation, using fallback");
                return Ok(self.fallback.clone());
            }
        }

        Err(DispatchError::NotAcceptable {
            producible: producible.iter().map(|m| m.to_string()).collect(),
        })
    }

    /// Negotiates and serializes a response body. Fails with NotAcceptable
    /// when no compatible media type exists or no codec can write the
    /// selected one.
    pub async fn write_body(
        &self,
        value: &BodyValue,
        narrowed: &[MediaRange],
        request: &RouteRequest,
    ) -> Result<(MediaRange, Bytes), DispatchError> {
        let selected = self.select_media(request, narrowed, value)?;

        for converter in &self.converters {
            if converter.can_write(value, &selected) {
                debug!(codec = converter.name(), media = %selected, "writing response body");
                let bytes = converter
                    .write(value, &selected)
                    .await
                    .map_err(|err| DispatchError::Internal(err.to_string()))?;
                return Ok((selected, bytes));
            }
        }

        Err(DispatchError::NotAcceptable {
            producible: self
                .converters
                .iter()
                .flat_map(|c| c.supported_media())
                .map(|m| m.to_string())
                .collect(),
        })
    }

    /// Reads the request body as the target payload kind, honoring the
    /// declared Content-Type (absent defaults to octet-stream). The first
    /// codec declaring the capability reads; none means the media type is
    /// unsupported for this target.
    pub async fn read_body(
        &self,
        target: PayloadKind,
        request: &RouteRequest,
        body: Body,
    ) -> Result<BodyValue, DispatchError> {
        let content_type = request
            .content_type()
            .unwrap_or_else(MediaRange::octet_stream);

        for converter in &self.converters {
            if converter.can_read(target, &content_type) {
                debug!(codec = converter.name(), media = %content_type, "reading request body");
                return converter
                    .read(target, &content_type, body)
                    .await
                    .map_err(|err| match err {
                        CodecError::BodyRead(msg) | CodecError::Malformed(msg) => {
                            DispatchError::UnreadableBody(msg)
                        }
                        other => DispatchError::Internal(other.to_string()),
                    });
            }
        }

        Err(DispatchError::UnsupportedMediaType {
            content_type: content_type.to_string(),
        })
    }
}
