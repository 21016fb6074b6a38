//! The built-in codec set.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;

use super::{BodyConverter, BodyValue, CodecError, PayloadKind, collect_bytes};
use crate::media::MediaRange;

/// The default, ordered converter list. Order is semantically significant:
/// the first codec whose capability check holds wins.
pub fn default_converters() -> Vec<Arc<dyn BodyConverter>> {
    vec![
        Arc::new(JsonCodec::new()),
        Arc::new(FormCodec::new()),
        Arc::new(TextCodec::new()),
        Arc::new(XmlCodec::new()),
        Arc::new(OctetStreamCodec::new()),
    ]
}

fn compatible_with_any(supported: &[MediaRange], media: &MediaRange) -> bool {
    supported.iter().any(|s| s.is_compatible_with(media))
}

/// JSON bodies via serde_json.
pub struct JsonCodec {
    supported: Vec<MediaRange>,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self {
            supported: vec![MediaRange::json()],
        }
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BodyConverter for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn supported_media(&self) -> &[MediaRange] {
        &self.supported
    }

    fn can_read(&self, target: PayloadKind, content_type: &MediaRange) -> bool {
        target == PayloadKind::Json && compatible_with_any(&self.supported, content_type)
    }

    fn can_write(&self, value: &BodyValue, media: &MediaRange) -> bool {
        value.kind() == PayloadKind::Json && compatible_with_any(&self.supported, media)
    }

    async fn read(
        &self,
        _target: PayloadKind,
        _content_type: &MediaRange,
        body: Body,
    ) -> Result<BodyValue, CodecError> {
        let bytes = collect_bytes(body).await?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|err| CodecError::Malformed(err.to_string()))?;
        Ok(BodyValue::Json(value))
    }

    async fn write(&self, value: &BodyValue, media: &MediaRange) -> Result<Bytes, CodecError> {
        match value {
            BodyValue::Json(json) => serde_json::to_vec(json)
                .map(Bytes::from)
                .map_err(|err| CodecError::Malformed(err.to_string())),
            other => Err(CodecError::Unwritable {
                value: other.kind(),
                media: media.to_string(),
            }),
        }
    }
}

/// `application/x-www-form-urlencoded` bodies via url::form_urlencoded.
pub struct FormCodec {
    supported: Vec<MediaRange>,
}

impl FormCodec {
    pub fn new() -> Self {
        Self {
            supported: vec![MediaRange::form_urlencoded()],
        }
    }
}

impl Default for FormCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BodyConverter for FormCodec {
    fn name(&self) -> &'static str {
        "form"
    }

    fn supported_media(&self) -> &[MediaRange] {
        &self.supported
    }

    fn can_read(&self, target: PayloadKind, content_type: &MediaRange) -> bool {
        target == PayloadKind::Form && compatible_with_any(&self.supported, content_type)
    }

    fn can_write(&self, value: &BodyValue, media: &MediaRange) -> bool {
        value.kind() == PayloadKind::Form && compatible_with_any(&self.supported, media)
    }

    async fn read(
        &self,
        _target: PayloadKind,
        _content_type: &MediaRange,
        body: Body,
    ) -> Result<BodyValue, CodecError> {
        let bytes = collect_bytes(body).await?;
        let pairs = url::form_urlencoded::parse(&bytes)
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Ok(BodyValue::Form(pairs))
    }

    async fn write(&self, value: &BodyValue, media: &MediaRange) -> Result<Bytes, CodecError> {
        match value {
            BodyValue::Form(pairs) => {
                let mut serializer = url::form_urlencoded::Serializer::new(String::new());
                for (name, value) in pairs {
                    serializer.append_pair(name, value);
                }
                Ok(Bytes::from(serializer.finish()))
            }
            other => Err(CodecError::Unwritable {
                value: other.kind(),
                media: media.to_string(),
            }),
        }
    }
}

/// Plain-text bodies. Reads any content type as UTF-8; writes text values
/// for `text/*` targets.
pub struct TextCodec {
    supported: Vec<MediaRange>,
    writable: MediaRange,
}

impl TextCodec {
    pub fn new() -> Self {
        Self {
            supported: vec![MediaRange::text_plain()],
            writable: MediaRange::parse("text/*").expect("static media range"),
        }
    }
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BodyConverter for TextCodec {
    fn name(&self) -> &'static str {
        "text"
    }

    fn supported_media(&self) -> &[MediaRange] {
        &self.supported
    }

    fn can_read(&self, target: PayloadKind, _content_type: &MediaRange) -> bool {
        target == PayloadKind::Text
    }

    fn can_write(&self, value: &BodyValue, media: &MediaRange) -> bool {
        value.kind() == PayloadKind::Text && self.writable.is_compatible_with(media)
    }

    async fn read(
        &self,
        _target: PayloadKind,
        _content_type: &MediaRange,
        body: Body,
    ) -> Result<BodyValue, CodecError> {
        let bytes = collect_bytes(body).await?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|err| CodecError::Malformed(err.to_string()))?;
        Ok(BodyValue::Text(text))
    }

    async fn write(&self, value: &BodyValue, media: &MediaRange) -> Result<Bytes, CodecError> {
        match value {
            BodyValue::Text(text) => Ok(Bytes::from(text.clone())),
            other => Err(CodecError::Unwritable {
                value: other.kind(),
                media: media.to_string(),
            }),
        }
    }
}

/// Raw byte bodies; the universal fallback reader and the writer used
/// when only a wildcard survived negotiation.
pub struct OctetStreamCodec {
    supported: Vec<MediaRange>,
}

impl OctetStreamCodec {
    pub fn new() -> Self {
        Self {
            supported: vec![MediaRange::octet_stream()],
        }
    }
}

impl Default for OctetStreamCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BodyConverter for OctetStreamCodec {
    fn name(&self) -> &'static str {
        "octet-stream"
    }

    fn supported_media(&self) -> &[MediaRange] {
        &self.supported
    }

    fn can_read(&self, target: PayloadKind, _content_type: &MediaRange) -> bool {
        // Bytes can be produced from any declared content type
        target == PayloadKind::Bytes
    }

    fn can_write(&self, value: &BodyValue, _media: &MediaRange) -> bool {
        value.kind() == PayloadKind::Bytes
    }

    async fn read(
        &self,
        _target: PayloadKind,
        _content_type: &MediaRange,
        body: Body,
    ) -> Result<BodyValue, CodecError> {
        Ok(BodyValue::Bytes(collect_bytes(body).await?))
    }

    async fn write(&self, value: &BodyValue, media: &MediaRange) -> Result<Bytes, CodecError> {
        match value {
            BodyValue::Bytes(bytes) => Ok(bytes.clone()),
            other => Err(CodecError::Unwritable {
                value: other.kind(),
                media: media.to_string(),
            }),
        }
    }
}

/// Minimal XML writer for structured and text values. Write-only: the
/// capability contract makes that legal, readers simply never select it.
///
/// No XML crate exists in this stack; the element mapping is deliberately
/// small: objects become child elements, arrays repeat `<item>`, scalars
/// become text content.
pub struct XmlCodec {
    supported: Vec<MediaRange>,
}

impl XmlCodec {
    pub fn new() -> Self {
        Self {
            supported: vec![
                MediaRange::parse("application/xml").expect("static media range"),
                MediaRange::parse("text/xml").expect("static media range"),
            ],
        }
    }

    fn render(value: &serde_json::Value, tag: &str, out: &mut String) {
        match value {
            serde_json::Value::Object(map) => {
                out.push_str(&format!("<{tag}>"));
                for (key, child) in map {
                    Self::render(child, key, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
            serde_json::Value::Array(items) => {
                out.push_str(&format!("<{tag}>"));
                for item in items {
                    Self::render(item, "item", out);
                }
                out.push_str(&format!("</{tag}>"));
            }
            serde_json::Value::Null => {
                out.push_str(&format!("<{tag}/>"));
            }
            scalar => {
                let text = match scalar {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.push_str(&format!("<{tag}>{}</{tag}>", escape(&text)));
            }
        }
    }
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[async_trait]
impl BodyConverter for XmlCodec {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn supported_media(&self) -> &[MediaRange] {
        &self.supported
    }

    fn can_read(&self, _target: PayloadKind, _content_type: &MediaRange) -> bool {
        false
    }

    fn can_write(&self, value: &BodyValue, media: &MediaRange) -> bool {
        matches!(value.kind(), PayloadKind::Json | PayloadKind::Text)
            && compatible_with_any(&self.supported, media)
    }

    async fn read(
        &self,
        _target: PayloadKind,
        content_type: &MediaRange,
        _body: Body,
    ) -> Result<BodyValue, CodecError> {
        Err(CodecError::Malformed(format!(
            "xml codec cannot read {content_type}"
        )))
    }

    async fn write(&self, value: &BodyValue, media: &MediaRange) -> Result<Bytes, CodecError> {
        let xml = match value {
            BodyValue::Json(json) => {
                let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
                Self::render(json, "response", &mut out);
                out
            }
            BodyValue::Text(text) => {
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><response>{}</response>"#,
                    escape(text)
                )
            }
            other => {
                return Err(CodecError::Unwritable {
                    value: other.kind(),
                    media: media.to_string(),
                });
            }
        };
        Ok(Bytes::from(xml))
    }
}
