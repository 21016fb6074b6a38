//! Media-range model used by route conditions and content negotiation.
//!
//! Wraps [`mime::Mime`] with the pieces negotiation needs on top of plain
//! parsing: a quality value (`q` parameter), wildcard compatibility in both
//! directions, and a specificity ordering (concrete > `type/*` > `*/*`).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use mime::Mime;
use thiserror::Error;

/// Quality values are stored in thousandths (`q=0.8` -> 800) so ordering
/// stays integral and total. Absent `q` means 1000.
pub const MAX_QUALITY: u16 = 1000;

#[derive(Debug, Error)]
pub enum MediaRangeError {
    #[error("invalid media type: {0}")]
    InvalidMediaType(String),
}

/// A media type or media range (`application/json`, `text/*`, `*/*`),
/// optionally weighted with a quality value.
#[derive(Debug, Clone)]
pub struct MediaRange {
    inner: Mime,
    quality: u16,
}

impl MediaRange {
    pub fn parse(value: &str) -> Result<Self, MediaRangeError> {
        let mime = Mime::from_str(value.trim())
            .map_err(|_| MediaRangeError::InvalidMediaType(value.to_string()))?;
        Ok(Self::from_mime(mime))
    }

    pub fn from_mime(mime: Mime) -> Self {
        let quality = mime
            .get_param("q")
            .and_then(|v| v.as_str().parse::<f32>().ok())
            .map(|q| (q.clamp(0.0, 1.0) * MAX_QUALITY as f32).round() as u16)
            .unwrap_or(MAX_QUALITY);
        Self { inner: mime, quality }
    }

    pub fn all() -> Self {
        Self::from_mime(mime::STAR_STAR)
    }

    pub fn json() -> Self {
        Self::from_mime(mime::APPLICATION_JSON)
    }

    pub fn octet_stream() -> Self {
        Self::from_mime(mime::APPLICATION_OCTET_STREAM)
    }

    pub fn text_plain() -> Self {
        Self::from_mime(mime::TEXT_PLAIN)
    }

    pub fn form_urlencoded() -> Self {
        Self::from_mime(mime::APPLICATION_WWW_FORM_URLENCODED)
    }

    pub fn main_type(&self) -> &str {
        self.inner.type_().as_str()
    }

    pub fn subtype(&self) -> &str {
        self.inner.subtype().as_str()
    }

    /// `type/subtype` without parameters; what goes into a Content-Type
    /// header once a concrete type has been selected.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type(), self.subtype())
    }

    pub fn quality(&self) -> u16 {
        self.quality
    }

    pub fn with_quality(mut self, quality: u16) -> Self {
        self.quality = quality.min(MAX_QUALITY);
        self
    }

    pub fn is_wildcard_type(&self) -> bool {
        self.inner.type_() == mime::STAR
    }

    pub fn is_wildcard_subtype(&self) -> bool {
        self.inner.subtype() == mime::STAR
    }

    /// Concrete means no wildcard component at all.
    pub fn is_concrete(&self) -> bool {
        !self.is_wildcard_type() && !self.is_wildcard_subtype()
    }

    /// Symmetric wildcard compatibility: `*/*` is compatible with anything,
    /// `text/*` with any `text` subtype, and concrete types only with
    /// themselves.
    pub fn is_compatible_with(&self, other: &MediaRange) -> bool {
        if self.is_wildcard_type() || other.is_wildcard_type() {
            return true;
        }
        if self.main_type() != other.main_type() {
            return false;
        }
        self.is_wildcard_subtype()
            || other.is_wildcard_subtype()
            || self.subtype() == other.subtype()
    }

    /// Directional check: does this range cover `other`? Used by the
    /// consumes condition, where the declared range may be a wildcard but
    /// the request Content-Type is concrete.
    pub fn includes(&self, other: &MediaRange) -> bool {
        if self.is_wildcard_type() {
            return true;
        }
        if self.main_type() != other.main_type() {
            return false;
        }
        self.is_wildcard_subtype() || self.subtype() == other.subtype()
    }

    /// 2 = concrete, 1 = `type/*`, 0 = `*/*`.
    fn wildcard_rank(&self) -> u8 {
        if self.is_wildcard_type() {
            0
        } else if self.is_wildcard_subtype() {
            1
        } else {
            2
        }
    }

    /// Number of parameters other than `q`; more parameters is treated as
    /// more specific, as a final tie-break.
    fn param_count(&self) -> usize {
        self.inner.params().filter(|(name, _)| *name != "q").count()
    }

    /// Orders the more specific range first (`Less` means `a` wins).
    pub fn compare_specificity(a: &MediaRange, b: &MediaRange) -> Ordering {
        b.wildcard_rank()
            .cmp(&a.wildcard_rank())
            .then_with(|| b.param_count().cmp(&a.param_count()))
    }

    /// Orders by specificity descending, then quality descending. Stable
    /// sorts with this comparator keep declaration order on full ties.
    pub fn compare_specificity_and_quality(a: &MediaRange, b: &MediaRange) -> Ordering {
        Self::compare_specificity(a, b).then_with(|| b.quality.cmp(&a.quality))
    }

    /// The more specific of an accepted and a producible range, carrying
    /// the accepted side's quality value.
    pub fn most_specific(accepted: &MediaRange, producible: &MediaRange) -> MediaRange {
        let producible = producible.clone().with_quality(accepted.quality);
        if Self::compare_specificity(accepted, &producible) == Ordering::Greater {
            producible
        } else {
            accepted.clone()
        }
    }
}

/// Parses a comma-separated header value (Accept style) into media ranges.
/// Malformed entries are dropped rather than failing the whole header.
pub fn parse_header_value(value: &str) -> Vec<MediaRange> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| MediaRange::parse(part).ok())
        .collect()
}

impl PartialEq for MediaRange {
    fn eq(&self, other: &Self) -> bool {
        self.inner.as_ref() == other.inner.as_ref()
    }
}

impl Eq for MediaRange {}

impl Hash for MediaRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.as_ref().hash(state);
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner.as_ref())
    }
}

impl FromStr for MediaRange {
    type Err = MediaRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
