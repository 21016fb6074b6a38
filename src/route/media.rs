//! Consumable / producible media-type conditions.

use std::cmp::Ordering;

use crate::media::MediaRange;
use crate::request::RouteRequest;

/// Media types a route can read request bodies as. Empty matches any
/// Content-Type; an absent Content-Type is treated as
/// `application/octet-stream` before checking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConsumesCondition {
    ranges: Vec<MediaRange>,
}

impl ConsumesCondition {
    pub fn new<I: IntoIterator<Item = MediaRange>>(ranges: I) -> Self {
        let mut out: Vec<MediaRange> = Vec::new();
        for range in ranges {
            if !out.contains(&range) {
                out.push(range);
            }
        }
        Self { ranges: out }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[MediaRange] {
        &self.ranges
    }

    /// The child's declaration replaces the parent's unless the child is
    /// empty, in which case the parent's is inherited.
    pub fn combine(&self, other: &Self) -> Self {
        if other.is_empty() {
            self.clone()
        } else {
            other.clone()
        }
    }

    pub fn matching(&self, request: &RouteRequest) -> Option<Self> {
        if self.ranges.is_empty() {
            return Some(self.clone());
        }
        let content_type = request.content_type().unwrap_or_else(MediaRange::octet_stream);
        let mut matched: Vec<MediaRange> = self
            .ranges
            .iter()
            .filter(|range| range.includes(&content_type))
            .cloned()
            .collect();
        if matched.is_empty() {
            return None;
        }
        matched.sort_by(MediaRange::compare_specificity);
        Some(Self { ranges: matched })
    }

    /// Both sides are assumed narrowed; the more specific leading range
    /// wins, a non-empty condition outranks an empty one.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.ranges.first(), other.ranges.first()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => MediaRange::compare_specificity(a, b),
        }
    }
}

/// Media types a route declares it can produce. Empty matches any Accept
/// header. Narrowing keeps the subset compatible with what the client
/// accepts; that subset is what the negotiation engine later works from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProducesCondition {
    ranges: Vec<MediaRange>,
}

impl ProducesCondition {
    pub fn new<I: IntoIterator<Item = MediaRange>>(ranges: I) -> Self {
        let mut out: Vec<MediaRange> = Vec::new();
        for range in ranges {
            if !out.contains(&range) {
                out.push(range);
            }
        }
        Self { ranges: out }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[MediaRange] {
        &self.ranges
    }

    pub fn combine(&self, other: &Self) -> Self {
        if other.is_empty() {
            self.clone()
        } else {
            other.clone()
        }
    }

    pub fn matching(&self, request: &RouteRequest) -> Option<Self> {
        if self.ranges.is_empty() {
            return Some(self.clone());
        }
        let accepted = request.accepted_media();
        let matched: Vec<MediaRange> = self
            .ranges
            .iter()
            .filter(|range| accepted.iter().any(|a| a.is_compatible_with(range)))
            .cloned()
            .collect();
        if matched.is_empty() {
            None
        } else {
            Some(Self { ranges: matched })
        }
    }

    /// Walks the client's accepted ranges best-first; the condition whose
    /// declaration satisfies an earlier (or more specific) accepted range
    /// wins. Empty conditions compare as `*/*`.
    pub fn compare(&self, other: &Self, request: &RouteRequest) -> Ordering {
        let mut accepted = request.accepted_media();
        accepted.sort_by(MediaRange::compare_specificity_and_quality);

        let ours = self.ranges_to_compare();
        let theirs = other.ranges_to_compare();

        for accept in &accepted {
            let our_match = ours.iter().find(|r| accept.is_compatible_with(r));
            let their_match = theirs.iter().find(|r| accept.is_compatible_with(r));
            match (our_match, their_match) {
                (Some(a), Some(b)) => {
                    let by_specificity = MediaRange::compare_specificity(a, b);
                    if by_specificity != Ordering::Equal {
                        return by_specificity;
                    }
                }
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => {}
            }
        }
        Ordering::Equal
    }

    fn ranges_to_compare(&self) -> Vec<MediaRange> {
        if self.ranges.is_empty() {
            vec![MediaRange::all()]
        } else {
            self.ranges.clone()
        }
    }
}
