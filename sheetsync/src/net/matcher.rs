//! Tiered Segment Matcher
//!
//! Segment sameness across two independently drawn copies of a net is a
//! geometric question; no object identity survives a session. Candidates
//! are tried in strict order:
//! 1. canonical key equal to the original segment's key
//! 2. the label position lies on the candidate (within tolerance)
//! 3. nearest candidate by point-to-segment distance
//!
//! Tier 3 only fails on an empty candidate list, unless a maximum distance
//! is configured.

use crate::config::SyncConfig;
use crate::geometry::{distance_point_to_segment, point_on_segment, Point, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    CanonicalKey,
    OnSegment,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentMatch<T> {
    pub segment: T,
    pub span: Span,
    pub tier: MatchTier,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub tolerance: i32,
    pub max_nearest_distance: Option<f64>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            tolerance: crate::geometry::DEFAULT_TOLERANCE,
            max_nearest_distance: None,
        }
    }
}

impl From<&SyncConfig> for MatchOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            max_nearest_distance: config.nearest_max_distance,
        }
    }
}

/// Pick the candidate that corresponds to `original`, for a label recorded
/// at `position`. Ties keep the earliest candidate.
pub fn match_segment<T: Copy>(
    candidates: &[(T, Span)],
    original: &Span,
    position: Point,
    options: &MatchOptions,
) -> Option<SegmentMatch<T>> {
    let wanted = original.key();
    if let Some(&(segment, span)) = candidates.iter().find(|(_, span)| span.key() == wanted) {
        return Some(SegmentMatch {
            segment,
            span,
            tier: MatchTier::CanonicalKey,
        });
    }

    if let Some(&(segment, span)) = candidates
        .iter()
        .find(|(_, span)| point_on_segment(position, span, options.tolerance))
    {
        return Some(SegmentMatch {
            segment,
            span,
            tier: MatchTier::OnSegment,
        });
    }

    let mut best: Option<(T, Span, f64)> = None;
    for &(segment, span) in candidates {
        let dist = distance_point_to_segment(position, &span);
        if best.map_or(true, |(_, _, d)| dist < d) {
            best = Some((segment, span, dist));
        }
    }
    let (segment, span, dist) = best?;
    if options.max_nearest_distance.is_some_and(|max| dist > max) {
        return None;
    }
    Some(SegmentMatch {
        segment,
        span,
        tier: MatchTier::Nearest,
    })
}
