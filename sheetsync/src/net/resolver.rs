//! Label Resolver
//!
//! Names a net with a text label. A net that already carries a real name is
//! left alone, so resolving twice never stacks labels. Otherwise placement
//! is tried tier by tier until the host reports the net as named:
//!
//! | Tier        | Segment            | Point                                   |
//! |-------------|--------------------|-----------------------------------------|
//! | `Midpoint`  | each, in net order | segment midpoint                        |
//! | `Preferred` | first              | caller's preferred point                |
//! | `Axis`      | first              | midpoint of a straight request's axis   |
//! | `Elbow`     | first, then second | vertical leg mid, then horizontal leg mid |
//!
//! `Axis` is only tried for straight requests and `Elbow` only for bent
//! ones. A label created by a failed attempt is removed before the next.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{label_name, net_has_label, net_name};
use crate::config::SyncConfig;
use crate::geometry::{mid, Point};
use crate::host::{LabelId, NetId, SchematicSheet, SegmentId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("{0} has no segments")]
    NoSegments(NetId),

    #[error("No placement tier named {net} '{text}' ({attempts} attempts)")]
    Exhausted { net: NetId, text: String, attempts: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlacementTier {
    Midpoint,
    Preferred,
    Axis,
    Elbow,
}

/// What the caller wants on the net
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRequest {
    pub text: String,
    pub preferred: Point,
    /// Endpoints of the connection the net was routed for
    pub from: Point,
    pub to: Point,
}

impl LabelRequest {
    pub fn new(text: impl Into<String>, preferred: Point, from: Point, to: Point) -> Self {
        Self {
            text: text.into(),
            preferred,
            from,
            to,
        }
    }

    fn is_straight(&self) -> bool {
        self.from.x == self.to.x || self.from.y == self.to.y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LabelOutcome {
    /// The net already had a real name; nothing was created
    AlreadyNamed { name: String, label: Option<LabelId> },
    Attached {
        tier: PlacementTier,
        segment: SegmentId,
        at: Point,
        label: LabelId,
    },
}

impl LabelOutcome {
    pub fn created(&self) -> bool {
        matches!(self, LabelOutcome::Attached { .. })
    }
}

/// A label to recreate as recorded, without tier fallback
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSpec {
    pub text: String,
    pub at: Point,
    pub orientation: Option<i32>,
    pub size: Option<i32>,
}

pub struct LabelResolver<'a> {
    config: &'a SyncConfig,
}

impl<'a> LabelResolver<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    /// Existing real name of the net and the label carrying it, if any
    pub fn existing_name<S: SchematicSheet + ?Sized>(&self, sheet: &S, net: NetId) -> Option<(String, Option<LabelId>)> {
        for seg in sheet.segments(net) {
            if let Some(label) = sheet.label(net, seg) {
                if let Some(name) = label_name(sheet, label, self.config) {
                    return Some((name, Some(label)));
                }
            }
        }
        net_name(sheet, net, self.config).map(|name| {
            let label = sheet
                .segments(net)
                .into_iter()
                .find_map(|seg| sheet.connected_label(net, seg));
            (name, label)
        })
    }

    pub fn resolve<S: SchematicSheet + ?Sized>(
        &self,
        sheet: &mut S,
        net: NetId,
        request: &LabelRequest,
    ) -> Result<LabelOutcome, ResolveError> {
        if let Some((name, label)) = self.existing_name(&*sheet, net) {
            if let Some(label) = label {
                let _ = sheet.set_label_visible(label, true);
                let _ = sheet.set_label_text(label, &name);
            }
            info!("{} already named {}", net, name);
            return Ok(LabelOutcome::AlreadyNamed { name, label });
        }

        let segments = sheet.segments(net);
        let Some(&first) = segments.first() else {
            return Err(ResolveError::NoSegments(net));
        };

        let mut attempts: Vec<(PlacementTier, SegmentId, Point)> = segments
            .iter()
            .filter_map(|&seg| {
                sheet
                    .segment_span(seg)
                    .map(|span| (PlacementTier::Midpoint, seg, span.midpoint()))
            })
            .collect();
        attempts.push((PlacementTier::Preferred, first, request.preferred));

        let (from, to) = (request.from, request.to);
        if request.is_straight() {
            let at = if from.x == to.x {
                Point::new(from.x, mid(from.y, to.y))
            } else {
                Point::new(mid(from.x, to.x), from.y)
            };
            attempts.push((PlacementTier::Axis, first, at));
        } else {
            let second = segments.get(1).copied().unwrap_or(first);
            attempts.push((PlacementTier::Elbow, first, Point::new(from.x, mid(from.y, to.y))));
            attempts.push((PlacementTier::Elbow, second, Point::new(mid(from.x, to.x), to.y)));
        }

        for &(tier, segment, at) in &attempts {
            if let Some(label) = self.try_place(sheet, net, segment, &request.text, at) {
                info!("Labelled {} '{}' at {} ({:?})", net, request.text, at, tier);
                return Ok(LabelOutcome::Attached {
                    tier,
                    segment,
                    at,
                    label,
                });
            }
            debug!("{:?} attempt at {} left {} unnamed", tier, at, net);
        }

        warn!("Could not name {} '{}'", net, request.text);
        Err(ResolveError::Exhausted {
            net,
            text: request.text.clone(),
            attempts: attempts.len(),
        })
    }

    /// One placement attempt. Success means the net now reports a real
    /// name; otherwise the created label is removed again.
    fn try_place<S: SchematicSheet + ?Sized>(
        &self,
        sheet: &mut S,
        net: NetId,
        segment: SegmentId,
        text: &str,
        at: Point,
    ) -> Option<LabelId> {
        let label = match sheet.add_label(net, segment, text, at) {
            Ok(label) => label,
            Err(e) => {
                debug!("Label creation at {} failed: {}", at, e);
                return None;
            }
        };
        let _ = sheet.set_label_text(label, text);
        let _ = sheet.set_label_visible(label, true);
        if net_name(&*sheet, net, self.config).is_some() {
            return Some(label);
        }
        if let Err(e) = sheet.remove_label(label) {
            warn!("Unnamed label on {} could not be removed: {}", net, e);
        }
        None
    }

    /// Recreate a recorded label on `segment` unless the net already shows
    /// that text. Returns the new label, or `None` when one was present.
    pub fn attach_if_absent<S: SchematicSheet + ?Sized>(
        &self,
        sheet: &mut S,
        net: NetId,
        segment: SegmentId,
        spec: &LabelSpec,
    ) -> Result<Option<LabelId>, crate::host::HostError> {
        if net_has_label(&*sheet, net, &spec.text, self.config) {
            debug!("{} already carries '{}'", net, spec.text);
            return Ok(None);
        }
        let label = sheet.add_label(net, segment, &spec.text, spec.at)?;
        if let Some(orientation) = spec.orientation {
            let _ = sheet.set_label_orientation(label, orientation);
        }
        if let Some(size) = spec.size {
            let _ = sheet.set_label_size(label, size);
        }
        let _ = sheet.set_label_location(label, spec.at);
        let _ = sheet.set_label_text(label, &spec.text);
        let _ = sheet.set_label_visible(label, true);
        Ok(Some(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemorySheet;
    use crate::host::{Anchors, WireStyle};

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    fn wire(sheet: &mut MemorySheet, from: Point, to: Point) -> NetId {
        sheet.add_net(from, to, Anchors::NONE, WireStyle::Wire).unwrap()
    }

    #[test]
    fn test_midpoint_of_first_segment_wins() {
        let mut sheet = MemorySheet::new();
        let net = wire(&mut sheet, p(0, 0), p(0, 80));
        let config = SyncConfig::default();
        let outcome = LabelResolver::new(&config)
            .resolve(&mut sheet, net, &LabelRequest::new("VCC", p(50, 0), p(0, 0), p(0, 80)))
            .unwrap();
        match outcome {
            LabelOutcome::Attached { tier, at, label, .. } => {
                assert_eq!(tier, PlacementTier::Midpoint);
                assert_eq!(at, p(0, 40));
                assert_eq!(sheet.label_visible(label), Some(true));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(sheet.net_name(net), "VCC");
    }

    #[test]
    fn test_placeholder_label_does_not_count_as_named() {
        let mut sheet = MemorySheet::new();
        let net = wire(&mut sheet, p(0, 0), p(40, 0));
        let seg = sheet.segments(net)[0];
        sheet.add_label(net, seg, "$1N7", p(10, 0)).unwrap();
        let config = SyncConfig::default();
        let resolver = LabelResolver::new(&config);
        assert!(resolver.existing_name(&sheet, net).is_none());
    }

    #[test]
    fn test_label_creation_failures_fall_through_tiers() {
        let mut sheet = MemorySheet::new();
        let net = wire(&mut sheet, p(0, 0), p(0, 80));
        sheet.failing_label_creations = 2;
        let config = SyncConfig::default();
        let outcome = LabelResolver::new(&config)
            .resolve(&mut sheet, net, &LabelRequest::new("VCC", p(0, 10), p(0, 0), p(0, 80)))
            .unwrap();
        // midpoint and preferred attempts fail, the axis midpoint succeeds
        assert!(matches!(outcome, LabelOutcome::Attached { tier: PlacementTier::Axis, .. }));
        assert_eq!(sheet.label_count(), 1);
    }

    fn bent_net(sheet: &mut MemorySheet) -> NetId {
        // legs (0,0)-(0,90) and (0,90)-(60,90)
        wire(sheet, p(0, 0), p(0, 90));
        wire(sheet, p(0, 90), p(60, 90))
    }

    #[test]
    fn test_elbow_tier_uses_vertical_leg_first() {
        let mut sheet = MemorySheet::new();
        let net = bent_net(&mut sheet);
        assert_eq!(sheet.segments(net).len(), 2);
        // two midpoints and the preferred point fail
        sheet.failing_label_creations = 3;
        let config = SyncConfig::default();
        let outcome = LabelResolver::new(&config)
            .resolve(&mut sheet, net, &LabelRequest::new("SCL", p(40, 45), p(0, 0), p(60, 90)))
            .unwrap();
        match outcome {
            LabelOutcome::Attached { tier, segment, at, .. } => {
                assert_eq!(tier, PlacementTier::Elbow);
                assert_eq!(segment, sheet.segments(net)[0]);
                assert_eq!(at, p(0, 45));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(sheet.label_count(), 1);
        assert_eq!(sheet.net_name(net), "SCL");
    }

    #[test]
    fn test_elbow_tier_falls_back_to_horizontal_leg() {
        let mut sheet = MemorySheet::new();
        let net = bent_net(&mut sheet);
        sheet.failing_label_creations = 4;
        let config = SyncConfig::default();
        let outcome = LabelResolver::new(&config)
            .resolve(&mut sheet, net, &LabelRequest::new("SCL", p(40, 45), p(0, 0), p(60, 90)))
            .unwrap();
        match outcome {
            LabelOutcome::Attached { tier, segment, at, .. } => {
                assert_eq!(tier, PlacementTier::Elbow);
                assert_eq!(segment, sheet.segments(net)[1]);
                assert_eq!(at, p(30, 90));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(sheet.label_count(), 1);
    }

    #[test]
    fn test_exhausted_leaves_no_label() {
        let mut sheet = MemorySheet::new();
        let net = wire(&mut sheet, p(0, 0), p(0, 80));
        sheet.failing_label_creations = 10;
        let config = SyncConfig::default();
        let err = LabelResolver::new(&config)
            .resolve(&mut sheet, net, &LabelRequest::new("VCC", p(0, 10), p(0, 0), p(0, 80)))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Exhausted { attempts: 3, .. }));
        assert_eq!(sheet.label_count(), 0);
    }

    #[test]
    fn test_attach_if_absent_skips_existing_text() {
        let mut sheet = MemorySheet::new();
        let net = wire(&mut sheet, p(0, 0), p(60, 0));
        let seg = sheet.segments(net)[0];
        let config = SyncConfig::default();
        let resolver = LabelResolver::new(&config);
        let spec = LabelSpec {
            text: "SDA".to_string(),
            at: p(30, 0),
            orientation: Some(2),
            size: Some(12),
        };
        let first = resolver.attach_if_absent(&mut sheet, net, seg, &spec).unwrap();
        let label = first.unwrap();
        assert_eq!(sheet.label_orientation(label), Some(2));
        assert_eq!(sheet.label_size(label), Some(12));
        assert_eq!(resolver.attach_if_absent(&mut sheet, net, seg, &spec).unwrap(), None);
        assert_eq!(sheet.label_count(), 1);
    }
}
