//! Segment Router
//!
//! Turns a two-point connection request into one straight wire, or two
//! wires meeting at an elbow when the points share neither coordinate.
//! There is exactly one elbow rule, `(from.x, to.y)`; no obstacle-aware
//! routing happens here.

use thiserror::Error;
use tracing::{debug, warn};

use crate::geometry::{Point, Span};
use crate::host::{Anchors, HostError, NetId, SchematicSheet, WireStyle};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("Degenerate connection at {0}")]
    Degenerate(Point),

    #[error("Wire {from} -> {to} could not be created: {source}")]
    CreationFailed {
        from: Point,
        to: Point,
        #[source]
        source: HostError,
    },
}

/// One straight wire of a planned route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    pub span: Span,
    pub anchors: Anchors,
}

/// How the returned net came about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// One straight wire was drawn
    Straight,
    /// Both elbow legs were drawn
    Elbow,
    /// Only the first elbow leg was drawn
    PartialElbow,
    /// Nothing was drawn; the net already reaching an anchor is returned.
    /// Callers must not assume a new wire exists.
    Recovered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub net: NetId,
    pub kind: RouteKind,
    /// Spans actually created, in drawing order
    pub drawn: Vec<Span>,
}

impl Route {
    /// Message for an elbow that stopped at its bend
    pub fn shortfall(&self, from: Point, to: Point) -> Option<String> {
        (self.kind == RouteKind::PartialElbow)
            .then(|| format!("{} -> {} stops at {}; second leg not drawn", from, to, elbow(from, to)))
    }
}

/// Bend point used when `from` and `to` share no coordinate
pub fn elbow(from: Point, to: Point) -> Point {
    Point::new(from.x, to.y)
}

/// Wires needed to connect `from` to `to`. The first anchor rides on the
/// first leg, the second anchor on the last leg.
pub fn plan_route(from: Point, to: Point, anchors: Anchors) -> Result<Vec<Leg>, RouteError> {
    if from == to {
        return Err(RouteError::Degenerate(from));
    }
    if from.x == to.x || from.y == to.y {
        return Ok(vec![Leg {
            span: Span::new(from, to),
            anchors,
        }]);
    }
    let bend = elbow(from, to);
    Ok(vec![
        Leg {
            span: Span::new(from, bend),
            anchors: Anchors::new(anchors.from, None),
        },
        Leg {
            span: Span::new(bend, to),
            anchors: Anchors::new(None, anchors.to),
        },
    ])
}

/// Issues the planned wires against a sheet. Creation failures are terminal
/// for the call; nothing is retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentRouter {
    style: WireStyle,
}

impl SegmentRouter {
    pub fn new(style: WireStyle) -> Self {
        Self { style }
    }

    pub fn route<S: SchematicSheet + ?Sized>(
        &self,
        sheet: &mut S,
        from: Point,
        to: Point,
        anchors: Anchors,
    ) -> Result<Route, RouteError> {
        let legs = plan_route(from, to, anchors)?;
        let mut drawn = Vec::with_capacity(legs.len());
        let mut last_error = None;
        let mut net = None;

        for (i, leg) in legs.iter().enumerate() {
            match sheet.add_net(leg.span.low, leg.span.high, leg.anchors, self.style) {
                Ok(id) => {
                    drawn.push(leg.span);
                    net = Some(id);
                }
                Err(e) => {
                    debug!("Leg {} ({}) failed: {}", i + 1, leg.span, e);
                    last_error = Some(e);
                    break;
                }
            }
        }

        if let Some(net) = net {
            let kind = match (legs.len(), drawn.len()) {
                (1, _) => RouteKind::Straight,
                (_, n) if n == legs.len() => RouteKind::Elbow,
                _ => {
                    warn!("Wire {} -> {} drawn only up to its bend", from, to);
                    RouteKind::PartialElbow
                }
            };
            return Ok(Route { net, kind, drawn });
        }

        let recovered = [anchors.from, anchors.to]
            .into_iter()
            .flatten()
            .find_map(|pin| sheet.pin_net(pin));
        if let Some(net) = recovered {
            warn!("Wire {} -> {} not drawn; using {} already reaching an anchor", from, to, net);
            return Ok(Route {
                net,
                kind: RouteKind::Recovered,
                drawn,
            });
        }

        Err(RouteError::CreationFailed {
            from,
            to,
            source: last_error
                .unwrap_or_else(|| HostError::CreationFailed("no segment created".to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemorySheet;
    use crate::host::{PinId, SymbolRef};

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_shared_x_gives_single_leg() {
        let legs = plan_route(p(10, 0), p(10, 80), Anchors::NONE).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].span, Span::new(p(10, 0), p(10, 80)));
    }

    #[test]
    fn test_shared_y_gives_single_leg_with_both_anchors() {
        let anchors = Anchors::new(Some(PinId(1)), Some(PinId(2)));
        let legs = plan_route(p(0, 5), p(-40, 5), anchors).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].anchors, anchors);
    }

    #[test]
    fn test_diagonal_request_bends_at_from_x_to_y() {
        let anchors = Anchors::new(Some(PinId(1)), Some(PinId(2)));
        let legs = plan_route(p(0, 0), p(30, 70), anchors).unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].span, Span::new(p(0, 0), p(0, 70)));
        assert_eq!(legs[1].span, Span::new(p(0, 70), p(30, 70)));
        assert_eq!(legs[0].anchors, Anchors::new(Some(PinId(1)), None));
        assert_eq!(legs[1].anchors, Anchors::new(None, Some(PinId(2))));
        assert!(legs.iter().all(|leg| leg.span.is_axis_aligned()));
    }

    #[test]
    fn test_same_point_is_rejected() {
        assert_eq!(
            plan_route(p(3, 3), p(3, 3), Anchors::NONE),
            Err(RouteError::Degenerate(p(3, 3)))
        );
    }

    #[test]
    fn test_elbow_route_returns_second_leg_net() {
        let mut sheet = MemorySheet::new();
        let route = SegmentRouter::default()
            .route(&mut sheet, p(0, 0), p(50, 50), Anchors::NONE)
            .unwrap();
        assert_eq!(route.kind, RouteKind::Elbow);
        assert_eq!(route.drawn.len(), 2);
        assert_eq!(sheet.segments(route.net).len(), 2);
    }

    #[test]
    fn test_creation_failure_without_anchor_is_reported() {
        let mut sheet = MemorySheet::new();
        sheet.failing_net_creations = 1;
        let err = SegmentRouter::default()
            .route(&mut sheet, p(0, 0), p(0, 50), Anchors::NONE)
            .unwrap_err();
        assert!(matches!(err, RouteError::CreationFailed { .. }));
        assert_eq!(sheet.net_requests.len(), 1);
    }

    #[test]
    fn test_failed_first_leg_stops_route() {
        let mut sheet = MemorySheet::new();
        sheet.failing_net_creations = 1;
        let result = SegmentRouter::default().route(&mut sheet, p(0, 0), p(50, 50), Anchors::NONE);
        assert!(result.is_err());
        assert_eq!(sheet.net_requests.len(), 1);
    }

    #[test]
    fn test_failure_recovers_net_already_on_anchor() {
        let mut sheet = MemorySheet::new();
        let r1 = sheet
            .add_symbol_instance(&SymbolRef::new("Discrete", "RES.1"), p(0, 0))
            .unwrap();
        let pin = sheet.pins(r1)[0];
        let top = sheet.pin_location(pin).unwrap();
        let existing = sheet
            .add_net(top, p(0, 150), Anchors::new(Some(pin), None), WireStyle::Wire)
            .unwrap();

        sheet.failing_net_creations = 1;
        let route = SegmentRouter::default()
            .route(&mut sheet, top, p(60, 100), Anchors::new(Some(pin), None))
            .unwrap();
        assert_eq!(route.kind, RouteKind::Recovered);
        assert_eq!(route.net, existing);
        assert!(route.drawn.is_empty());
    }

    #[test]
    fn test_rejected_second_leg_gives_partial_elbow() {
        let mut sheet = MemorySheet::new();
        sheet.rejected_wires.push(Span::new(p(0, 50), p(50, 50)));
        let route = SegmentRouter::default()
            .route(&mut sheet, p(0, 0), p(50, 50), Anchors::NONE)
            .unwrap();
        assert_eq!(route.kind, RouteKind::PartialElbow);
        assert_eq!(route.drawn, vec![Span::new(p(0, 0), p(0, 50))]);
        assert_eq!(sheet.net_requests.len(), 2);
        let message = route.shortfall(p(0, 0), p(50, 50)).unwrap();
        assert!(message.contains("second leg"), "{}", message);
    }

    #[test]
    fn test_complete_routes_have_no_shortfall() {
        let mut sheet = MemorySheet::new();
        let router = SegmentRouter::default();
        let straight = router.route(&mut sheet, p(0, 0), p(0, 50), Anchors::NONE).unwrap();
        let bent = router.route(&mut sheet, p(100, 0), p(150, 50), Anchors::NONE).unwrap();
        assert_eq!(straight.shortfall(p(0, 0), p(0, 50)), None);
        assert_eq!(bent.shortfall(p(100, 0), p(150, 50)), None);
    }
}
