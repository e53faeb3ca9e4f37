//! Voltage divider
//!
//! Two stacked resistors, R1 above R2, with three labelled nets:
//! a supply tail on R1, the midpoint between them, and a ground tail on R2.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::core::SheetSyncError;
use crate::diagnostics::Diagnostic;
use crate::geometry::{mid, Point};
use crate::host::probe::{hide_attribute, normalize_value_attribute, set_component_attribute};
use crate::host::{Anchors, ComponentId, HostSession, PinId, RedrawSuspended, SchematicSheet, SymbolRef};
use crate::net::{LabelOutcome, LabelRequest, LabelResolver, SegmentRouter};

/// Height assumed when the symbol reports an empty bounding box
const FALLBACK_HEIGHT: i32 = 100;

#[derive(Clone, Debug)]
pub struct DividerOptions {
    pub symbol: SymbolRef,
    /// Origin of R1
    pub origin: Point,
    pub value: String,
    pub device: String,
    /// Vertical clearance between R1 and R2
    pub gap: i32,
    /// Tail length as a fraction of the pin span
    pub tail_ratio: f64,
    pub min_tail: i32,
    /// Horizontal offset of the preferred label point from the wire
    pub label_offset: i32,
    /// Supply, midpoint and ground net names
    pub net_names: [String; 3],
}

impl Default for DividerOptions {
    fn default() -> Self {
        Self {
            symbol: SymbolRef::new("Discrete", "RES.1"),
            origin: Point::new(100, 120),
            value: "4.7K".to_string(),
            device: "R0603".to_string(),
            gap: 10,
            tail_ratio: 0.4,
            min_tail: 20,
            label_offset: 50,
            net_names: ["net5v".to_string(), "net2.5v".to_string(), "netgnd".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedNet {
    pub requested: String,
    /// Name the host reports after labelling, if any
    pub name: Option<String>,
    pub from: Point,
    pub to: Point,
    pub label_created: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DividerReport {
    pub components: Vec<String>,
    pub nets: Vec<PlacedNet>,
    /// Components whose DEVICE attribute was hidden in the final sweep
    pub hidden_devices: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// False when a placement step failed and the run stopped early
    pub completed: bool,
}

pub fn draw_voltage_divider<S: HostSession>(
    session: &mut S,
    options: &DividerOptions,
    config: &SyncConfig,
) -> Result<DividerReport, SheetSyncError> {
    session.active_sheet_mut()?;
    let mut guard = RedrawSuspended::new(session);
    let sheet = guard.active_sheet_mut()?;
    let mut report = DividerReport::default();

    let Some(r1) = place_resistor(sheet, options, "R1", options.origin, config, &mut report) else {
        return Ok(report);
    };
    let height = sheet
        .bbox(r1)
        .map(|(ll, ur)| ur.y - ll.y)
        .filter(|h| *h > 0)
        .unwrap_or(FALLBACK_HEIGHT);
    let r2_origin = Point::new(options.origin.x, options.origin.y - height - options.gap);
    let Some(r2) = place_resistor(sheet, options, "R2", r2_origin, config, &mut report) else {
        return Ok(report);
    };

    let (Some((r1p1, r1p2)), Some((r2p1, r2p2))) = (resistor_pins(sheet, r1), resistor_pins(sheet, r2)) else {
        report
            .diagnostics
            .push(Diagnostic::creation("R1/R2", "resistor pins could not be resolved"));
        return Ok(report);
    };
    let loc = |pin: PinId| sheet.pin_location(pin).unwrap_or_default();
    let (a1, a2, b1, b2) = (loc(r1p1), loc(r1p2), loc(r2p1), loc(r2p2));

    let span = (a1.x - a2.x).abs().max((a1.y - a2.y).abs());
    let tail = options.min_tail.max((f64::from(span) * options.tail_ratio).trunc() as i32);
    let supply_end = if a1.y >= a2.y { a1.y + tail } else { a1.y - tail };
    let ground_end = if b2.y <= b1.y { b2.y - tail } else { b2.y + tail };

    let router = SegmentRouter::new(config.wire_style);
    let resolver = LabelResolver::new(config);
    let [supply, middle, ground] = &options.net_names;
    let plan = [
        (
            supply,
            a1,
            Point::new(a1.x, supply_end),
            Anchors::new(Some(r1p1), None),
            Point::new(a1.x + options.label_offset, supply_end),
        ),
        (
            middle,
            a2,
            b1,
            Anchors::new(Some(r1p2), Some(r2p1)),
            Point::new(a2.x + options.label_offset, mid(a2.y, b1.y)),
        ),
        (
            ground,
            b2,
            Point::new(b2.x, ground_end),
            Anchors::new(Some(r2p2), None),
            Point::new(b2.x + options.label_offset, ground_end),
        ),
    ];

    for (name, from, to, anchors, preferred) in plan {
        let mut placed = PlacedNet {
            requested: name.clone(),
            name: None,
            from,
            to,
            label_created: false,
        };
        let net = match router.route(sheet, from, to, anchors) {
            Ok(route) => {
                if let Some(message) = route.shortfall(from, to) {
                    report.diagnostics.push(Diagnostic::creation(name.as_str(), message));
                }
                route.net
            }
            Err(e) => {
                warn!("{}: {}", name, e);
                report.diagnostics.push(Diagnostic::creation(name.as_str(), e.to_string()));
                report.nets.push(placed);
                continue;
            }
        };
        match resolver.resolve(sheet, net, &LabelRequest::new(name.as_str(), preferred, from, to)) {
            Ok(LabelOutcome::AlreadyNamed { name: existing, .. }) => placed.name = Some(existing),
            Ok(LabelOutcome::Attached { .. }) => {
                placed.label_created = true;
                placed.name = crate::net::net_name(&*sheet, net, config);
            }
            Err(e) => report.diagnostics.push(Diagnostic::geometry(name.as_str(), e.to_string())),
        }
        report.nets.push(placed);
    }

    sheet.refresh();
    report.hidden_devices = hide_device_everywhere(sheet, &options.device, config);
    report.completed = true;
    info!(
        "Voltage divider placed: {} components, {} nets, {} DEVICE attributes hidden",
        report.components.len(),
        report.nets.len(),
        report.hidden_devices
    );
    Ok(report)
}

fn place_resistor<S: SchematicSheet + ?Sized>(
    sheet: &mut S,
    options: &DividerOptions,
    refdes: &str,
    at: Point,
    config: &SyncConfig,
    report: &mut DividerReport,
) -> Option<ComponentId> {
    let comp = match sheet.add_symbol_instance(&options.symbol, at) {
        Ok(comp) => comp,
        Err(e) => {
            report
                .diagnostics
                .push(Diagnostic::creation(refdes, format!("cannot add {}: {}", options.symbol, e)));
            return None;
        }
    };
    if let Err(e) = sheet.set_refdes(comp, refdes) {
        report.diagnostics.push(Diagnostic::attribute(refdes, e.to_string()));
    }
    if let Err(e) = normalize_value_attribute(sheet, comp, &options.value, config) {
        report.diagnostics.push(Diagnostic::attribute(refdes, e.to_string()));
    }
    if let Err(e) = set_component_attribute(sheet, comp, "DEVICE", &options.device, config) {
        report.diagnostics.push(Diagnostic::attribute(refdes, e.to_string()));
    }
    hide_attribute(sheet, comp, "DEVICE", None, config);
    report.components.push(refdes.to_string());
    Some(comp)
}

/// Pins "1" and "2" by number, else the first two pins with the higher
/// one first.
pub fn resistor_pins<S: SchematicSheet + ?Sized>(sheet: &S, component: ComponentId) -> Option<(PinId, PinId)> {
    let pins = sheet.pins(component);
    let by_number = |n: &str| {
        pins.iter()
            .copied()
            .find(|&pin| sheet.pin_number(pin).is_some_and(|num| num.trim() == n))
    };
    if let (Some(p1), Some(p2)) = (by_number("1"), by_number("2")) {
        return Some((p1, p2));
    }
    let (&a, &b) = (pins.first()?, pins.get(1)?);
    let ya = sheet.pin_location(a)?.y;
    let yb = sheet.pin_location(b)?.y;
    if ya >= yb {
        Some((a, b))
    } else {
        Some((b, a))
    }
}

/// Hide `DEVICE=<device>` on every component of the sheet.
pub fn hide_device_everywhere<S: SchematicSheet + ?Sized>(sheet: &mut S, device: &str, config: &SyncConfig) -> usize {
    sheet
        .components()
        .into_iter()
        .filter(|&comp| hide_attribute(sheet, comp, "DEVICE", Some(device), config))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemorySession, MemorySheet, SymbolDef, SymbolLibrary};

    #[test]
    fn test_pins_fall_back_to_location_order() {
        let mut library = SymbolLibrary::empty();
        library.register(
            SymbolRef::new("Discrete", "R.ALT"),
            SymbolDef {
                pins: vec![
                    ("A".to_string(), Point::new(0, 0)),
                    ("B".to_string(), Point::new(0, 80)),
                ],
                bbox: (Point::new(-5, 0), Point::new(5, 80)),
                attributes: Vec::new(),
            },
        );
        let mut sheet = MemorySheet::with_library(library);
        let comp = sheet
            .add_symbol_instance(&SymbolRef::new("Discrete", "R.ALT"), Point::new(0, 0))
            .unwrap();
        let (top, bottom) = resistor_pins(&sheet, comp).unwrap();
        assert_eq!(sheet.pin_location(top), Some(Point::new(0, 80)));
        assert_eq!(sheet.pin_location(bottom), Some(Point::new(0, 0)));
    }

    #[test]
    fn test_no_active_view_is_fatal() {
        let mut session = MemorySession::new();
        let result = draw_voltage_divider(&mut session, &DividerOptions::default(), &SyncConfig::default());
        assert!(matches!(result, Err(SheetSyncError::HostUnavailable(_))));
        assert_eq!(session.redraw_toggles(), 0);
    }

    #[test]
    fn test_missing_symbol_stops_run_and_restores_redraw() {
        let mut session = MemorySession::with_blank_sheet("Schematic1", "1");
        let options = DividerOptions {
            symbol: SymbolRef::new("Discrete", "NOPE"),
            ..Default::default()
        };
        let report = draw_voltage_divider(&mut session, &options, &SyncConfig::default()).unwrap();
        assert!(!report.completed);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(session.redraw_enabled());
    }
}
