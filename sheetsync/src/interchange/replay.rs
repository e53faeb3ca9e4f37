//! Export a sheet into records and replay records onto another sheet.
//!
//! Import never stops on a bad item: each component and each net either
//! lands or leaves a [`Diagnostic`] behind.

use tracing::{debug, info, warn};

use super::records::{ComponentRecord, LabelRecord, NetRecord};
use super::InterchangeError;
use crate::config::SyncConfig;
use crate::diagnostics::Diagnostic;
use crate::host::probe::{apply_attributes, collect_attributes, set_component_value};
use crate::host::{Anchors, NetId, Owner, SchematicSheet};
use crate::net::{match_segment, segment_spans, LabelResolver, LabelSpec, MatchOptions, SegmentRouter, TopologyExtractor};

/// Outcome of an import pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub components: usize,
    pub nets: usize,
    pub labels: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportSummary {
    pub fn merge(&mut self, other: ImportSummary) {
        self.components += other.components;
        self.nets += other.nets;
        self.labels += other.labels;
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Placement and attributes of every component that has a location and a
/// library reference.
pub fn export_components<S: SchematicSheet + ?Sized>(sheet: &S) -> Vec<ComponentRecord> {
    sheet
        .components()
        .into_iter()
        .filter_map(|comp| {
            let location = sheet.location(comp)?;
            let symbol = sheet.symbol(comp)?;
            Some(ComponentRecord {
                refdes: sheet.refdes(comp).unwrap_or_default(),
                partition: symbol.partition,
                symbol: symbol.symbol,
                location,
                orientation: sheet.orientation(comp),
                scale: sheet.scale(comp),
                attributes: collect_attributes(sheet, Owner::Component(comp)),
            })
        })
        .filter(|record| record.symbol_ref().is_some())
        .collect()
}

/// Segment spans, real labels and attributes of every net with segments.
pub fn export_nets<S: SchematicSheet + ?Sized>(sheet: &S, config: &SyncConfig) -> Vec<NetRecord> {
    let extractor = TopologyExtractor::new(config);
    sheet
        .nets()
        .into_iter()
        .map(|net| (net, extractor.extract(sheet, net)))
        .filter(|(_, topo)| !topo.segments.is_empty())
        .map(|(net, topo)| NetRecord {
            segments: topo.segments,
            labels: topo.labels.iter().map(LabelRecord::from).collect(),
            attributes: collect_attributes(sheet, Owner::Net(net)),
        })
        .collect()
}

/// Split parsed rows into records and one diagnostic per bad row.
pub fn split_rows<T>(rows: Vec<Result<T, InterchangeError>>, table: &str) -> (Vec<T>, Vec<Diagnostic>) {
    let mut records = Vec::with_capacity(rows.len());
    let mut diagnostics = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => diagnostics.push(Diagnostic::creation(format!("{} row {}", table, i + 1), e.to_string())),
        }
    }
    (records, diagnostics)
}

pub fn import_components<S: SchematicSheet + ?Sized>(
    sheet: &mut S,
    records: &[ComponentRecord],
    config: &SyncConfig,
) -> ImportSummary {
    let mut summary = ImportSummary::default();
    for (i, record) in records.iter().enumerate() {
        let subject = if record.refdes.is_empty() {
            format!("component row {}", i + 1)
        } else {
            record.refdes.clone()
        };
        let Some(symbol) = record.symbol_ref() else {
            summary
                .diagnostics
                .push(Diagnostic::creation(subject, "missing Partition or Symbol"));
            continue;
        };
        let comp = match sheet.add_symbol_instance(&symbol, record.location) {
            Ok(comp) => comp,
            Err(e) => {
                warn!("{}: {}", subject, e);
                summary.diagnostics.push(Diagnostic::creation(subject, e.to_string()));
                continue;
            }
        };

        if !record.refdes.is_empty() {
            if let Err(e) = sheet.set_refdes(comp, &record.refdes) {
                debug!("{}: refdes not set: {}", subject, e);
            }
        }
        if let Some(orientation) = record.orientation {
            let _ = sheet.set_orientation(comp, orientation);
        }
        if let Some(scale) = record.scale {
            let _ = sheet.set_scale(comp, scale);
        }

        for name in apply_attributes(sheet, Owner::Component(comp), &record.attributes, config) {
            summary
                .diagnostics
                .push(Diagnostic::attribute(subject.clone(), format!("attribute {} dropped", name)));
        }
        if let Some(value) = record.value() {
            if let Err(e) = set_component_value(sheet, comp, &value, None, config) {
                summary.diagnostics.push(Diagnostic::attribute(subject.clone(), e.to_string()));
            }
        }
        summary.components += 1;
    }
    info!("Imported {} of {} components", summary.components, records.len());
    summary
}

pub fn import_nets<S: SchematicSheet + ?Sized>(
    sheet: &mut S,
    records: &[NetRecord],
    config: &SyncConfig,
) -> ImportSummary {
    let router = SegmentRouter::new(config.wire_style);
    let resolver = LabelResolver::new(config);
    let options = MatchOptions::from(config);
    let mut summary = ImportSummary::default();

    for (i, record) in records.iter().enumerate() {
        let subject = record
            .labels
            .iter()
            .map(|l| l.name.trim())
            .find(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("net row {}", i + 1));
        if record.segments.is_empty() {
            debug!("{}: no segments recorded", subject);
            continue;
        }

        let mut last_net: Option<NetId> = None;
        for span in &record.segments {
            match router.route(sheet, span.low, span.high, Anchors::NONE) {
                Ok(route) => {
                    if let Some(message) = route.shortfall(span.low, span.high) {
                        summary.diagnostics.push(Diagnostic::creation(subject.clone(), message));
                    }
                    last_net = Some(route.net);
                }
                Err(e) => summary.diagnostics.push(Diagnostic::creation(subject.clone(), e.to_string())),
            }
        }
        let Some(net) = last_net else {
            warn!("{}: no segment could be created", subject);
            continue;
        };

        for name in apply_attributes(sheet, Owner::Net(net), &record.attributes, config) {
            summary
                .diagnostics
                .push(Diagnostic::attribute(subject.clone(), format!("attribute {} dropped", name)));
        }

        let candidates = segment_spans(&*sheet, net);
        for label in &record.labels {
            let text = label.name.trim();
            if text.is_empty() {
                continue;
            }
            let Some(matched) = match_segment(&candidates, &label.segment(), label.position(), &options) else {
                summary.diagnostics.push(Diagnostic::geometry(
                    text,
                    format!("no segment near {} for the label", label.position()),
                ));
                continue;
            };
            debug!("Label {} matched {} by {:?}", text, matched.span, matched.tier);
            let spec = LabelSpec {
                text: text.to_string(),
                at: label.position(),
                orientation: label.orientation,
                size: label.size,
            };
            match resolver.attach_if_absent(sheet, net, matched.segment, &spec) {
                Ok(Some(_)) => summary.labels += 1,
                Ok(None) => {}
                Err(e) => summary.diagnostics.push(Diagnostic::creation(text, e.to_string())),
            }
        }
        summary.nets += 1;
    }
    info!(
        "Imported {} of {} nets with {} labels",
        summary.nets,
        records.len(),
        summary.labels
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Span};
    use crate::host::memory::MemorySheet;
    use crate::host::{SymbolRef, WireStyle};
    use crate::interchange::AttributeRecord;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_component_without_symbol_is_skipped() {
        let mut sheet = MemorySheet::new();
        let records = vec![ComponentRecord {
            refdes: "U9".to_string(),
            partition: String::new(),
            symbol: "OPAMP".to_string(),
            location: p(0, 0),
            orientation: None,
            scale: None,
            attributes: Vec::new(),
        }];
        let summary = import_components(&mut sheet, &records, &SyncConfig::default());
        assert_eq!(summary.components, 0);
        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(summary.diagnostics[0].subject, "U9");
        assert!(sheet.components().is_empty());
    }

    #[test]
    fn test_unknown_symbol_does_not_stop_later_rows() {
        let mut sheet = MemorySheet::new();
        let config = SyncConfig::default();
        let mk = |refdes: &str, symbol: &str| ComponentRecord {
            refdes: refdes.to_string(),
            partition: "Discrete".to_string(),
            symbol: symbol.to_string(),
            location: p(10, 10),
            orientation: Some(0),
            scale: Some(1.0),
            attributes: vec![AttributeRecord {
                name: "value".to_string(),
                value: Some("22K".to_string()),
                ..Default::default()
            }],
        };
        let records = vec![mk("X1", "MYSTERY.1"), mk("R5", "RES.1")];
        let summary = import_components(&mut sheet, &records, &config);
        assert_eq!(summary.components, 1);
        assert_eq!(summary.diagnostics.len(), 1);
        let comp = sheet.components()[0];
        assert_eq!(sheet.refdes(comp).as_deref(), Some("R5"));
        let value = crate::host::probe::component_value(&sheet, comp, &config).map(|(v, _)| v);
        assert_eq!(value.as_deref(), Some("22K"));
    }

    #[test]
    fn test_export_skips_placeholder_labels_and_empty_nets() {
        let mut sheet = MemorySheet::new();
        let net = sheet.add_net(p(0, 0), p(0, 40), Anchors::NONE, WireStyle::Wire).unwrap();
        let seg = sheet.segments(net)[0];
        sheet.add_label(net, seg, "$1N2", p(0, 20)).unwrap();
        sheet
            .add_symbol_instance(&SymbolRef::new("Discrete", "CAP.1"), p(200, 0))
            .unwrap();

        let nets = export_nets(&sheet, &SyncConfig::default());
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].segments, vec![Span::new(p(0, 0), p(0, 40))]);
        assert!(nets[0].labels.is_empty());
        assert_eq!(export_components(&sheet).len(), 1);
    }

    #[test]
    fn test_import_net_label_lands_on_matching_segment() {
        let record = NetRecord {
            segments: vec![Span::new(p(0, 0), p(0, 60)), Span::new(p(0, 60), p(90, 60))],
            labels: vec![LabelRecord {
                name: "MISO".to_string(),
                x: 45,
                y: 60,
                seg_x1: 90,
                seg_y1: 60,
                seg_x2: 0,
                seg_y2: 60,
                orientation: None,
                size: None,
            }],
            attributes: Vec::new(),
        };
        let mut sheet = MemorySheet::new();
        let summary = import_nets(&mut sheet, &[record.clone(), record], &SyncConfig::default());
        assert_eq!(summary.nets, 2);
        // second row rebuilds the same wires and finds the label present
        assert_eq!(summary.labels, 1);
        let net = sheet.nets()[0];
        assert_eq!(sheet.net_name(net), "MISO");
        assert!(summary.diagnostics.is_empty());
    }

    #[test]
    fn test_half_drawn_span_is_reported() {
        let record = NetRecord {
            segments: vec![Span::new(p(0, 0), p(40, 60))],
            labels: Vec::new(),
            attributes: Vec::new(),
        };
        let mut sheet = MemorySheet::new();
        sheet.rejected_wires.push(Span::new(p(0, 60), p(40, 60)));
        let summary = import_nets(&mut sheet, &[record], &SyncConfig::default());

        // the vertical leg still stands as a net
        assert_eq!(summary.nets, 1);
        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(summary.diagnostics[0].kind, crate::diagnostics::DiagnosticKind::CreationFailure);
        assert_eq!(summary.diagnostics[0].subject, "net row 1");
        assert_eq!(sheet.nets().len(), 1);
    }
}
