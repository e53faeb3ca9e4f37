//! Topology Extractor
//!
//! Reads back what must survive a copy: every segment span of a net in host
//! order, and each real label with the span it sits on.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{label_name, segment_spans};
use crate::config::SyncConfig;
use crate::geometry::{point_on_segment, Point, Span};
use crate::host::{LabelId, NetId, SchematicSheet};

/// A label as recorded for reconstruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetLabel {
    pub text: String,
    pub position: Point,
    /// Span of the segment the label was attached to
    pub segment: Span,
    pub orientation: Option<i32>,
    pub size: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetTopology {
    pub net: NetId,
    pub segments: Vec<Span>,
    pub labels: Vec<NetLabel>,
}

pub struct TopologyExtractor<'a> {
    config: &'a SyncConfig,
}

impl<'a> TopologyExtractor<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    pub fn extract<S: SchematicSheet + ?Sized>(&self, sheet: &S, net: NetId) -> NetTopology {
        let spans = segment_spans(sheet, net);
        let mut seen = HashSet::new();
        let mut labels = Vec::new();

        for &(seg, span) in &spans {
            if let Some(label) = sheet.label(net, seg) {
                self.record(sheet, label, span, false, &mut seen, &mut labels);
            }
        }

        // Hosts that merged segments expose labels only through the
        // connected lookup; those must sit on the span to be attributed.
        if labels.is_empty() {
            for &(seg, span) in &spans {
                if let Some(label) = sheet.connected_label(net, seg) {
                    self.record(sheet, label, span, true, &mut seen, &mut labels);
                }
            }
            if !labels.is_empty() {
                debug!("{}: {} label(s) found through connected lookup", net, labels.len());
            }
        }

        NetTopology {
            net,
            segments: spans.into_iter().map(|(_, span)| span).collect(),
            labels,
        }
    }

    fn record<S: SchematicSheet + ?Sized>(
        &self,
        sheet: &S,
        label: LabelId,
        span: Span,
        require_on_span: bool,
        seen: &mut HashSet<(String, Point)>,
        labels: &mut Vec<NetLabel>,
    ) {
        let Some(text) = label_name(sheet, label, self.config) else {
            return;
        };
        let Some(position) = sheet.label_location(label) else {
            return;
        };
        if require_on_span && !point_on_segment(position, &span, self.config.tolerance) {
            return;
        }
        if !seen.insert((text.clone(), position)) {
            return;
        }
        labels.push(NetLabel {
            text,
            position,
            segment: span,
            orientation: sheet.label_orientation(label),
            size: sheet.label_size(label),
        });
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

    fn elbow_net(sheet: &mut MemorySheet) -> NetId {
        sheet.add_net(p(0, 0), p(0, 50), Anchors::NONE, WireStyle::Wire).unwrap();
        sheet.add_net(p(0, 50), p(70, 50), Anchors::NONE, WireStyle::Wire).unwrap()
    }

    #[test]
    fn test_extracts_spans_in_order_and_labels() {
        let mut sheet = MemorySheet::new();
        let net = elbow_net(&mut sheet);
        let segs = sheet.segments(net);
        sheet.add_label(net, segs[1], "CLK", p(35, 50)).unwrap();

        let config = SyncConfig::default();
        let topo = TopologyExtractor::new(&config).extract(&sheet, net);
        assert_eq!(topo.segments, vec![Span::new(p(0, 0), p(0, 50)), Span::new(p(0, 50), p(70, 50))]);
        assert_eq!(topo.labels.len(), 1);
        assert_eq!(topo.labels[0].text, "CLK");
        assert_eq!(topo.labels[0].segment, Span::new(p(0, 50), p(70, 50)));
    }

    #[test]
    fn test_placeholder_labels_are_skipped() {
        let mut sheet = MemorySheet::new();
        let net = elbow_net(&mut sheet);
        let seg = sheet.segments(net)[0];
        sheet.add_label(net, seg, "$1N4", p(0, 20)).unwrap();

        let config = SyncConfig::default();
        assert!(TopologyExtractor::new(&config).extract(&sheet, net).labels.is_empty());
    }

    #[test]
    fn test_connected_lookup_checks_position() {
        let mut sheet = MemorySheet::new();
        let net = elbow_net(&mut sheet);
        let segs = sheet.segments(net);
        sheet.add_label(net, segs[0], "RST", p(0, 25)).unwrap();
        sheet.direct_label_lookup = false;

        let config = SyncConfig::default();
        let topo = TopologyExtractor::new(&config).extract(&sheet, net);
        // Both segments see the label through the connected lookup, but it
        // only lies on the vertical one.
        assert_eq!(topo.labels.len(), 1);
        assert_eq!(topo.labels[0].segment, Span::new(p(0, 0), p(0, 50)));
    }
}
