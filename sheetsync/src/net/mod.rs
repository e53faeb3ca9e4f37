//! Net topology: routing, label placement, extraction and segment matching.

pub mod extract;
pub mod matcher;
pub mod resolver;
pub mod router;

pub use extract::{NetLabel, NetTopology, TopologyExtractor};
pub use matcher::{match_segment, MatchOptions, MatchTier, SegmentMatch};
pub use resolver::{LabelOutcome, LabelRequest, LabelResolver, LabelSpec, PlacementTier, ResolveError};
pub use router::{plan_route, Leg, Route, RouteError, RouteKind, SegmentRouter};

use crate::config::SyncConfig;
use crate::geometry::Span;
use crate::host::{LabelId, NetId, SchematicSheet, SegmentId};

/// Meaningful text of a label: its own text, or the name the host resolves
/// through it when the text is blank or a placeholder.
pub fn label_name<S: SchematicSheet + ?Sized>(sheet: &S, label: LabelId, config: &SyncConfig) -> Option<String> {
    let own = sheet.label_text(label).unwrap_or_default();
    config.meaningful_name(&own).or_else(|| {
        sheet
            .label_resolved_name(label)
            .and_then(|resolved| config.meaningful_name(&resolved))
    })
}

/// Name the host reports for the net, if it is a real one.
pub fn net_name<S: SchematicSheet + ?Sized>(sheet: &S, net: NetId, config: &SyncConfig) -> Option<String> {
    sheet.segments(net).into_iter().find_map(|seg| {
        sheet
            .connected_net_name(net, seg)
            .and_then(|name| config.meaningful_name(&name))
    })
}

/// True when any segment of the net carries a label reading `name`, either
/// directly or through the connected-label lookup.
pub fn net_has_label<S: SchematicSheet + ?Sized>(sheet: &S, net: NetId, name: &str, config: &SyncConfig) -> bool {
    let name = name.trim();
    sheet.segments(net).into_iter().any(|seg| {
        sheet
            .label(net, seg)
            .or_else(|| sheet.connected_label(net, seg))
            .and_then(|label| label_name(sheet, label, config))
            .is_some_and(|text| text == name)
    })
}

/// Segments of the net paired with their spans, skipping any the host
/// cannot locate.
pub fn segment_spans<S: SchematicSheet + ?Sized>(sheet: &S, net: NetId) -> Vec<(SegmentId, Span)> {
    sheet
        .segments(net)
        .into_iter()
        .filter_map(|seg| sheet.segment_span(seg).map(|span| (seg, span)))
        .collect()
}
