//! Host Object Model
//!
//! The schematic tool is driven through its live object model. This module
//! describes the slice of that model the crate relies on as two traits:
//! [`HostSession`] (the application: schematics, sheets, redraw) and
//! [`SchematicSheet`] (one open sheet: components, nets, labels,
//! attributes). Every call is a fallible single shot; nothing here retries.
//!
//! Implementations:
//! - [`memory::MemorySession`] - deterministic in-memory host used by the
//!   CLI, the examples and the tests
//! - COM-backed hosts live outside this crate and implement the same traits

pub mod memory;
pub mod probe;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use thiserror::Error;

use crate::geometry::{Point, Span};

/// Errors reported at the host boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("Host unavailable: {0}")]
    Unavailable(String),

    #[error("Creation failed: {0}")]
    CreationFailed(String),

    #[error("Attribute access failed: {0}")]
    AttributeAccess(String),

    #[error("Object not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeId(pub u32);

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net#{}", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

/// Object that carries attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Component(ComponentId),
    Net(NetId),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Component(id) => id.fmt(f),
            Owner::Net(id) => id.fmt(f),
        }
    }
}

/// Library reference of a placed symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef {
    /// Library partition, e.g. "Discrete"
    pub partition: String,
    /// Short symbol name, e.g. "RES.1"
    pub symbol: String,
}

impl SymbolRef {
    pub fn new(partition: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition, self.symbol)
    }
}

/// Wire style tag passed to net creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireStyle {
    #[default]
    Wire,
    Bus,
}

/// Optional pin references bound to each end of a new segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchors {
    pub from: Option<PinId>,
    pub to: Option<PinId>,
}

impl Anchors {
    pub const NONE: Anchors = Anchors { from: None, to: None };

    pub fn new(from: Option<PinId>, to: Option<PinId>) -> Self {
        Self { from, to }
    }
}

/// Loosely typed property value as exposed by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_text(&self) -> String {
        match self {
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::Text(s) => s.clone(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            PropertyValue::Int(i) => Some(*i != 0),
            PropertyValue::Float(f) => Some(*f != 0.0),
            PropertyValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(true),
                "0" | "false" | "no" => Some(false),
                _ => None,
            },
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Bool(b) => Some(i64::from(*b)),
            PropertyValue::Int(i) => Some(*i),
            PropertyValue::Float(f) => Some(f.trunc() as i64),
            PropertyValue::Text(s) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

/// Arguments of an attribute creation call
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttribute {
    pub name: String,
    pub value: String,
    pub name_visible: bool,
    pub value_visible: bool,
}

/// One open schematic sheet (block plus view).
pub trait SchematicSheet {
    /// Components placed on the sheet, in host order
    fn components(&self) -> Vec<ComponentId>;

    /// Nets on the sheet, in host order
    fn nets(&self) -> Vec<NetId>;

    fn object_count(&self) -> usize {
        self.components().len() + self.nets().len()
    }

    /// Delete every component, net, label and graphic on the sheet
    fn clear(&mut self);

    fn refresh(&mut self) {}

    // Components

    fn add_symbol_instance(&mut self, symbol: &SymbolRef, at: Point) -> Result<ComponentId, HostError>;
    fn symbol(&self, component: ComponentId) -> Option<SymbolRef>;
    fn location(&self, component: ComponentId) -> Option<Point>;
    fn refdes(&self, component: ComponentId) -> Option<String>;
    fn set_refdes(&mut self, component: ComponentId, refdes: &str) -> Result<(), HostError>;
    fn orientation(&self, component: ComponentId) -> Option<i32>;
    fn set_orientation(&mut self, component: ComponentId, orientation: i32) -> Result<(), HostError>;
    fn scale(&self, component: ComponentId) -> Option<f64>;
    fn set_scale(&mut self, component: ComponentId, scale: f64) -> Result<(), HostError>;
    /// Lower-left and upper-right corners
    fn bbox(&self, component: ComponentId) -> Option<(Point, Point)>;
    fn pins(&self, component: ComponentId) -> Vec<PinId>;
    fn pin_number(&self, pin: PinId) -> Option<String>;
    fn pin_location(&self, pin: PinId) -> Option<Point>;
    /// Net currently connected to the pin
    fn pin_net(&self, pin: PinId) -> Option<NetId>;

    // Nets and segments

    /// Draw one straight wire. The returned net is the one the new segment
    /// ended up in, which may be a pre-existing net it touched.
    fn add_net(&mut self, from: Point, to: Point, anchors: Anchors, style: WireStyle) -> Result<NetId, HostError>;
    fn segments(&self, net: NetId) -> Vec<SegmentId>;
    fn segment_span(&self, segment: SegmentId) -> Option<Span>;

    // Labels

    /// Label attached directly to `segment`
    fn label(&self, net: NetId, segment: SegmentId) -> Option<LabelId>;
    /// Any label the host considers connected to `segment`
    fn connected_label(&self, net: NetId, segment: SegmentId) -> Option<LabelId>;
    /// Net name as resolved through `segment` (may be a placeholder)
    fn connected_net_name(&self, net: NetId, segment: SegmentId) -> Option<String>;
    fn add_label(&mut self, net: NetId, segment: SegmentId, text: &str, at: Point) -> Result<LabelId, HostError>;
    fn remove_label(&mut self, label: LabelId) -> Result<(), HostError>;
    fn label_text(&self, label: LabelId) -> Option<String>;
    fn label_resolved_name(&self, label: LabelId) -> Option<String>;
    fn label_location(&self, label: LabelId) -> Option<Point>;
    fn label_visible(&self, label: LabelId) -> Option<bool>;
    fn label_orientation(&self, label: LabelId) -> Option<i32>;
    fn label_size(&self, label: LabelId) -> Option<i32>;
    fn set_label_text(&mut self, label: LabelId, text: &str) -> Result<(), HostError>;
    fn set_label_location(&mut self, label: LabelId, at: Point) -> Result<(), HostError>;
    fn set_label_visible(&mut self, label: LabelId, visible: bool) -> Result<(), HostError>;
    fn set_label_orientation(&mut self, label: LabelId, orientation: i32) -> Result<(), HostError>;
    fn set_label_size(&mut self, label: LabelId, size: i32) -> Result<(), HostError>;

    // Attributes

    fn attributes(&self, owner: Owner) -> Vec<AttributeId>;
    /// Exact-name lookup
    fn find_attribute(&self, owner: Owner, name: &str) -> Option<AttributeId>;
    fn add_attribute(&mut self, owner: Owner, attribute: &NewAttribute) -> Result<AttributeId, HostError>;
    fn delete_attribute(&mut self, attribute: AttributeId) -> Result<(), HostError>;
    fn attribute_name(&self, attribute: AttributeId) -> Option<String>;
    fn attribute_property(&self, attribute: AttributeId, property: &str) -> Result<PropertyValue, HostError>;
    fn set_attribute_property(
        &mut self,
        attribute: AttributeId,
        property: &str,
        value: PropertyValue,
    ) -> Result<(), HostError>;
    fn attribute_origin(&self, attribute: AttributeId) -> Option<Point>;
    fn set_attribute_origin(&mut self, attribute: AttributeId, at: Point) -> Result<(), HostError>;
}

/// The running application.
pub trait HostSession {
    type Sheet: SchematicSheet;

    fn schematics(&self) -> Result<Vec<String>, HostError>;
    fn sheets(&self, schematic: &str) -> Result<Vec<String>, HostError>;
    fn insert_sheet(&mut self, schematic: &str, sheet: &str) -> Result<(), HostError>;
    fn delete_sheet(&mut self, schematic: &str, sheet: &str) -> Result<(), HostError>;
    fn sheet(&self, schematic: &str, sheet: &str) -> Option<&Self::Sheet>;
    fn sheet_mut(&mut self, schematic: &str, sheet: &str) -> Option<&mut Self::Sheet>;
    /// Sheet shown in the active view
    fn active_sheet_mut(&mut self) -> Result<&mut Self::Sheet, HostError>;
    fn set_redraw(&mut self, enabled: bool);
}

/// Redraw stays off while this guard lives and comes back on when it is
/// dropped, whichever way the scope is left.
pub struct RedrawSuspended<'a, S: HostSession> {
    session: &'a mut S,
}

impl<'a, S: HostSession> RedrawSuspended<'a, S> {
    pub fn new(session: &'a mut S) -> Self {
        session.set_redraw(false);
        Self { session }
    }
}

impl<S: HostSession> Deref for RedrawSuspended<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session
    }
}

impl<S: HostSession> DerefMut for RedrawSuspended<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.session
    }
}

impl<S: HostSession> Drop for RedrawSuspended<'_, S> {
    fn drop(&mut self) {
        self.session.set_redraw(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemorySession;

    #[test]
    fn test_redraw_guard_restores_on_drop() {
        let mut session = MemorySession::new();
        {
            let guard = RedrawSuspended::new(&mut session);
            assert!(!guard.redraw_enabled());
        }
        assert!(session.redraw_enabled());
        assert_eq!(session.redraw_toggles(), 2);
    }

    #[test]
    fn test_redraw_guard_restores_on_early_return() {
        fn failing_step(session: &mut MemorySession) -> Result<(), HostError> {
            let _guard = RedrawSuspended::new(session);
            Err(HostError::CreationFailed("boom".to_string()))
        }

        let mut session = MemorySession::new();
        assert!(failing_step(&mut session).is_err());
        assert!(session.redraw_enabled());
    }

    #[test]
    fn test_property_value_conversions() {
        assert_eq!(PropertyValue::from("1").as_bool(), Some(true));
        assert_eq!(PropertyValue::Int(0).as_bool(), Some(false));
        assert_eq!(PropertyValue::Text("90.0".into()).as_int(), Some(90));
        assert_eq!(PropertyValue::Float(2.5).as_text(), "2.5");
        assert_eq!(PropertyValue::Text("maybe".into()).as_bool(), None);
    }
}
