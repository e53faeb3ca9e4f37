//! In-memory Host
//!
//! A deterministic stand-in for the live schematic tool. It reproduces the
//! host behaviour the crate depends on:
//! - segments keep the endpoint order they were drawn with
//! - a wire touching another net (endpoint or T-junction) or an anchored
//!   pin joins that net, merging nets when it touches several
//! - unnamed nets resolve to `$`-prefixed placeholder names
//! - new labels start hidden; with strict placement a label dropped off its
//!   wire exists but does not name the net
//!
//! Knobs on [`MemorySheet`] inject creation failures and restrict the
//! attribute property surface so fallback paths can be exercised.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{
    Anchors, AttributeId, ComponentId, HostError, HostSession, LabelId, NetId, NewAttribute, Owner,
    PinId, PropertyValue, SchematicSheet, SegmentId, SymbolRef, WireStyle,
};
use crate::geometry::{point_on_segment, Point, Span};

/// Default text size for new labels and attributes
const DEFAULT_TEXT_SIZE: i32 = 10;

/// Symbol definition: pin offsets and body extent relative to the origin
#[derive(Debug, Clone)]
pub struct SymbolDef {
    pub pins: Vec<(String, Point)>,
    pub bbox: (Point, Point),
    /// (name, value, visible)
    pub attributes: Vec<(String, String, bool)>,
}

/// Symbols the in-memory host can place
#[derive(Debug, Clone)]
pub struct SymbolLibrary {
    symbols: HashMap<SymbolRef, SymbolDef>,
}

impl SymbolLibrary {
    pub fn empty() -> Self {
        Self {
            symbols: HashMap::new(),
        }
    }

    pub fn register(&mut self, symbol: SymbolRef, def: SymbolDef) {
        self.symbols.insert(symbol, def);
    }

    pub fn get(&self, symbol: &SymbolRef) -> Option<&SymbolDef> {
        self.symbols.get(symbol)
    }
}

impl Default for SymbolLibrary {
    /// Two-pin vertical passives, 100 units tall, pin 1 on top.
    fn default() -> Self {
        let mut library = Self::empty();
        for (symbol, value, device) in [("RES.1", "10K", "RES"), ("CAP.1", "100nF", "CAP")] {
            library.register(
                SymbolRef::new("Discrete", symbol),
                SymbolDef {
                    pins: vec![
                        ("1".to_string(), Point::new(0, 100)),
                        ("2".to_string(), Point::new(0, 0)),
                    ],
                    bbox: (Point::new(-10, 0), Point::new(10, 100)),
                    attributes: vec![
                        ("Value".to_string(), value.to_string(), true),
                        ("DEVICE".to_string(), device.to_string(), true),
                    ],
                },
            );
        }
        library
    }
}

#[derive(Debug, Clone)]
struct ComponentRec {
    id: ComponentId,
    symbol: SymbolRef,
    location: Point,
    refdes: String,
    orientation: i32,
    scale: f64,
    bbox: (Point, Point),
    pins: Vec<PinId>,
}

#[derive(Debug, Clone)]
struct PinRec {
    number: String,
    location: Point,
    net: Option<NetId>,
}

#[derive(Debug, Clone)]
struct NetRec {
    id: NetId,
    segments: Vec<SegmentId>,
}

#[derive(Debug, Clone)]
struct SegmentRec {
    net: NetId,
    span: Span,
}

#[derive(Debug, Clone)]
struct LabelRec {
    id: LabelId,
    net: NetId,
    segment: SegmentId,
    text: String,
    location: Point,
    visible: bool,
    orientation: i32,
    size: i32,
}

#[derive(Debug, Clone)]
struct AttributeRec {
    id: AttributeId,
    owner: Owner,
    name: String,
    value: String,
    flags: BTreeMap<String, PropertyValue>,
    origin: Point,
}

const VALUE_PROPERTIES: &[&str] = &["Value", "EitherValue", "InstanceValue"];
const FLAG_PROPERTIES: &[&str] = &["Visible", "NameVisible", "ValueVisible", "Orientation", "Size"];

/// One sheet of the in-memory host
#[derive(Debug, Clone)]
pub struct MemorySheet {
    library: SymbolLibrary,
    components: Vec<ComponentRec>,
    pins: BTreeMap<PinId, PinRec>,
    nets: Vec<NetRec>,
    segments: BTreeMap<SegmentId, SegmentRec>,
    labels: Vec<LabelRec>,
    attributes: Vec<AttributeRec>,
    next_id: u32,

    /// Labels placed off their wire do not name the net
    pub strict_label_placement: bool,
    /// When false, per-segment label lookup reports nothing (host merged
    /// the segments) and only the connected-label lookup works
    pub direct_label_lookup: bool,
    /// Number of upcoming `add_net` calls that fail
    pub failing_net_creations: usize,
    /// Number of upcoming `add_label` calls that fail
    pub failing_label_creations: usize,
    /// Wires that `add_net` always rejects, in either direction
    pub rejected_wires: Vec<Span>,
    /// Attribute properties whose reads fail
    pub unreadable_properties: HashSet<String>,
    /// Attribute properties whose writes fail
    pub read_only_properties: HashSet<String>,
    /// Log of every `add_net` request, including failed ones
    pub net_requests: Vec<(Point, Point, Anchors, WireStyle)>,
}

impl Default for MemorySheet {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::with_library(SymbolLibrary::default())
    }

    pub fn with_library(library: SymbolLibrary) -> Self {
        Self {
            library,
            components: Vec::new(),
            pins: BTreeMap::new(),
            nets: Vec::new(),
            segments: BTreeMap::new(),
            labels: Vec::new(),
            attributes: Vec::new(),
            next_id: 1,
            strict_label_placement: true,
            direct_label_lookup: true,
            failing_net_creations: 0,
            failing_label_creations: 0,
            rejected_wires: Vec::new(),
            unreadable_properties: HashSet::new(),
            read_only_properties: HashSet::new(),
            net_requests: Vec::new(),
        }
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Name the host reports for a net: the first naming label, else a
    /// placeholder.
    pub fn net_name(&self, net: NetId) -> String {
        let Some(rec) = self.net(net) else {
            return String::new();
        };
        for seg in &rec.segments {
            let named = self.labels.iter().find(|l| {
                l.net == net && l.segment == *seg && !l.text.trim().is_empty() && self.label_names_net(l)
            });
            if let Some(label) = named {
                return label.text.trim().to_string();
            }
        }
        format!("$1N{}", net.0)
    }

    /// Labels currently present on the net, hidden ones included
    pub fn labels_on_net(&self, net: NetId) -> Vec<LabelId> {
        self.labels.iter().filter(|l| l.net == net).map(|l| l.id).collect()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    fn label_names_net(&self, label: &LabelRec) -> bool {
        if !self.strict_label_placement {
            return true;
        }
        self.segments
            .get(&label.segment)
            .map(|seg| point_on_segment(label.location, &seg.span, 1))
            .unwrap_or(false)
    }

    fn net(&self, id: NetId) -> Option<&NetRec> {
        self.nets.iter().find(|n| n.id == id)
    }

    fn component(&self, id: ComponentId) -> Option<&ComponentRec> {
        self.components.iter().find(|c| c.id == id)
    }

    fn component_mut(&mut self, id: ComponentId) -> Result<&mut ComponentRec, HostError> {
        self.components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| HostError::NotFound(id.to_string()))
    }

    fn label_rec(&self, id: LabelId) -> Option<&LabelRec> {
        self.labels.iter().find(|l| l.id == id)
    }

    fn label_mut(&mut self, id: LabelId) -> Result<&mut LabelRec, HostError> {
        self.labels
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| HostError::NotFound(format!("label#{}", id.0)))
    }

    fn attribute(&self, id: AttributeId) -> Option<&AttributeRec> {
        self.attributes.iter().find(|a| a.id == id)
    }

    fn attribute_mut(&mut self, id: AttributeId) -> Result<&mut AttributeRec, HostError> {
        self.attributes
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| HostError::NotFound(format!("attribute#{}", id.0)))
    }

    fn owner_exists(&self, owner: Owner) -> bool {
        match owner {
            Owner::Component(id) => self.component(id).is_some(),
            Owner::Net(id) => self.net(id).is_some(),
        }
    }

    fn new_attribute(&mut self, owner: Owner, name: &str, value: &str, visible: bool) -> AttributeId {
        let id = AttributeId(self.alloc());
        let mut flags = BTreeMap::new();
        flags.insert("Visible".to_string(), PropertyValue::Bool(visible));
        flags.insert("NameVisible".to_string(), PropertyValue::Bool(true));
        flags.insert("ValueVisible".to_string(), PropertyValue::Bool(true));
        flags.insert("Orientation".to_string(), PropertyValue::Int(0));
        flags.insert("Size".to_string(), PropertyValue::Int(i64::from(DEFAULT_TEXT_SIZE)));
        self.attributes.push(AttributeRec {
            id,
            owner,
            name: name.to_string(),
            value: value.to_string(),
            flags,
            origin: Point::default(),
        });
        id
    }

    /// Nets a new wire from `from` to `to` touches, in net order
    fn touching_nets(&self, from: Point, to: Point) -> Vec<NetId> {
        self.nets
            .iter()
            .filter(|net| {
                net.segments.iter().any(|seg| {
                    self.segments.get(seg).is_some_and(|rec| {
                        point_on_segment(from, &rec.span, 0) || point_on_segment(to, &rec.span, 0)
                    })
                })
            })
            .map(|net| net.id)
            .collect()
    }

    /// Fold `absorbed` into `target`, carrying segments, labels, pins and
    /// attributes along.
    fn merge_nets(&mut self, target: NetId, absorbed: NetId) {
        if target == absorbed {
            return;
        }
        let Some(pos) = self.nets.iter().position(|n| n.id == absorbed) else {
            return;
        };
        let moved = self.nets.remove(pos);
        for seg in &moved.segments {
            if let Some(rec) = self.segments.get_mut(seg) {
                rec.net = target;
            }
        }
        if let Some(net) = self.nets.iter_mut().find(|n| n.id == target) {
            net.segments.extend(moved.segments);
        }
        for label in self.labels.iter_mut().filter(|l| l.net == absorbed) {
            label.net = target;
        }
        for pin in self.pins.values_mut().filter(|p| p.net == Some(absorbed)) {
            pin.net = Some(target);
        }
        for attr in self.attributes.iter_mut().filter(|a| a.owner == Owner::Net(absorbed)) {
            attr.owner = Owner::Net(target);
        }
    }
}

impl SchematicSheet for MemorySheet {
    fn components(&self) -> Vec<ComponentId> {
        self.components.iter().map(|c| c.id).collect()
    }

    fn nets(&self) -> Vec<NetId> {
        self.nets.iter().map(|n| n.id).collect()
    }

    fn clear(&mut self) {
        self.components.clear();
        self.pins.clear();
        self.nets.clear();
        self.segments.clear();
        self.labels.clear();
        self.attributes.clear();
    }

    fn add_symbol_instance(&mut self, symbol: &SymbolRef, at: Point) -> Result<ComponentId, HostError> {
        let def = self
            .library
            .get(symbol)
            .cloned()
            .ok_or_else(|| HostError::CreationFailed(format!("unknown symbol {}", symbol)))?;
        let id = ComponentId(self.alloc());
        let mut pins = Vec::with_capacity(def.pins.len());
        for (number, offset) in &def.pins {
            let pin = PinId(self.alloc());
            self.pins.insert(
                pin,
                PinRec {
                    number: number.clone(),
                    location: Point::new(at.x.saturating_add(offset.x), at.y.saturating_add(offset.y)),
                    net: None,
                },
            );
            pins.push(pin);
        }
        self.components.push(ComponentRec {
            id,
            symbol: symbol.clone(),
            location: at,
            refdes: String::new(),
            orientation: 0,
            scale: 1.0,
            bbox: (
                Point::new(at.x.saturating_add(def.bbox.0.x), at.y.saturating_add(def.bbox.0.y)),
                Point::new(at.x.saturating_add(def.bbox.1.x), at.y.saturating_add(def.bbox.1.y)),
            ),
            pins,
        });
        for (name, value, visible) in &def.attributes {
            self.new_attribute(Owner::Component(id), name, value, *visible);
        }
        Ok(id)
    }

    fn symbol(&self, component: ComponentId) -> Option<SymbolRef> {
        self.component(component).map(|c| c.symbol.clone())
    }

    fn location(&self, component: ComponentId) -> Option<Point> {
        self.component(component).map(|c| c.location)
    }

    fn refdes(&self, component: ComponentId) -> Option<String> {
        self.component(component).map(|c| c.refdes.clone())
    }

    fn set_refdes(&mut self, component: ComponentId, refdes: &str) -> Result<(), HostError> {
        self.component_mut(component)?.refdes = refdes.to_string();
        Ok(())
    }

    fn orientation(&self, component: ComponentId) -> Option<i32> {
        self.component(component).map(|c| c.orientation)
    }

    fn set_orientation(&mut self, component: ComponentId, orientation: i32) -> Result<(), HostError> {
        self.component_mut(component)?.orientation = orientation;
        Ok(())
    }

    fn scale(&self, component: ComponentId) -> Option<f64> {
        self.component(component).map(|c| c.scale)
    }

    fn set_scale(&mut self, component: ComponentId, scale: f64) -> Result<(), HostError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(HostError::AttributeAccess(format!("invalid scale {}", scale)));
        }
        self.component_mut(component)?.scale = scale;
        Ok(())
    }

    fn bbox(&self, component: ComponentId) -> Option<(Point, Point)> {
        self.component(component).map(|c| c.bbox)
    }

    fn pins(&self, component: ComponentId) -> Vec<PinId> {
        self.component(component).map(|c| c.pins.clone()).unwrap_or_default()
    }

    fn pin_number(&self, pin: PinId) -> Option<String> {
        self.pins.get(&pin).map(|p| p.number.clone())
    }

    fn pin_location(&self, pin: PinId) -> Option<Point> {
        self.pins.get(&pin).map(|p| p.location)
    }

    fn pin_net(&self, pin: PinId) -> Option<NetId> {
        self.pins.get(&pin).and_then(|p| p.net)
    }

    fn add_net(&mut self, from: Point, to: Point, anchors: Anchors, style: WireStyle) -> Result<NetId, HostError> {
        self.net_requests.push((from, to, anchors, style));
        if self.failing_net_creations > 0 {
            self.failing_net_creations -= 1;
            return Err(HostError::CreationFailed(format!("wire {} -> {} rejected", from, to)));
        }
        if from == to {
            return Err(HostError::CreationFailed(format!("zero-length wire at {}", from)));
        }
        let key = Span::new(from, to).key();
        if self.rejected_wires.iter().any(|s| s.key() == key) {
            return Err(HostError::CreationFailed(format!("wire {} -> {} rejected", from, to)));
        }

        let mut touching = self.touching_nets(from, to);
        for pin in [anchors.from, anchors.to].into_iter().flatten() {
            if let Some(net) = self.pin_net(pin) {
                if !touching.contains(&net) {
                    touching.push(net);
                }
            }
        }

        let target = match touching.first() {
            Some(&net) => net,
            None => {
                let id = NetId(self.alloc());
                self.nets.push(NetRec {
                    id,
                    segments: Vec::new(),
                });
                id
            }
        };
        for &other in touching.iter().skip(1) {
            self.merge_nets(target, other);
        }

        let seg = SegmentId(self.alloc());
        self.segments.insert(
            seg,
            SegmentRec {
                net: target,
                span: Span::new(from, to),
            },
        );
        if let Some(net) = self.nets.iter_mut().find(|n| n.id == target) {
            net.segments.push(seg);
        }

        let anchored: Vec<PinId> = [anchors.from, anchors.to].into_iter().flatten().collect();
        for (id, pin) in self.pins.iter_mut() {
            if anchored.contains(id) || pin.location == from || pin.location == to {
                pin.net = Some(target);
            }
        }
        Ok(target)
    }

    fn segments(&self, net: NetId) -> Vec<SegmentId> {
        self.net(net).map(|n| n.segments.clone()).unwrap_or_default()
    }

    fn segment_span(&self, segment: SegmentId) -> Option<Span> {
        self.segments.get(&segment).map(|s| s.span)
    }

    fn label(&self, net: NetId, segment: SegmentId) -> Option<LabelId> {
        if !self.direct_label_lookup {
            return None;
        }
        self.labels
            .iter()
            .find(|l| l.net == net && l.segment == segment)
            .map(|l| l.id)
    }

    fn connected_label(&self, net: NetId, segment: SegmentId) -> Option<LabelId> {
        if self.segments.get(&segment).map(|s| s.net) != Some(net) {
            return None;
        }
        self.labels
            .iter()
            .find(|l| l.net == net && l.segment == segment)
            .or_else(|| self.labels.iter().find(|l| l.net == net))
            .map(|l| l.id)
    }

    fn connected_net_name(&self, net: NetId, segment: SegmentId) -> Option<String> {
        if self.segments.get(&segment).map(|s| s.net) != Some(net) {
            return None;
        }
        Some(self.net_name(net))
    }

    fn add_label(&mut self, net: NetId, segment: SegmentId, text: &str, at: Point) -> Result<LabelId, HostError> {
        if self.failing_label_creations > 0 {
            self.failing_label_creations -= 1;
            return Err(HostError::CreationFailed(format!("label '{}' rejected", text)));
        }
        if self.segments.get(&segment).map(|s| s.net) != Some(net) {
            return Err(HostError::NotFound(format!("segment#{} on {}", segment.0, net)));
        }
        let id = LabelId(self.alloc());
        self.labels.push(LabelRec {
            id,
            net,
            segment,
            text: text.to_string(),
            location: at,
            visible: false,
            orientation: 0,
            size: DEFAULT_TEXT_SIZE,
        });
        Ok(id)
    }

    fn remove_label(&mut self, label: LabelId) -> Result<(), HostError> {
        let pos = self
            .labels
            .iter()
            .position(|l| l.id == label)
            .ok_or_else(|| HostError::NotFound(format!("label#{}", label.0)))?;
        self.labels.remove(pos);
        Ok(())
    }

    fn label_text(&self, label: LabelId) -> Option<String> {
        self.label_rec(label).map(|l| l.text.clone())
    }

    fn label_resolved_name(&self, label: LabelId) -> Option<String> {
        self.label_rec(label).map(|l| self.net_name(l.net))
    }

    fn label_location(&self, label: LabelId) -> Option<Point> {
        self.label_rec(label).map(|l| l.location)
    }

    fn label_visible(&self, label: LabelId) -> Option<bool> {
        self.label_rec(label).map(|l| l.visible)
    }

    fn label_orientation(&self, label: LabelId) -> Option<i32> {
        self.label_rec(label).map(|l| l.orientation)
    }

    fn label_size(&self, label: LabelId) -> Option<i32> {
        self.label_rec(label).map(|l| l.size)
    }

    fn set_label_text(&mut self, label: LabelId, text: &str) -> Result<(), HostError> {
        self.label_mut(label)?.text = text.to_string();
        Ok(())
    }

    fn set_label_location(&mut self, label: LabelId, at: Point) -> Result<(), HostError> {
        self.label_mut(label)?.location = at;
        Ok(())
    }

    fn set_label_visible(&mut self, label: LabelId, visible: bool) -> Result<(), HostError> {
        self.label_mut(label)?.visible = visible;
        Ok(())
    }

    fn set_label_orientation(&mut self, label: LabelId, orientation: i32) -> Result<(), HostError> {
        self.label_mut(label)?.orientation = orientation;
        Ok(())
    }

    fn set_label_size(&mut self, label: LabelId, size: i32) -> Result<(), HostError> {
        if size <= 0 {
            return Err(HostError::AttributeAccess(format!("invalid label size {}", size)));
        }
        self.label_mut(label)?.size = size;
        Ok(())
    }

    fn attributes(&self, owner: Owner) -> Vec<AttributeId> {
        self.attributes
            .iter()
            .filter(|a| a.owner == owner)
            .map(|a| a.id)
            .collect()
    }

    fn find_attribute(&self, owner: Owner, name: &str) -> Option<AttributeId> {
        self.attributes
            .iter()
            .find(|a| a.owner == owner && a.name == name)
            .map(|a| a.id)
    }

    fn add_attribute(&mut self, owner: Owner, attribute: &NewAttribute) -> Result<AttributeId, HostError> {
        if !self.owner_exists(owner) {
            return Err(HostError::NotFound(owner.to_string()));
        }
        if attribute.name.trim().is_empty() {
            return Err(HostError::CreationFailed("attribute without name".to_string()));
        }
        let id = self.new_attribute(owner, &attribute.name, &attribute.value, true);
        let rec = self.attribute_mut(id)?;
        rec.flags
            .insert("NameVisible".to_string(), PropertyValue::Bool(attribute.name_visible));
        rec.flags
            .insert("ValueVisible".to_string(), PropertyValue::Bool(attribute.value_visible));
        Ok(id)
    }

    fn delete_attribute(&mut self, attribute: AttributeId) -> Result<(), HostError> {
        let pos = self
            .attributes
            .iter()
            .position(|a| a.id == attribute)
            .ok_or_else(|| HostError::NotFound(format!("attribute#{}", attribute.0)))?;
        self.attributes.remove(pos);
        Ok(())
    }

    fn attribute_name(&self, attribute: AttributeId) -> Option<String> {
        self.attribute(attribute).map(|a| a.name.clone())
    }

    fn attribute_property(&self, attribute: AttributeId, property: &str) -> Result<PropertyValue, HostError> {
        if self.unreadable_properties.contains(property) {
            return Err(HostError::AttributeAccess(format!("{} is not readable", property)));
        }
        let rec = self
            .attribute(attribute)
            .ok_or_else(|| HostError::NotFound(format!("attribute#{}", attribute.0)))?;
        if VALUE_PROPERTIES.contains(&property) {
            return Ok(PropertyValue::Text(rec.value.clone()));
        }
        match property {
            "Name" => Ok(PropertyValue::Text(rec.name.clone())),
            "TextString" => Ok(PropertyValue::Text(format!("{}={}", rec.name, rec.value))),
            _ => rec
                .flags
                .get(property)
                .cloned()
                .ok_or_else(|| HostError::AttributeAccess(format!("no property {}", property))),
        }
    }

    fn set_attribute_property(
        &mut self,
        attribute: AttributeId,
        property: &str,
        value: PropertyValue,
    ) -> Result<(), HostError> {
        if self.read_only_properties.contains(property) {
            return Err(HostError::AttributeAccess(format!("{} is read-only", property)));
        }
        let rec = self.attribute_mut(attribute)?;
        if VALUE_PROPERTIES.contains(&property) {
            rec.value = value.as_text();
            return Ok(());
        }
        match property {
            "TextString" => {
                let text = value.as_text();
                rec.value = match text.split_once('=') {
                    Some((_, v)) => v.trim().to_string(),
                    None => text.trim().to_string(),
                };
                Ok(())
            }
            p if FLAG_PROPERTIES.contains(&p) => {
                rec.flags.insert(p.to_string(), value);
                Ok(())
            }
            _ => Err(HostError::AttributeAccess(format!("no property {}", property))),
        }
    }

    fn attribute_origin(&self, attribute: AttributeId) -> Option<Point> {
        self.attribute(attribute).map(|a| a.origin)
    }

    fn set_attribute_origin(&mut self, attribute: AttributeId, at: Point) -> Result<(), HostError> {
        self.attribute_mut(attribute)?.origin = at;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct MemorySchematic {
    name: String,
    sheets: Vec<(String, MemorySheet)>,
}

/// In-memory application: schematics holding named sheets, one of them
/// active.
#[derive(Debug, Clone)]
pub struct MemorySession {
    library: SymbolLibrary,
    schematics: Vec<MemorySchematic>,
    active: Option<(String, String)>,
    redraw: bool,
    redraw_toggles: usize,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    /// Session without any schematic or active view
    pub fn new() -> Self {
        Self {
            library: SymbolLibrary::default(),
            schematics: Vec::new(),
            active: None,
            redraw: true,
            redraw_toggles: 0,
        }
    }

    /// Session with one schematic holding one empty sheet, shown in the
    /// active view
    pub fn with_blank_sheet(schematic: &str, sheet: &str) -> Self {
        let mut session = Self::new();
        session.add_schematic(schematic);
        // Freshly added schematic, insertion cannot collide
        let _ = session.insert_sheet(schematic, sheet);
        session.activate(schematic, sheet);
        session
    }

    pub fn add_schematic(&mut self, name: &str) {
        if !self.schematics.iter().any(|s| s.name == name) {
            self.schematics.push(MemorySchematic {
                name: name.to_string(),
                sheets: Vec::new(),
            });
        }
    }

    pub fn activate(&mut self, schematic: &str, sheet: &str) -> bool {
        if self.sheet(schematic, sheet).is_some() {
            self.active = Some((schematic.to_string(), sheet.to_string()));
            true
        } else {
            false
        }
    }

    pub fn redraw_enabled(&self) -> bool {
        self.redraw
    }

    pub fn redraw_toggles(&self) -> usize {
        self.redraw_toggles
    }

    fn schematic(&self, name: &str) -> Option<&MemorySchematic> {
        self.schematics.iter().find(|s| s.name == name)
    }

    fn schematic_mut(&mut self, name: &str) -> Option<&mut MemorySchematic> {
        self.schematics.iter_mut().find(|s| s.name == name)
    }
}

impl HostSession for MemorySession {
    type Sheet = MemorySheet;

    fn schematics(&self) -> Result<Vec<String>, HostError> {
        Ok(self.schematics.iter().map(|s| s.name.clone()).collect())
    }

    fn sheets(&self, schematic: &str) -> Result<Vec<String>, HostError> {
        self.schematic(schematic)
            .map(|s| s.sheets.iter().map(|(name, _)| name.clone()).collect())
            .ok_or_else(|| HostError::NotFound(format!("schematic {}", schematic)))
    }

    fn insert_sheet(&mut self, schematic: &str, sheet: &str) -> Result<(), HostError> {
        let library = self.library.clone();
        let schem = self
            .schematic_mut(schematic)
            .ok_or_else(|| HostError::NotFound(format!("schematic {}", schematic)))?;
        if schem.sheets.iter().any(|(name, _)| name == sheet) {
            return Err(HostError::CreationFailed(format!("sheet {} already exists", sheet)));
        }
        schem.sheets.push((sheet.to_string(), MemorySheet::with_library(library)));
        Ok(())
    }

    fn delete_sheet(&mut self, schematic: &str, sheet: &str) -> Result<(), HostError> {
        let schem = self
            .schematic_mut(schematic)
            .ok_or_else(|| HostError::NotFound(format!("schematic {}", schematic)))?;
        let pos = schem
            .sheets
            .iter()
            .position(|(name, _)| name == sheet)
            .ok_or_else(|| HostError::NotFound(format!("sheet {}", sheet)))?;
        schem.sheets.remove(pos);
        if self.active.as_ref() == Some(&(schematic.to_string(), sheet.to_string())) {
            self.active = None;
        }
        Ok(())
    }

    fn sheet(&self, schematic: &str, sheet: &str) -> Option<&MemorySheet> {
        self.schematic(schematic)?
            .sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, s)| s)
    }

    fn sheet_mut(&mut self, schematic: &str, sheet: &str) -> Option<&mut MemorySheet> {
        self.schematic_mut(schematic)?
            .sheets
            .iter_mut()
            .find(|(name, _)| name == sheet)
            .map(|(_, s)| s)
    }

    fn active_sheet_mut(&mut self) -> Result<&mut MemorySheet, HostError> {
        let (schematic, sheet) = self
            .active
            .clone()
            .ok_or_else(|| HostError::Unavailable("no active schematic view".to_string()))?;
        self.sheet_mut(&schematic, &sheet)
            .ok_or_else(|| HostError::Unavailable(format!("active sheet {}:{} is gone", schematic, sheet)))
    }

    fn set_redraw(&mut self, enabled: bool) {
        self.redraw = enabled;
        self.redraw_toggles += 1;
    }
}
