//! Interchange records and their CSV row form.
//!
//! Rows hold raw cell text; structured cells (`Attributes`, `Segments`,
//! `Labels`) carry embedded JSON. Parsing from a row is lenient where the
//! replay tolerates bad data and strict where it cannot proceed.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::InterchangeError;
use crate::geometry::{Point, Span};
use crate::host::{PropertyValue, SymbolRef};
use crate::net::NetLabel;

/// Opaque attribute snapshot, carried verbatim between sheets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub either_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_visible: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_visible: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_y: Option<i32>,
}

impl AttributeRecord {
    /// First non-empty of EitherValue, InstanceValue, Value, then the
    /// text after `=` in TextString.
    pub fn resolved_value(&self) -> Option<String> {
        [&self.either_value, &self.instance_value, &self.value]
            .into_iter()
            .flatten()
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.text_string
                    .as_deref()
                    .and_then(crate::host::probe::value_from_text_string)
            })
    }

    /// Visible, NameVisible, ValueVisible, Orientation, Size
    pub fn flag_properties(&self) -> [Option<&PropertyValue>; 5] {
        [
            self.visible.as_ref(),
            self.name_visible.as_ref(),
            self.value_visible.as_ref(),
            self.orientation.as_ref(),
            self.size.as_ref(),
        ]
    }
}

/// One recorded label: text, position and the span it was attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabelRecord {
    pub name: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub seg_x1: i32,
    #[serde(default)]
    pub seg_y1: i32,
    #[serde(default)]
    pub seg_x2: i32,
    #[serde(default)]
    pub seg_y2: i32,
    #[serde(default)]
    pub orientation: Option<i32>,
    #[serde(default)]
    pub size: Option<i32>,
}

impl LabelRecord {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn segment(&self) -> Span {
        Span::new(Point::new(self.seg_x1, self.seg_y1), Point::new(self.seg_x2, self.seg_y2))
    }
}

impl From<&NetLabel> for LabelRecord {
    fn from(label: &NetLabel) -> Self {
        Self {
            name: label.text.clone(),
            x: label.position.x,
            y: label.position.y,
            seg_x1: label.segment.low.x,
            seg_y1: label.segment.low.y,
            seg_x2: label.segment.high.x,
            seg_y2: label.segment.high.y,
            orientation: label.orientation,
            size: label.size,
        }
    }
}

/// Placement of one component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRecord {
    pub refdes: String,
    pub partition: String,
    pub symbol: String,
    pub location: Point,
    pub orientation: Option<i32>,
    pub scale: Option<f64>,
    pub attributes: Vec<AttributeRecord>,
}

impl ComponentRecord {
    /// Library reference, when both halves are present
    pub fn symbol_ref(&self) -> Option<SymbolRef> {
        if self.partition.trim().is_empty() || self.symbol.trim().is_empty() {
            None
        } else {
            Some(SymbolRef::new(self.partition.trim(), self.symbol.trim()))
        }
    }

    /// `value` attribute (any case) of the record
    pub fn value(&self) -> Option<String> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case("value"))
            .and_then(AttributeRecord::resolved_value)
    }

    pub fn to_row(&self) -> Result<ComponentRow, InterchangeError> {
        Ok(ComponentRow {
            refdes: self.refdes.clone(),
            partition: self.partition.clone(),
            symbol: self.symbol.clone(),
            x: self.location.x.to_string(),
            y: self.location.y.to_string(),
            orientation: self.orientation.map(|o| o.to_string()).unwrap_or_default(),
            scale: self.scale.map(|s| s.to_string()).unwrap_or_default(),
            attributes: serde_json::to_string(&self.attributes)?,
        })
    }

    /// Coordinates that do not parse fall back to the origin; a bad
    /// orientation or scale is left to the host default.
    pub fn from_row(row: &ComponentRow) -> Result<Self, InterchangeError> {
        let location = match (parse_number(&row.x), parse_number(&row.y)) {
            (Some(x), Some(y)) => Point::truncated(x, y),
            _ => Point::default(),
        };
        let attributes = if row.attributes.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&row.attributes)?
        };
        Ok(Self {
            refdes: row.refdes.trim().to_string(),
            partition: row.partition.trim().to_string(),
            symbol: row.symbol.trim().to_string(),
            location,
            orientation: parse_number(&row.orientation).map(|o| o.trunc() as i32),
            scale: parse_number(&row.scale),
            attributes,
        })
    }
}

/// Topology of one net
#[derive(Debug, Clone, PartialEq)]
pub struct NetRecord {
    pub segments: Vec<Span>,
    pub labels: Vec<LabelRecord>,
    pub attributes: Vec<AttributeRecord>,
}

impl NetRecord {
    pub fn to_row(&self) -> Result<NetRow, InterchangeError> {
        let segments: Vec<[i32; 4]> = self
            .segments
            .iter()
            .map(|s| [s.low.x, s.low.y, s.high.x, s.high.y])
            .collect();
        Ok(NetRow {
            segments: serde_json::to_string(&segments)?,
            labels: serde_json::to_string(&self.labels)?,
            attributes: serde_json::to_string(&self.attributes)?,
        })
    }

    /// The segment list must parse; labels and attributes that do not are
    /// dropped so the wires can still be rebuilt.
    pub fn from_row(row: &NetRow) -> Result<Self, InterchangeError> {
        let text = if row.segments.trim().is_empty() { "[]" } else { row.segments.as_str() };
        let raw: Vec<[f64; 4]> = serde_json::from_str(text)?;
        let segments = raw
            .into_iter()
            .map(|[x1, y1, x2, y2]| Span::new(Point::truncated(x1, y1), Point::truncated(x2, y2)))
            .collect();
        Ok(Self {
            segments,
            labels: parse_list("Labels", &row.labels),
            attributes: parse_list("Attributes", &row.attributes),
        })
    }
}

pub const COMPONENT_HEADER: [&str; 8] = [
    "Refdes",
    "Partition",
    "Symbol",
    "X",
    "Y",
    "Orientation",
    "Scale",
    "Attributes",
];

pub const NET_HEADER: [&str; 3] = ["Segments", "Labels", "Attributes"];

/// Raw cells of a components table row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComponentRow {
    #[serde(default)]
    pub refdes: String,
    #[serde(default)]
    pub partition: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub x: String,
    #[serde(default)]
    pub y: String,
    #[serde(default)]
    pub orientation: String,
    #[serde(default)]
    pub scale: String,
    #[serde(default)]
    pub attributes: String,
}

/// Raw cells of a nets table row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetRow {
    #[serde(default)]
    pub segments: String,
    #[serde(default)]
    pub labels: String,
    #[serde(default)]
    pub attributes: String,
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_list<T: serde::de::DeserializeOwned>(column: &str, cell: &str) -> Vec<T> {
    if cell.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(cell) {
        Ok(list) => list,
        Err(e) => {
            warn!("{} cell dropped, not a JSON list: {}", column, e);
            Vec::new()
        }
    }
}
