//! Attribute Capability Probes
//!
//! The host's attribute surface differs between versions: the value may sit
//! behind `EitherValue`, `InstanceValue` or `Value`, and some builds only
//! accept a `Name=value` text string. Each helper here walks an ordered list
//! of accessors and stops at the first one that works, so callers see a
//! single operation instead of a chain of fallbacks.

use tracing::debug;

use super::{AttributeId, ComponentId, HostError, NewAttribute, Owner, PropertyValue, SchematicSheet};
use crate::config::SyncConfig;
use crate::geometry::Point;
use crate::interchange::AttributeRecord;

/// Properties copied verbatim between attributes, besides the value
const COPIED_PROPERTIES: &[&str] = &["Visible", "NameVisible", "ValueVisible", "Orientation", "Size"];

/// Text after the first `=` of a `Name=value` string
pub fn value_from_text_string(text: &str) -> Option<String> {
    text.split_once('=')
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First non-empty value among the configured accessors, then the
/// `TextString` form.
pub fn read_value<S: SchematicSheet + ?Sized>(
    sheet: &S,
    attribute: AttributeId,
    config: &SyncConfig,
) -> Option<String> {
    for accessor in &config.value_accessors {
        if let Ok(value) = sheet.attribute_property(attribute, accessor) {
            let value = value.as_text().trim().to_string();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    sheet
        .attribute_property(attribute, "TextString")
        .ok()
        .and_then(|text| value_from_text_string(&text.as_text()))
}

/// Write through the first accessor that accepts the value, falling back to
/// `TextString = "Name=value"`.
pub fn write_value<S: SchematicSheet + ?Sized>(
    sheet: &mut S,
    attribute: AttributeId,
    value: &str,
    config: &SyncConfig,
) -> Result<(), HostError> {
    for accessor in &config.value_accessors {
        match sheet.set_attribute_property(attribute, accessor, PropertyValue::from(value)) {
            Ok(()) => return Ok(()),
            Err(e) => debug!("Accessor {} rejected write: {}", accessor, e),
        }
    }
    let name = sheet.attribute_name(attribute).unwrap_or_default();
    sheet
        .set_attribute_property(attribute, "TextString", PropertyValue::Text(format!("{}={}", name, value)))
        .map_err(|_| {
            HostError::AttributeAccess(format!("no accessor accepted a value for attribute '{}'", name))
        })
}

/// Exact lookup, then a case-insensitive scan.
pub fn find_attribute<S: SchematicSheet + ?Sized>(sheet: &S, owner: Owner, name: &str) -> Option<AttributeId> {
    sheet
        .find_attribute(owner, name)
        .or_else(|| find_attributes_by_name(sheet, owner, name).into_iter().next())
}

/// Every attribute whose name matches case-insensitively.
pub fn find_attributes_by_name<S: SchematicSheet + ?Sized>(
    sheet: &S,
    owner: Owner,
    name: &str,
) -> Vec<AttributeId> {
    let wanted = name.to_lowercase();
    sheet
        .attributes(owner)
        .into_iter()
        .filter(|&attr| {
            sheet
                .attribute_name(attr)
                .map(|n| n.to_lowercase() == wanted)
                .unwrap_or(false)
        })
        .collect()
}

/// Component value through the configured aliases (`Value`, `VALUE`).
pub fn component_value<S: SchematicSheet + ?Sized>(
    sheet: &S,
    component: ComponentId,
    config: &SyncConfig,
) -> Option<(String, AttributeId)> {
    config.value_attribute_aliases.iter().find_map(|alias| {
        let attr = find_attribute(sheet, Owner::Component(component), alias)?;
        read_value(sheet, attr, config).map(|value| (value, attr))
    })
}

/// Attribute that supplied a value being copied onto another component
#[derive(Debug, Clone, Copy)]
pub struct ValueSource<'a> {
    pub name: &'a str,
    pub visible: Option<&'a PropertyValue>,
}

/// Write `value` to every attribute named like the source (or like one of
/// the value aliases). When the component has none, a `Value` attribute is
/// added.
pub fn set_component_value<S: SchematicSheet + ?Sized>(
    sheet: &mut S,
    component: ComponentId,
    value: &str,
    source: Option<ValueSource<'_>>,
    config: &SyncConfig,
) -> Result<(), HostError> {
    if value.is_empty() {
        return Err(HostError::AttributeAccess("empty component value".to_string()));
    }
    let owner = Owner::Component(component);
    let mut targets = source
        .map(|s| find_attributes_by_name(&*sheet, owner, s.name))
        .unwrap_or_default();
    for alias in &config.value_attribute_aliases {
        if !targets.is_empty() {
            break;
        }
        targets = find_attributes_by_name(&*sheet, owner, alias);
    }

    if targets.is_empty() {
        let attribute = NewAttribute {
            name: "Value".to_string(),
            value: value.to_string(),
            name_visible: true,
            value_visible: true,
        };
        return sheet.add_attribute(owner, &attribute).map(|_| ());
    }

    let mut written = false;
    for attr in targets {
        if write_value(sheet, attr, value, config).is_ok() {
            written = true;
            if let Some(visible) = source.and_then(|s| s.visible) {
                let _ = sheet.set_attribute_property(attr, "Visible", visible.clone());
            }
        }
    }
    if written {
        Ok(())
    } else {
        Err(HostError::AttributeAccess(format!("value '{}' could not be written on {}", value, component)))
    }
}

/// Set a named attribute, adding `name=value` when it is missing or refuses
/// every accessor.
pub fn set_component_attribute<S: SchematicSheet + ?Sized>(
    sheet: &mut S,
    component: ComponentId,
    name: &str,
    value: &str,
    config: &SyncConfig,
) -> Result<(), HostError> {
    let owner = Owner::Component(component);
    if let Some(attr) = sheet.find_attribute(owner, name) {
        if write_value(sheet, attr, value, config).is_ok() {
            return Ok(());
        }
    }
    let attribute = NewAttribute {
        name: name.to_string(),
        value: value.to_string(),
        name_visible: true,
        value_visible: true,
    };
    sheet.add_attribute(owner, &attribute).map(|_| ())
}

/// Leave exactly one `Value` attribute carrying `value`: every case variant
/// is written, then variants not spelled `Value` are deleted (or hidden when
/// the host refuses the delete).
pub fn normalize_value_attribute<S: SchematicSheet + ?Sized>(
    sheet: &mut S,
    component: ComponentId,
    value: &str,
    config: &SyncConfig,
) -> Result<(), HostError> {
    let owner = Owner::Component(component);
    let variants = find_attributes_by_name(&*sheet, owner, "value");
    if variants.is_empty() {
        return set_component_attribute(sheet, component, "Value", value, config);
    }
    for &attr in &variants {
        let _ = write_value(sheet, attr, value, config);
    }
    for attr in variants {
        if sheet.attribute_name(attr).as_deref() == Some("Value") {
            continue;
        }
        if sheet.delete_attribute(attr).is_err() {
            let _ = sheet.set_attribute_property(attr, "Visible", PropertyValue::Bool(false));
        }
    }
    if sheet.find_attribute(owner, "Value").is_none() {
        return set_component_attribute(sheet, component, "Value", value, config);
    }
    Ok(())
}

/// Hide an attribute, optionally only when it holds `required_value`.
/// Returns whether the attribute matched and a hide was attempted.
pub fn hide_attribute<S: SchematicSheet + ?Sized>(
    sheet: &mut S,
    component: ComponentId,
    name: &str,
    required_value: Option<&str>,
    config: &SyncConfig,
) -> bool {
    let Some(attr) = sheet.find_attribute(Owner::Component(component), name) else {
        return false;
    };
    if let Some(required) = required_value {
        if read_value(&*sheet, attr, config).as_deref() != Some(required) {
            return false;
        }
    }
    let hidden = PropertyValue::Bool(false);
    if sheet.set_attribute_property(attr, "Visibility", hidden.clone()).is_err()
        && sheet.set_attribute_property(attr, "Visible", hidden.clone()).is_err()
    {
        let _ = sheet.set_attribute_property(attr, "NameVisible", hidden.clone());
        let _ = sheet.set_attribute_property(attr, "ValueVisible", hidden);
    }
    true
}

/// Snapshot of one attribute as carried by interchange records
pub fn attribute_record<S: SchematicSheet + ?Sized>(sheet: &S, attribute: AttributeId) -> AttributeRecord {
    let text = |prop: &str| sheet.attribute_property(attribute, prop).ok().map(|v| v.as_text());
    let raw = |prop: &str| sheet.attribute_property(attribute, prop).ok();
    let origin = sheet.attribute_origin(attribute);
    AttributeRecord {
        name: sheet.attribute_name(attribute).unwrap_or_default(),
        value: text("Value"),
        either_value: text("EitherValue"),
        instance_value: text("InstanceValue"),
        text_string: text("TextString"),
        visible: raw("Visible"),
        name_visible: raw("NameVisible"),
        value_visible: raw("ValueVisible"),
        orientation: raw("Orientation"),
        size: raw("Size"),
        origin_x: origin.map(|p| p.x),
        origin_y: origin.map(|p| p.y),
    }
}

/// Every named attribute of `owner`
pub fn collect_attributes<S: SchematicSheet + ?Sized>(sheet: &S, owner: Owner) -> Vec<AttributeRecord> {
    sheet
        .attributes(owner)
        .into_iter()
        .map(|attr| attribute_record(sheet, attr))
        .filter(|record| !record.name.is_empty())
        .collect()
}

/// Recreate `records` on `owner`. Missing attributes are added first; a
/// property the host refuses is skipped. Returns the names of attributes
/// that could be neither found nor created.
pub fn apply_attributes<S: SchematicSheet + ?Sized>(
    sheet: &mut S,
    owner: Owner,
    records: &[AttributeRecord],
    config: &SyncConfig,
) -> Vec<String> {
    let mut dropped = Vec::new();
    for record in records {
        let name = record.name.trim();
        if name.is_empty() {
            continue;
        }
        let value = record.resolved_value().unwrap_or_default();
        let attr = match find_attribute(&*sheet, owner, name) {
            Some(attr) => attr,
            None => {
                let attribute = NewAttribute {
                    name: name.to_string(),
                    value: value.clone(),
                    name_visible: record.name_visible.as_ref().and_then(|v| v.as_bool()).unwrap_or(true),
                    value_visible: record.value_visible.as_ref().and_then(|v| v.as_bool()).unwrap_or(true),
                };
                match sheet.add_attribute(owner, &attribute) {
                    Ok(attr) => attr,
                    Err(e) => {
                        debug!("Attribute {} dropped on {}: {}", name, owner, e);
                        dropped.push(name.to_string());
                        continue;
                    }
                }
            }
        };

        if !value.is_empty() {
            let _ = write_value(sheet, attr, &value, config);
        }
        for (prop, v) in COPIED_PROPERTIES.iter().zip(record.flag_properties()) {
            if let Some(v) = v {
                let _ = sheet.set_attribute_property(attr, prop, v.clone());
            }
        }
        if let (Some(x), Some(y)) = (record.origin_x, record.origin_y) {
            let _ = sheet.set_attribute_origin(attr, Point::new(x, y));
        }
    }
    dropped
}
