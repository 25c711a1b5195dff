//! Bill-of-materials aggregation.
//!
//! Every physical part derives a [`BomKey`]; parts equal under the key
//! merge into one line with summed quantity and the union of their
//! designators. The graph renderer derives part info through the same
//! key functions, so diagram tooltips and the BOM table always agree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::colors::ColorMode;
use crate::components::{Cable, CableCategory, Connector};
use crate::harness::Harness;

/// Grouping key: every comparison attribute except quantity and
/// designators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct BomKey {
    pub description: String,
    pub unit: Option<String>,
    pub pn: Option<String>,
    pub manufacturer: Option<String>,
    pub mpn: Option<String>,
}

/// A manually declared BOM line, passed through aggregation unchanged
/// except for merging with equal-keyed lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BomItem {
    pub description: String,
    pub qty: Option<f64>,
    pub unit: Option<String>,
    pub designators: Vec<String>,
    pub pn: Option<String>,
    pub manufacturer: Option<String>,
    pub mpn: Option<String>,
}

/// One aggregated output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomEntry {
    /// 1-based row number, assigned after sorting.
    pub id: usize,
    pub key: BomKey,
    pub qty: f64,
    /// Sorted, deduplicated designator list.
    pub designators: Vec<String>,
}

/// An unaggregated contribution from one harness entity.
#[derive(Debug, Clone)]
struct BomPart {
    key: BomKey,
    qty: f64,
    designators: Vec<String>,
}

fn push_field(description: &mut String, field: &Option<String>) {
    if let Some(value) = field {
        description.push_str(", ");
        description.push_str(value);
    }
}

/// Key for a connector part.
pub fn connector_key(connector: &Connector, mode: ColorMode) -> BomKey {
    let mut description = String::from("Connector");
    push_field(&mut description, &connector.ctype);
    push_field(&mut description, &connector.subtype);
    if connector.pincount() > 0 {
        description.push_str(&format!(", {} pins", connector.pincount()));
    }
    if let Some(color) = &connector.color {
        description.push_str(&format!(", {}", color.render(mode)));
    }
    BomKey {
        description,
        unit: None,
        pn: connector.pn.clone(),
        manufacturer: connector.manufacturer.clone(),
        mpn: connector.mpn.clone(),
    }
}

/// Key for a cable part. Type, construction, length, and colors all
/// participate in identity; quantity is a count of cables.
pub fn cable_key(cable: &Cable, mode: ColorMode) -> BomKey {
    let mut description = String::from(match cable.category {
        CableCategory::Cable => "Cable",
        CableCategory::Bundle => "Bundle",
    });
    push_field(&mut description, &cable.ctype);
    if cable.wirecount() > 0 {
        description.push_str(&format!(", {}", cable.wirecount()));
        if let Some(gauge) = cable.gauge {
            let unit = cable.gauge_unit.as_deref().unwrap_or("mm\u{b2}");
            description.push_str(&format!(" x {gauge} {unit}"));
        } else {
            description.push_str(" wires");
        }
    }
    if cable.shield {
        description.push_str(", shielded");
    }
    if let Some(length) = cable.length {
        description.push_str(&format!(", {length} m"));
    }
    if !cable.colors.is_empty() {
        let colors: Vec<String> = cable
            .colors
            .iter()
            .map(|color| color.render(mode))
            .collect();
        description.push_str(&format!(", {}", colors.join(":")));
    }
    BomKey {
        description,
        unit: None,
        pn: cable.pn.clone(),
        manufacturer: cable.manufacturer.clone(),
        mpn: cable.mpn.clone(),
    }
}

/// Key for one wire of a bundle, by 1-based wire index. Bundle wires
/// are bought by length, so the unit is meters.
pub fn bundle_wire_key(cable: &Cable, wire: usize, mode: ColorMode) -> BomKey {
    let mut description = String::from("Wire");
    if let Some(gauge) = cable.gauge {
        let unit = cable.gauge_unit.as_deref().unwrap_or("mm\u{b2}");
        description.push_str(&format!(", {gauge} {unit}"));
    }
    if let Some(color) = cable.wire_color(wire) {
        description.push_str(&format!(", {}", color.render(mode)));
    }
    BomKey {
        description,
        unit: Some("m".to_string()),
        pn: cable.pn.clone(),
        manufacturer: cable.manufacturer.clone(),
        mpn: cable.mpn.clone(),
    }
}

/// Walk the harness and produce the aggregated BOM.
pub(crate) fn generate(harness: &Harness) -> Vec<BomEntry> {
    let mode = harness.options.color_mode;
    let mut parts = Vec::new();

    for connector in harness.connectors() {
        parts.push(BomPart {
            key: connector_key(connector, mode),
            qty: 1.0,
            designators: vec![connector.name.clone()],
        });
    }

    for cable in harness.cables() {
        match cable.category {
            CableCategory::Cable => parts.push(BomPart {
                key: cable_key(cable, mode),
                qty: 1.0,
                designators: vec![cable.name.clone()],
            }),
            CableCategory::Bundle => {
                for wire in 1..=cable.wirecount() {
                    parts.push(BomPart {
                        key: bundle_wire_key(cable, wire, mode),
                        qty: cable.length.unwrap_or(1.0),
                        designators: vec![cable.name.clone()],
                    });
                }
            }
        }
    }

    for item in harness.additional_bom_items() {
        parts.push(BomPart {
            key: BomKey {
                description: item.description.clone(),
                unit: item.unit.clone(),
                pn: item.pn.clone(),
                manufacturer: item.manufacturer.clone(),
                mpn: item.mpn.clone(),
            },
            qty: item.qty.unwrap_or(1.0),
            designators: item.designators.clone(),
        });
    }

    aggregate(parts)
}

fn aggregate(parts: Vec<BomPart>) -> Vec<BomEntry> {
    let mut groups: Vec<BomPart> = Vec::new();
    let mut index: HashMap<BomKey, usize> = HashMap::new();

    for part in parts {
        match index.get(&part.key) {
            Some(&position) => {
                let group = &mut groups[position];
                group.qty += part.qty;
                group.designators.extend(part.designators);
            }
            None => {
                index.insert(part.key.clone(), groups.len());
                groups.push(part);
            }
        }
    }

    groups.sort_by(|a, b| a.key.description.cmp(&b.key.description));

    groups
        .into_iter()
        .enumerate()
        .map(|(position, mut group)| {
            group.designators.sort();
            group.designators.dedup();
            BomEntry {
                id: position + 1,
                key: group.key,
                qty: group.qty,
                designators: group.designators,
            }
        })
        .collect()
}
