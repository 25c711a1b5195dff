//! Declarative input documents.
//!
//! A [`HarnessDocument`] is the serde image of the JSON input file.
//! [`HarnessDocument::build`] turns it into a [`Harness`] strictly
//! through the harness's own API, so loaded documents get the same
//! validation as programmatic construction.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::bom::BomItem;
use crate::colors::{ColorScheme, MultiColor};
use crate::components::{Cable, CableCategory, Connector, Metadata, PinId};
use crate::error::HarnessError;
use crate::graph::Tweak;
use crate::harness::{Harness, WireRef};
use crate::options::RenderOptions;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HarnessDocument {
    pub metadata: Metadata,
    pub options: RenderOptions,
    pub tweak: Tweak,
    pub connectors: Vec<ConnectorDef>,
    pub cables: Vec<CableDef>,
    pub connections: Vec<ConnectionDef>,
    pub mates: Vec<MateDef>,
    pub additional_bom_items: Vec<BomItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectorDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ctype: Option<String>,
    pub subtype: Option<String>,
    pub pins: Vec<PinId>,
    pub pinlabels: Vec<String>,
    pub pincount: Option<usize>,
    pub loops: Vec<(PinId, PinId)>,
    pub color: Option<MultiColor>,
    pub bgcolor: Option<MultiColor>,
    pub pn: Option<String>,
    pub manufacturer: Option<String>,
    pub mpn: Option<String>,
    pub notes: Option<String>,
}

impl ConnectorDef {
    fn into_connector(self) -> Result<Connector, HarnessError> {
        let pins = if self.pins.is_empty() {
            // derive pins 1..=N from pincount or the label list
            let count = match (self.pincount, self.pinlabels.len()) {
                (Some(count), _) => count,
                (None, labels) if labels > 0 => labels,
                (None, _) => {
                    return Err(HarnessError::InvalidComponent {
                        component: self.name,
                        detail: "needs pins, pincount, or pinlabels".to_string(),
                    })
                }
            };
            (1..=count as i64).map(PinId::Number).collect()
        } else {
            if let Some(count) = self.pincount {
                if count != self.pins.len() {
                    return Err(HarnessError::InvalidComponent {
                        component: self.name,
                        detail: format!("pincount {} but {} pins", count, self.pins.len()),
                    });
                }
            }
            self.pins
        };

        let mut connector = Connector::new(self.name, pins);
        connector.ctype = self.ctype;
        connector.subtype = self.subtype;
        connector.pinlabels = self.pinlabels;
        connector.loops = self.loops;
        connector.color = self.color;
        connector.bgcolor = self.bgcolor;
        connector.pn = self.pn;
        connector.manufacturer = self.manufacturer;
        connector.mpn = self.mpn;
        connector.notes = self.notes;
        Ok(connector)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CableDef {
    pub name: String,
    pub category: CableCategory,
    #[serde(rename = "type")]
    pub ctype: Option<String>,
    pub colors: Vec<MultiColor>,
    pub wirelabels: Vec<String>,
    pub wirecount: Option<usize>,
    pub color_code: Option<ColorScheme>,
    pub gauge: Option<f64>,
    pub gauge_unit: Option<String>,
    pub length: Option<f64>,
    pub shield: bool,
    pub bgcolor: Option<MultiColor>,
    pub pn: Option<String>,
    pub manufacturer: Option<String>,
    pub mpn: Option<String>,
    pub notes: Option<String>,
}

impl CableDef {
    fn into_cable(self) -> Result<Cable, HarnessError> {
        let colors = if self.colors.is_empty() {
            let count = self.wirecount.unwrap_or(0);
            match (self.color_code, count) {
                (Some(scheme), count) if count > 0 => {
                    let codes = scheme.codes();
                    // wire n wraps around when the table runs out
                    (0..count)
                        .map(|at| MultiColor::parse(codes[at % codes.len()]))
                        .collect()
                }
                _ => {
                    return Err(HarnessError::InvalidComponent {
                        component: self.name,
                        detail: "needs colors, or wirecount with a color_code".to_string(),
                    })
                }
            }
        } else {
            if let Some(count) = self.wirecount {
                if count != self.colors.len() {
                    return Err(HarnessError::InvalidComponent {
                        component: self.name,
                        detail: format!("wirecount {} but {} colors", count, self.colors.len()),
                    });
                }
            }
            self.colors
        };

        let mut cable = Cable::new(self.name, colors);
        cable.category = self.category;
        cable.ctype = self.ctype;
        cable.wirelabels = self.wirelabels;
        cable.gauge = self.gauge;
        cable.gauge_unit = self.gauge_unit;
        cable.length = self.length;
        cable.shield = self.shield;
        cable.bgcolor = self.bgcolor;
        cable.pn = self.pn;
        cable.manufacturer = self.manufacturer;
        cable.mpn = self.mpn;
        cable.notes = self.notes;
        Ok(cable)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionDef {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub from_pin: Option<PinId>,
    pub via: String,
    pub wire: WireRef,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub to_pin: Option<PinId>,
}

fn default_arrow() -> String {
    "--".to_string()
}

/// A mate definition: pin-to-pin when pin references are present,
/// component-to-component otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MateDef {
    Pin {
        from: String,
        from_pin: PinId,
        to: String,
        to_pin: PinId,
        #[serde(default = "default_arrow")]
        arrow: String,
    },
    Component {
        from: String,
        to: String,
        #[serde(default = "default_arrow")]
        arrow: String,
    },
}

impl HarnessDocument {
    pub fn from_json(text: &str) -> Result<Self, HarnessError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Build the harness this document describes.
    pub fn build(self) -> Result<Harness, HarnessError> {
        let mut harness = Harness::new(self.metadata, self.options, self.tweak);

        for def in self.connectors {
            harness.add_connector(def.into_connector()?)?;
        }
        for def in self.cables {
            harness.add_cable(def.into_cable()?)?;
        }
        for def in self.connections {
            let from = match (&def.from, &def.from_pin) {
                (Some(name), Some(pin)) => Some((name.as_str(), pin.clone())),
                (Some(name), None) => {
                    return Err(HarnessError::InvalidComponent {
                        component: name.clone(),
                        detail: "connection names a connector but no pin".to_string(),
                    })
                }
                _ => None,
            };
            let to = match (&def.to, &def.to_pin) {
                (Some(name), Some(pin)) => Some((name.as_str(), pin.clone())),
                (Some(name), None) => {
                    return Err(HarnessError::InvalidComponent {
                        component: name.clone(),
                        detail: "connection names a connector but no pin".to_string(),
                    })
                }
                _ => None,
            };
            harness.connect(from, &def.via, def.wire.clone(), to)?;
        }
        for def in self.mates {
            match def {
                MateDef::Pin {
                    from,
                    from_pin,
                    to,
                    to_pin,
                    arrow,
                } => harness.add_mate_pin(&from, from_pin, &to, to_pin, &arrow)?,
                MateDef::Component { from, to, arrow } => {
                    harness.add_mate_component(&from, &to, &arrow)
                }
            }
        }
        for item in self.additional_bom_items {
            harness.add_bom_item(item);
        }
        Ok(harness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "metadata": {"title": "Test harness"},
        "connectors": [
            {"name": "X1", "pins": [1, 2, 3], "pinlabels": ["A", "B", "C"]},
            {"name": "X2", "pincount": 3}
        ],
        "cables": [
            {"name": "W1", "colors": ["RD", "BU", "GYPK"], "gauge": 0.25, "length": 2}
        ],
        "connections": [
            {"from": "X1", "from_pin": "B", "via": "W1", "wire": 1, "to": "X2", "to_pin": 2}
        ]
    }"#;

    #[test]
    fn sample_document_builds() {
        let document = HarnessDocument::from_json(SAMPLE).unwrap();
        let harness = document.build().unwrap();
        assert_eq!(harness.metadata.title.as_deref(), Some("Test harness"));
        assert_eq!(harness.connector("X2").unwrap().pincount(), 3);
        let connection = &harness.cable("W1").unwrap().connections()[0];
        assert_eq!(connection.from.as_ref().unwrap().pin, PinId::from(2));
        assert_eq!(connection.wire, 1);
    }

    #[test]
    fn pins_derive_from_pinlabels() {
        let def = ConnectorDef {
            name: "X1".to_string(),
            pinlabels: vec!["A".to_string(), "B".to_string()],
            ..ConnectorDef::default()
        };
        let connector = def.into_connector().unwrap();
        assert_eq!(connector.pins, vec![PinId::from(1), PinId::from(2)]);
    }

    #[test]
    fn pincount_mismatch_is_rejected() {
        let def = ConnectorDef {
            name: "X1".to_string(),
            pins: vec![1.into(), 2.into()],
            pincount: Some(3),
            ..ConnectorDef::default()
        };
        assert!(matches!(
            def.into_connector(),
            Err(HarnessError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn bundle_colors_come_from_the_color_code_table() {
        let def = CableDef {
            name: "W1".to_string(),
            category: CableCategory::Bundle,
            wirecount: Some(10),
            color_code: Some(ColorScheme::T568a),
            ..CableDef::default()
        };
        let cable = def.into_cable().unwrap();
        assert_eq!(cable.wirecount(), 10);
        assert_eq!(cable.colors[0].render(crate::colors::ColorMode::EnUpper), "WHGN");
        // table has 8 entries, wire 9 wraps to the first
        assert_eq!(cable.colors[8], cable.colors[0]);
    }

    #[test]
    fn cable_without_colors_is_rejected() {
        let def = CableDef {
            name: "W1".to_string(),
            wirecount: Some(4),
            ..CableDef::default()
        };
        assert!(matches!(
            def.into_cable(),
            Err(HarnessError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn mate_defs_distinguish_pin_and_component() {
        let json = r#"[
            {"from": "X1", "from_pin": 1, "to": "X2", "to_pin": 1, "arrow": "-->"},
            {"from": "X1", "to": "X2"}
        ]"#;
        let defs: Vec<MateDef> = serde_json::from_str(json).unwrap();
        assert!(matches!(defs[0], MateDef::Pin { .. }));
        assert!(matches!(defs[1], MateDef::Component { .. }));
    }

    #[test]
    fn connector_without_pins_fails_to_build() {
        let document =
            HarnessDocument::from_json(r#"{"connectors": [{"name": "X1"}]}"#).unwrap();
        assert!(matches!(
            document.build(),
            Err(HarnessError::InvalidComponent { .. })
        ));
    }
}
