//! The harness: owner of all connectors, cables, and mates, and home
//! of symbolic pin/wire reference resolution.
//!
//! Built incrementally (`add_connector` → `add_cable` → `connect` →
//! `add_mate_*`), then queried for the derived graph and BOM. Both
//! derived values are memoized; any structural mutation clears the
//! memo so queries never observe stale results.

use log::debug;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::bom::{self, BomEntry, BomItem};
use crate::colors::ColorMode;
use crate::components::{Arrow, Cable, Connector, Endpoint, Mate, Metadata, PinId, Side};
use crate::error::HarnessError;
use crate::graph::{self, Graph, Tweak};
use crate::options::RenderOptions;

/// A wire reference: the 1-based wire index, or a string matched
/// against wire colors and wire labels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for WireRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for WireRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for WireRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// The in-memory model of an entire wiring diagram.
#[derive(Debug, Default)]
pub struct Harness {
    pub metadata: Metadata,
    pub options: RenderOptions,
    pub tweak: Tweak,
    connectors: HashMap<String, Connector>,
    connector_order: Vec<String>,
    cables: HashMap<String, Cable>,
    cable_order: Vec<String>,
    mates: Vec<Mate>,
    additional_bom_items: Vec<BomItem>,
    graph_cache: Option<Graph>,
    bom_cache: Option<Vec<BomEntry>>,
}

impl Harness {
    pub fn new(metadata: Metadata, options: RenderOptions, tweak: Tweak) -> Self {
        Self {
            metadata,
            options,
            tweak,
            ..Self::default()
        }
    }

    /// Drop memoized derived values. Called by every structural
    /// mutation.
    fn invalidate(&mut self) {
        self.graph_cache = None;
        self.bom_cache = None;
    }

    pub fn add_connector(&mut self, mut connector: Connector) -> Result<(), HarnessError> {
        self.invalidate();
        if self.connectors.contains_key(&connector.name) {
            return Err(HarnessError::DuplicateName(connector.name));
        }
        if connector.pins.is_empty() {
            return Err(HarnessError::InvalidComponent {
                component: connector.name,
                detail: "has no pins".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for pin in &connector.pins {
            if !seen.insert(pin) {
                return Err(HarnessError::InvalidComponent {
                    component: connector.name.clone(),
                    detail: format!("pin {pin} is listed twice"),
                });
            }
        }
        if !connector.pinlabels.is_empty() && connector.pinlabels.len() != connector.pins.len() {
            return Err(HarnessError::InvalidComponent {
                component: connector.name,
                detail: format!(
                    "{} pinlabels for {} pins",
                    connector.pinlabels.len(),
                    connector.pins.len()
                ),
            });
        }
        for (first, second) in &connector.loops {
            for end in [first, second] {
                if connector.pin_index(end).is_none() {
                    return Err(HarnessError::InvalidComponent {
                        component: connector.name.clone(),
                        detail: format!("loop references unknown pin {end}"),
                    });
                }
            }
        }
        connector.sync_activation();
        debug!(
            "adding connector {} with {} pins",
            connector.name,
            connector.pincount()
        );
        self.connector_order.push(connector.name.clone());
        self.connectors.insert(connector.name.clone(), connector);
        Ok(())
    }

    pub fn add_cable(&mut self, cable: Cable) -> Result<(), HarnessError> {
        self.invalidate();
        if self.cables.contains_key(&cable.name) {
            return Err(HarnessError::DuplicateName(cable.name));
        }
        if cable.colors.is_empty() {
            return Err(HarnessError::InvalidComponent {
                component: cable.name,
                detail: "has no wires".to_string(),
            });
        }
        if !cable.wirelabels.is_empty() && cable.wirelabels.len() != cable.colors.len() {
            return Err(HarnessError::InvalidComponent {
                component: cable.name,
                detail: format!(
                    "{} wirelabels for {} wires",
                    cable.wirelabels.len(),
                    cable.colors.len()
                ),
            });
        }
        debug!("adding cable {} with {} wires", cable.name, cable.wirecount());
        self.cable_order.push(cable.name.clone());
        self.cables.insert(cable.name.clone(), cable);
        Ok(())
    }

    /// Link a source pin, a cable wire, and a destination pin. Either
    /// end may be `None` for a dangling connection.
    ///
    /// Pin references resolve against both the raw pin list and the
    /// pin-label list; wire references against the color list and the
    /// wire-label list. A reference matching two lists at different
    /// positions is ambiguous, a label or color occurring more than
    /// once is a duplicate, and a reference matching nothing is not
    /// found; each aborts the build.
    pub fn connect(
        &mut self,
        from: Option<(&str, PinId)>,
        via_name: &str,
        via_wire: WireRef,
        to: Option<(&str, PinId)>,
    ) -> Result<(), HarnessError> {
        self.invalidate();

        let from_endpoint = match from {
            Some((name, pin)) => Some(Endpoint {
                connector: name.to_string(),
                pin: self.resolve_pin(name, pin)?,
            }),
            None => None,
        };
        let to_endpoint = match to {
            Some((name, pin)) => Some(Endpoint {
                connector: name.to_string(),
                pin: self.resolve_pin(name, pin)?,
            }),
            None => None,
        };
        let wire = self.resolve_wire(via_name, &via_wire)?;
        debug!("connecting {from_endpoint:?} via {via_name}:{wire} to {to_endpoint:?}");

        match self.cables.get_mut(via_name) {
            Some(cable) => {
                cable.record_connection(from_endpoint.clone(), wire, to_endpoint.clone())?
            }
            None => return Err(HarnessError::UnknownCable(via_name.to_string())),
        }

        // source pins face the cable on the right, destinations on the left
        if let Some(endpoint) = &from_endpoint {
            if let Some(connector) = self.connectors.get_mut(&endpoint.connector) {
                connector.activate_pin(&endpoint.pin, Side::Right)?;
            }
        }
        if let Some(endpoint) = &to_endpoint {
            if let Some(connector) = self.connectors.get_mut(&endpoint.connector) {
                connector.activate_pin(&endpoint.pin, Side::Left)?;
            }
        }
        Ok(())
    }

    /// Resolve a pin reference on a connector to a raw pin identifier.
    fn resolve_pin(&self, name: &str, pin: PinId) -> Result<PinId, HarnessError> {
        let connector = self
            .connectors
            .get(name)
            .ok_or_else(|| HarnessError::UnknownConnector(name.to_string()))?;

        let pin_position = connector.pin_index(&pin);
        let label_position = connector
            .pinlabels
            .iter()
            .position(|label| pin.matches_label(label));

        if let (Some(pin_at), Some(label_at)) = (pin_position, label_position) {
            if pin_at != label_at {
                return Err(HarnessError::AmbiguousPinReference {
                    component: name.to_string(),
                    reference: pin.to_string(),
                });
            }
        }

        let resolved = match label_position {
            Some(label_at) => {
                let occurrences = connector
                    .pinlabels
                    .iter()
                    .filter(|label| pin.matches_label(label))
                    .count();
                if occurrences > 1 {
                    return Err(HarnessError::DuplicatePinReference {
                        component: name.to_string(),
                        reference: pin.to_string(),
                    });
                }
                // map the label to its raw pin identifier
                connector.pins[label_at].clone()
            }
            None => pin,
        };

        if connector.pin_index(&resolved).is_none() {
            return Err(HarnessError::ReferenceNotFound {
                component: name.to_string(),
                reference: resolved.to_string(),
            });
        }
        Ok(resolved)
    }

    /// Resolve a wire reference on a cable to its 1-based wire index.
    fn resolve_wire(&self, cable_name: &str, wire: &WireRef) -> Result<usize, HarnessError> {
        let cable = self
            .cables
            .get(cable_name)
            .ok_or_else(|| HarnessError::UnknownCable(cable_name.to_string()))?;

        let text = match wire {
            WireRef::Index(index) => {
                if *index == 0 || *index > cable.wirecount() {
                    return Err(HarnessError::WireIndexOutOfRange {
                        cable: cable_name.to_string(),
                        index: *index,
                        count: cable.wirecount(),
                    });
                }
                return Ok(*index);
            }
            WireRef::Name(text) => text,
        };

        // colors compare through their canonical short-code rendering
        let matches_color =
            |color: &crate::colors::MultiColor| color.render(ColorMode::EnUpper) == *text;
        let color_position = cable.colors.iter().position(matches_color);
        let label_position = cable.wirelabels.iter().position(|label| label == text);

        if let (Some(color_at), Some(label_at)) = (color_position, label_position) {
            if color_at != label_at {
                return Err(HarnessError::AmbiguousWireReference {
                    component: cable_name.to_string(),
                    reference: text.clone(),
                });
            }
        }

        // list positions are 0-based, wire indices are 1-based
        if let Some(color_at) = color_position {
            let occurrences = cable.colors.iter().filter(|c| matches_color(c)).count();
            if occurrences > 1 {
                return Err(HarnessError::DuplicateWireReference {
                    component: cable_name.to_string(),
                    reference: text.clone(),
                });
            }
            Ok(color_at + 1)
        } else if let Some(label_at) = label_position {
            let occurrences = cable
                .wirelabels
                .iter()
                .filter(|label| *label == text)
                .count();
            if occurrences > 1 {
                return Err(HarnessError::DuplicateWireReference {
                    component: cable_name.to_string(),
                    reference: text.clone(),
                });
            }
            Ok(label_at + 1)
        } else {
            Err(HarnessError::ReferenceNotFound {
                component: cable_name.to_string(),
                reference: text.clone(),
            })
        }
    }

    /// Pair two pins non-electrically. Pin references resolve through
    /// the same label-remapping path as `connect`.
    pub fn add_mate_pin(
        &mut self,
        from_name: &str,
        from_pin: PinId,
        to_name: &str,
        to_pin: PinId,
        arrow: &str,
    ) -> Result<(), HarnessError> {
        self.invalidate();
        let from_pin = self.resolve_pin(from_name, from_pin)?;
        let to_pin = self.resolve_pin(to_name, to_pin)?;
        if let Some(connector) = self.connectors.get_mut(from_name) {
            connector.activate_pin(&from_pin, Side::Right)?;
        }
        if let Some(connector) = self.connectors.get_mut(to_name) {
            connector.activate_pin(&to_pin, Side::Left)?;
        }
        self.mates.push(Mate::Pin {
            from: Endpoint {
                connector: from_name.to_string(),
                pin: from_pin,
            },
            to: Endpoint {
                connector: to_name.to_string(),
                pin: to_pin,
            },
            arrow: Arrow::parse(arrow),
        });
        Ok(())
    }

    /// Pair two components non-electrically.
    pub fn add_mate_component(&mut self, from: &str, to: &str, arrow: &str) {
        self.invalidate();
        self.mates.push(Mate::Component {
            from: from.to_string(),
            to: to.to_string(),
            arrow: Arrow::parse(arrow),
        });
    }

    /// Append a manual BOM line.
    pub fn add_bom_item(&mut self, item: BomItem) {
        self.invalidate();
        self.additional_bom_items.push(item);
    }

    pub fn connector(&self, name: &str) -> Option<&Connector> {
        self.connectors.get(name)
    }

    pub fn cable(&self, name: &str) -> Option<&Cable> {
        self.cables.get(name)
    }

    /// Connectors in insertion order.
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connector_order
            .iter()
            .filter_map(|name| self.connectors.get(name))
    }

    /// Cables in insertion order.
    pub fn cables(&self) -> impl Iterator<Item = &Cable> {
        self.cable_order
            .iter()
            .filter_map(|name| self.cables.get(name))
    }

    pub fn mates(&self) -> &[Mate] {
        &self.mates
    }

    pub fn additional_bom_items(&self) -> &[BomItem] {
        &self.additional_bom_items
    }

    /// The diagram graph, memoized until the next structural mutation.
    pub fn graph(&mut self) -> Result<&Graph, HarnessError> {
        let graph = match self.graph_cache.take() {
            Some(graph) => graph,
            None => graph::assemble(self)?,
        };
        Ok(self.graph_cache.insert(graph))
    }

    /// The aggregated BOM, memoized until the next structural mutation.
    pub fn bom(&mut self) -> &[BomEntry] {
        let entries = match self.bom_cache.take() {
            Some(entries) => entries,
            None => bom::generate(self),
        };
        self.bom_cache.insert(entries).as_slice()
    }

    /// Graphviz DOT text for the diagram.
    pub fn to_dot(&mut self) -> Result<String, HarnessError> {
        let options = self.options.clone();
        let tweak = self.tweak.clone();
        Ok(self.graph()?.to_dot(&options, &tweak))
    }
}
