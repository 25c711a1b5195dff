//! Entity model: connectors, cables, mates, and document metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::colors::MultiColor;
use crate::error::HarnessError;

/// A pin identifier: an integer or a string. References keep the same
/// shape, so integer `2` and string `"2"` never match each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PinId {
    Number(i64),
    Name(String),
}

impl PinId {
    /// Whether this reference, read as a label, equals the given label.
    pub(crate) fn matches_label(&self, label: &str) -> bool {
        matches!(self, Self::Name(name) if name == label)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for PinId {
    fn from(number: i64) -> Self {
        Self::Number(number)
    }
}

impl From<&str> for PinId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for PinId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Which side of a component node a pin port faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Per-pin activation state. A side is set once a connection or mate
/// references the pin on that side; setting it again is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveSides {
    pub left: bool,
    pub right: bool,
}

impl ActiveSides {
    pub fn any(self) -> bool {
        self.left || self.right
    }
}

/// A named component exposing a fixed, ordered list of pins.
#[derive(Debug, Clone, Default)]
pub struct Connector {
    pub name: String,
    pub ctype: Option<String>,
    pub subtype: Option<String>,
    pub color: Option<MultiColor>,
    pub bgcolor: Option<MultiColor>,
    pub pn: Option<String>,
    pub manufacturer: Option<String>,
    pub mpn: Option<String>,
    pub notes: Option<String>,
    pub pins: Vec<PinId>,
    pub pinlabels: Vec<String>,
    /// Pin pairs electrically tied inside the connector.
    pub loops: Vec<(PinId, PinId)>,
    active: Vec<ActiveSides>,
}

impl Connector {
    pub fn new(name: impl Into<String>, pins: Vec<PinId>) -> Self {
        let active = vec![ActiveSides::default(); pins.len()];
        Self {
            name: name.into(),
            pins,
            active,
            ..Self::default()
        }
    }

    pub fn pincount(&self) -> usize {
        self.pins.len()
    }

    /// Position of a pin identifier in the pin list.
    pub fn pin_index(&self, pin: &PinId) -> Option<usize> {
        self.pins.iter().position(|candidate| candidate == pin)
    }

    /// Resize the activation state to the pin list. Called when the
    /// connector enters a harness, after which the pin list is fixed.
    pub(crate) fn sync_activation(&mut self) {
        self.active.resize(self.pins.len(), ActiveSides::default());
    }

    /// Mark a pin as referenced on the given side. Idempotent: the
    /// state after activating the same pin/side twice equals the state
    /// after one activation.
    pub fn activate_pin(&mut self, pin: &PinId, side: Side) -> Result<(), HarnessError> {
        let index = self
            .pin_index(pin)
            .ok_or_else(|| HarnessError::ReferenceNotFound {
                component: self.name.clone(),
                reference: pin.to_string(),
            })?;
        match side {
            Side::Left => self.active[index].left = true,
            Side::Right => self.active[index].right = true,
        }
        Ok(())
    }

    /// Activation state of a pin, by identifier.
    pub fn active_sides(&self, pin: &PinId) -> Option<ActiveSides> {
        self.pin_index(pin).map(|index| self.active[index])
    }

    /// Activation state of a pin, by position.
    pub fn active_sides_at(&self, index: usize) -> Option<ActiveSides> {
        self.active.get(index).copied()
    }
}

/// Cable vs. loose wire bundle. Bundles render with a dashed node
/// border and account for each wire separately in the BOM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CableCategory {
    #[default]
    Cable,
    Bundle,
}

/// One end of a recorded connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub connector: String,
    pub pin: PinId,
}

/// A resolved connection on a cable: a 1-based wire index plus an
/// optional connector pin on each side. Either side may be absent for
/// a dangling connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub from: Option<Endpoint>,
    pub wire: usize,
    pub to: Option<Endpoint>,
}

/// A named bundle of wires, each with a color and an optional label.
#[derive(Debug, Clone, Default)]
pub struct Cable {
    pub name: String,
    pub category: CableCategory,
    pub ctype: Option<String>,
    pub colors: Vec<MultiColor>,
    pub wirelabels: Vec<String>,
    pub gauge: Option<f64>,
    pub gauge_unit: Option<String>,
    pub length: Option<f64>,
    pub shield: bool,
    pub bgcolor: Option<MultiColor>,
    pub pn: Option<String>,
    pub manufacturer: Option<String>,
    pub mpn: Option<String>,
    pub notes: Option<String>,
    connections: Vec<Connection>,
}

impl Cable {
    pub fn new(name: impl Into<String>, colors: Vec<MultiColor>) -> Self {
        Self {
            name: name.into(),
            colors,
            ..Self::default()
        }
    }

    pub fn wirecount(&self) -> usize {
        self.colors.len()
    }

    /// Color of a wire by its 1-based index.
    pub fn wire_color(&self, wire: usize) -> Option<&MultiColor> {
        wire.checked_sub(1).and_then(|index| self.colors.get(index))
    }

    /// Label of a wire by its 1-based index.
    pub fn wire_label(&self, wire: usize) -> Option<&str> {
        wire.checked_sub(1)
            .and_then(|index| self.wirelabels.get(index))
            .map(String::as_str)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Record a resolved connection. The wire index is 1-based and
    /// must address an existing wire.
    pub(crate) fn record_connection(
        &mut self,
        from: Option<Endpoint>,
        wire: usize,
        to: Option<Endpoint>,
    ) -> Result<(), HarnessError> {
        if wire == 0 || wire > self.wirecount() {
            return Err(HarnessError::WireIndexOutOfRange {
                cable: self.name.clone(),
                index: wire,
                count: self.wirecount(),
            });
        }
        self.connections.push(Connection { from, wire, to });
        Ok(())
    }
}

/// Direction indicator on a mate edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    None,
    Forward,
    Back,
    Both,
}

impl ArrowDirection {
    /// Graphviz `dir` attribute value.
    pub fn dot_dir(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Forward => "forward",
            Self::Back => "back",
            Self::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowWeight {
    Single,
    Double,
}

/// Directional annotation on a mate, parsed from arrow strings such as
/// `--`, `-->`, `<--`, `<-->`, `==>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrow {
    pub direction: ArrowDirection,
    pub weight: ArrowWeight,
}

impl Arrow {
    pub fn parse(text: &str) -> Self {
        let head = text.contains('>');
        let tail = text.contains('<');
        let direction = match (tail, head) {
            (true, true) => ArrowDirection::Both,
            (false, true) => ArrowDirection::Forward,
            (true, false) => ArrowDirection::Back,
            (false, false) => ArrowDirection::None,
        };
        let weight = if text.contains('=') {
            ArrowWeight::Double
        } else {
            ArrowWeight::Single
        };
        Self { direction, weight }
    }
}

/// A non-electrical pairing between two pins or two components,
/// referencing harness entities by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mate {
    Pin {
        from: Endpoint,
        to: Endpoint,
        arrow: Arrow,
    },
    Component {
        from: String,
        to: String,
        arrow: Arrow,
    },
}

impl Mate {
    pub fn arrow(&self) -> Arrow {
        match self {
            Self::Pin { arrow, .. } | Self::Component { arrow, .. } => *arrow,
        }
    }
}

/// Free-form document metadata surfaced in the HTML report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_id_number_and_name_are_distinct() {
        assert_ne!(PinId::from(2), PinId::from("2"));
        assert!(PinId::from("A").matches_label("A"));
        assert!(!PinId::from(2).matches_label("2"));
    }

    #[test]
    fn activate_pin_is_idempotent() {
        let mut connector = Connector::new("X1", vec![1.into(), 2.into()]);
        connector.activate_pin(&2.into(), Side::Right).unwrap();
        let once = connector.active_sides(&2.into()).unwrap();
        connector.activate_pin(&2.into(), Side::Right).unwrap();
        let twice = connector.active_sides(&2.into()).unwrap();
        assert_eq!(once, twice);
        assert!(twice.right);
        assert!(!twice.left);
    }

    #[test]
    fn activate_unknown_pin_fails() {
        let mut connector = Connector::new("X1", vec![1.into()]);
        assert!(matches!(
            connector.activate_pin(&9.into(), Side::Left),
            Err(HarnessError::ReferenceNotFound { .. })
        ));
    }

    #[test]
    fn record_connection_checks_wire_range() {
        let mut cable = Cable::new("W1", vec![MultiColor::parse("RD")]);
        assert!(cable.record_connection(None, 1, None).is_ok());
        assert!(matches!(
            cable.record_connection(None, 2, None),
            Err(HarnessError::WireIndexOutOfRange { .. })
        ));
        assert!(matches!(
            cable.record_connection(None, 0, None),
            Err(HarnessError::WireIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn arrow_parsing() {
        assert_eq!(Arrow::parse("-->").direction, ArrowDirection::Forward);
        assert_eq!(Arrow::parse("<--").direction, ArrowDirection::Back);
        assert_eq!(Arrow::parse("<-->").direction, ArrowDirection::Both);
        assert_eq!(Arrow::parse("--").direction, ArrowDirection::None);
        assert_eq!(Arrow::parse("==>").weight, ArrowWeight::Double);
        assert_eq!(Arrow::parse("-->").weight, ArrowWeight::Single);
    }
}
