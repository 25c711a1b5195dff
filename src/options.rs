//! Render configuration.
//!
//! All of these are explicit values threaded through rendering calls.
//! There is deliberately no process-wide render state.

use serde::{Deserialize, Serialize};

use crate::colors::{ColorMode, MultiColor};
use crate::components::CableCategory;

/// Diagram-wide rendering options, usually taken from the input
/// document's `options` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub color_mode: ColorMode,
    pub fontname: String,
    /// Page background.
    pub bgcolor: MultiColor,
    /// Default node fill, used when no per-category color applies.
    pub bgcolor_node: MultiColor,
    pub bgcolor_connector: Option<MultiColor>,
    pub bgcolor_cable: Option<MultiColor>,
    pub bgcolor_bundle: Option<MultiColor>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::default(),
            fontname: "arial".to_string(),
            bgcolor: MultiColor::parse("WH"),
            bgcolor_node: MultiColor::parse("WH"),
            bgcolor_connector: None,
            bgcolor_cable: None,
            bgcolor_bundle: None,
        }
    }
}

impl RenderOptions {
    /// Fill color for a connector node: its own color wins, then the
    /// connector default, then the node default.
    pub fn connector_bgcolor(&self, explicit: Option<&MultiColor>) -> MultiColor {
        explicit
            .or(self.bgcolor_connector.as_ref())
            .unwrap_or(&self.bgcolor_node)
            .clone()
    }

    /// Fill color for a cable node. Bundles fall back to the cable
    /// default before the node default.
    pub fn cable_bgcolor(
        &self,
        explicit: Option<&MultiColor>,
        category: CableCategory,
    ) -> MultiColor {
        let category_default = match category {
            CableCategory::Bundle => self.bgcolor_bundle.as_ref().or(self.bgcolor_cable.as_ref()),
            CableCategory::Cable => self.bgcolor_cable.as_ref(),
        };
        explicit
            .or(category_default)
            .unwrap_or(&self.bgcolor_node)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgcolor_fallback_chain() {
        let mut options = RenderOptions::default();
        assert_eq!(options.connector_bgcolor(None).html(), "#ffffff");

        options.bgcolor_connector = Some(MultiColor::parse("LB"));
        assert_eq!(options.connector_bgcolor(None).html(), "#a0dfff");

        let explicit = MultiColor::parse("RD");
        assert_eq!(
            options.connector_bgcolor(Some(&explicit)).html(),
            "#ff0000"
        );
    }

    #[test]
    fn bundle_falls_back_to_cable_default() {
        let mut options = RenderOptions::default();
        options.bgcolor_cable = Some(MultiColor::parse("GY"));
        assert_eq!(
            options.cable_bgcolor(None, CableCategory::Bundle).html(),
            "#999999"
        );

        options.bgcolor_bundle = Some(MultiColor::parse("IV"));
        assert_eq!(
            options.cable_bgcolor(None, CableCategory::Bundle).html(),
            "#f5f0d0"
        );
        assert_eq!(
            options.cable_bgcolor(None, CableCategory::Cable).html(),
            "#999999"
        );
    }
}
