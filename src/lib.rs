//! Wireloom - wiring harness documentation compiler
//!
//! Builds a [`Harness`] model from a declarative document (or
//! programmatically), resolves symbolic pin and wire references into
//! concrete indices, and derives a diagram graph, an aggregated bill
//! of materials, and an HTML report.

pub mod bom;
pub mod colors;
pub mod components;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod harness;
pub mod options;
pub mod report;

pub use bom::{BomEntry, BomItem, BomKey};
pub use colors::{ColorMode, ColorScheme, MultiColor, SingleColor};
pub use components::{
    Arrow, ArrowDirection, ArrowWeight, Cable, CableCategory, Connection, Connector, Endpoint,
    Mate, Metadata, PinId, Side,
};
pub use document::HarnessDocument;
pub use error::HarnessError;
pub use fingerprint::document_fingerprint;
pub use graph::{Graph, Tweak};
pub use harness::{Harness, WireRef};
pub use options::RenderOptions;
pub use report::OutputFormat;

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
