//! Error taxonomy for harness construction and rendering.
//!
//! Every error aborts the current build; the harness is considered
//! invalid once `connect` has failed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// A pin reference matches both the pin list and the pin-label list
    /// at different positions.
    #[error("{component}:{reference} is defined both in pinlabels and pins, for different pins")]
    AmbiguousPinReference { component: String, reference: String },

    /// A pin label used as a reference occurs more than once.
    #[error("{component}:{reference} is defined more than once")]
    DuplicatePinReference { component: String, reference: String },

    /// A wire reference matches both the color list and the wire-label
    /// list at different positions.
    #[error("{component}:{reference} is defined both in colors and wirelabels, for different wires")]
    AmbiguousWireReference { component: String, reference: String },

    /// A color or wire label used as a reference occurs more than once.
    #[error("{component}:{reference} is used for more than one wire")]
    DuplicateWireReference { component: String, reference: String },

    /// A pin or wire reference matches nothing.
    #[error("{component}:{reference} not found")]
    ReferenceNotFound { component: String, reference: String },

    #[error("connector {0} not found")]
    UnknownConnector(String),

    #[error("cable {0} not found")]
    UnknownCable(String),

    #[error("{0} is already defined")]
    DuplicateName(String),

    #[error("wire {index} out of range for {cable} ({count} wires)")]
    WireIndexOutOfRange {
        cable: String,
        index: usize,
        count: usize,
    },

    /// Stripe padding is only defined for up to three color segments.
    #[error("stripe padding not supported for {0} colors")]
    UnsupportedPadding(usize),

    /// An entity definition violates a structural invariant
    /// (duplicate pins, mismatched parallel lists, dangling loop ends).
    #[error("{component}: {detail}")]
    InvalidComponent { component: String, detail: String },

    #[error("invalid document: {0}")]
    Document(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
