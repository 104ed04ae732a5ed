//! Error taxonomy for world generation.
//!
//! Configuration errors (shape mismatches, malformed parameters) fail fast.
//! Algorithmic dead-ends (pathfinder cap, erosion search cap) are *not*
//! errors: they degrade to lakes / "no path" at the call site.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("layer '{layer}': shape {got_height}x{got_width} does not match world {want_height}x{want_width}")]
    ShapeMismatch {
        layer: String,
        got_width: usize,
        got_height: usize,
        want_width: usize,
        want_height: usize,
    },

    #[error("stage '{stage}' requires layer '{layer}' which is not present")]
    MissingLayer { stage: &'static str, layer: &'static str },

    #[error("layer '{layer}' holds {got}, not {expected}")]
    LayerKind {
        layer: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<WorldError>,
    },

    #[error("invalid generation parameter: {0}")]
    InvalidParameter(String),

    #[error("layer '{layer}': thresholds are not strictly increasing ({prev} then {next})")]
    InvalidThresholds { layer: String, prev: f64, next: f64 },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, WorldError>;
