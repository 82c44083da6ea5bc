//! Mimic error types with granular categories

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all model operations
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationReport),

    #[error("Serialization error: {0}")]
    Serialize(#[from] SerializeError),
}

/// Errors raised while reading and parsing a GraphML document, before
/// any semantic checks run
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Graph file '{path}' does not exist")]
    FileMissing { path: PathBuf },

    #[error("Graph file '{path}' is not a regular file")]
    NotRegular { path: PathBuf },

    #[error("Unable to open graph file '{path}': {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Graph bytes are not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("GraphML parse error: {0}")]
    Parse(#[from] quick_xml::DeError),

    #[error("Document root '{root}' is not a graphml element")]
    UnsupportedFormat { root: String },

    #[error("Edge {index} references unknown vertex id '{endpoint}'")]
    DanglingEndpoint { index: usize, endpoint: String },
}

/// A single structural rule broken by a loaded graph. Vertices are
/// identified by index and declared name, edges by index plus
/// endpoint names, matching the shape of the validator's warnings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("Vertex {index} is missing required attribute 'name'")]
    MissingVertexName { index: usize },

    #[error("Vertex {index} ('{name}') is missing required attribute 'type'")]
    MissingVertexType { index: usize, name: String },

    #[error(
        "Vertex {index} ('{name}') has invalid type '{found}', need 'state' or 'observation'"
    )]
    InvalidVertexType {
        index: usize,
        name: String,
        found: String,
    },

    #[error(
        "Observation vertex {index} must be named '+', '-', '$', or 'F', but is named '{name}'"
    )]
    UnknownObservationName { index: usize, name: String },

    #[error(
        "Vertex {index} uses the reserved observation name '{name}' but has type '{found}'"
    )]
    ReservedNameNotObservation {
        index: usize,
        name: String,
        found: String,
    },

    #[error("No vertex named 'start' exists in the graph")]
    MissingStart,

    #[error("Duplicate 'start' vertex: first at index {first}, again at index {second}")]
    DuplicateStart { first: usize, second: usize },

    #[error("Edge {index} ({from} -> {to}) is missing required attribute '{attribute}'")]
    MissingEdgeAttribute {
        index: usize,
        from: String,
        to: String,
        attribute: &'static str,
    },

    #[error(
        "Edge {index} ({from} -> {to}) attribute '{attribute}' value '{value}' is not a number"
    )]
    MalformedEdgeNumber {
        index: usize,
        from: String,
        to: String,
        attribute: &'static str,
        value: String,
    },

    #[error(
        "Edge {index} ({from} -> {to}) attribute '{attribute}' must be finite and non-negative, got {value}"
    )]
    EdgeNumberOutOfRange {
        index: usize,
        from: String,
        to: String,
        attribute: &'static str,
        value: f64,
    },

    #[error(
        "Edge {index} ({from} -> {to}) has invalid type '{found}', need 'transition' or 'emission'"
    )]
    InvalidEdgeType {
        index: usize,
        from: String,
        to: String,
        found: String,
    },

    #[error(
        "Source vertex of transition edge {index} ({from} -> {to}) must not be an observation vertex"
    )]
    TransitionFromObservation {
        index: usize,
        from: String,
        to: String,
    },

    #[error(
        "Destination vertex of transition edge {index} ({from} -> {to}) must not be an observation vertex"
    )]
    TransitionToObservation {
        index: usize,
        from: String,
        to: String,
    },

    #[error(
        "Source vertex of emission edge {index} ({from} -> {to}) must not be an observation vertex"
    )]
    EmissionFromObservation {
        index: usize,
        from: String,
        to: String,
    },

    #[error(
        "Destination vertex of emission edge {index} ({from} -> {to}) must be an observation vertex"
    )]
    EmissionToNonObservation {
        index: usize,
        from: String,
        to: String,
    },
}

/// Everything the validator rejected, accumulated across both passes
/// so that diagnostics are never truncated
#[derive(Debug, Error)]
#[error("Graph failed validation with {} issue(s)", .issues.len())]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

/// Errors raised while rendering a graph back to GraphML
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("GraphML rendering failed: {0}")]
    Render(#[from] quick_xml::DeError),
}

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
