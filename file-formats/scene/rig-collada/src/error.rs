use std::io;
use thiserror::Error;

/// Error types for scene document parsing, model building and animation
#[derive(Error, Debug)]
pub enum ColladaError {
    /// I/O Error while opening or reading a document
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] xml::reader::Error),

    /// A section the pipeline cannot work without is absent
    #[error("Missing section: {0}")]
    MissingSection(String),

    /// A numeric literal in a source array could not be decoded
    #[error("Malformed number '{literal}' in {context}")]
    MalformedNumber { literal: String, context: String },

    /// A `#id` reference or an index points at nothing
    #[error("Reference error: {0}")]
    InvalidReference(String),

    /// Structural problem in an otherwise well-formed document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A composed bind transform cannot be inverted
    #[error("Singular bind transform for joint '{joint}'")]
    SingularBindTransform { joint: String },

    /// Two scene nodes resolved to the same joint id
    #[error("Duplicate joint '{name}' (id {id})")]
    DuplicateJoint { name: String, id: u32 },

    /// Keyframe ordering or length violation
    #[error("Invalid animation: {0}")]
    InvalidAnimation(String),

    /// Missing or out-of-range configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type using ColladaError
pub type Result<T> = std::result::Result<T, ColladaError>;
