use std::time::Duration;
use thiserror::Error;

/// Failures raised while decoding or encoding frames on the planner link.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated stream: expected {expected} bytes, received {received}")]
    TruncatedStream { expected: usize, received: usize },

    #[error("Invalid frame header: {rows}x{cols}")]
    InvalidHeader { rows: i32, cols: i32 },

    #[error("Invalid frame length: {0}")]
    InvalidLength(i32),

    #[error("Frame too large: {elements} elements exceeds limit {limit}")]
    FrameTooLarge { elements: usize, limit: usize },

    #[error("String frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("Invalid integer token: {0}")]
    InvalidInteger(String),

    #[error("Timed out after {after:?} waiting for {frame}")]
    Timeout { frame: String, after: Duration },

    #[error("Cancelled while waiting for {frame}")]
    Cancelled { frame: String },
}

/// A real value that cannot travel as a fixed-point `i32`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{value} does not fit an i32 at precision {decimal_precision} with multiplier {multiplier}")]
pub struct FixedPointOverflow {
    pub value: f64,
    pub decimal_precision: u32,
    pub multiplier: i32,
}

/// Failures reported by the simulation backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Object not found: {name}")]
    ObjectLookup { name: String },

    #[error("Synthesis of {operation} failed: {reason}")]
    Synthesis { operation: String, reason: String },

    #[error("Measurement of {operation} failed: {reason}")]
    Measurement { operation: String, reason: String },

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),
}

/// Session-fatal failures. Every variant aborts the whole session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("Shape mismatch in {frame}: expected {expected}, got {actual}")]
    ShapeMismatch {
        frame: String,
        expected: String,
        actual: String,
    },

    #[error("Expected {expected} identifiers, received {received}")]
    MissingIdentifier { expected: usize, received: usize },

    #[error("Unknown agent tag {tag} for task {task}")]
    UnknownAgentTag { task: usize, tag: i32 },

    #[error("Invalid assembly order: {0}")]
    InvalidAssemblyOrder(String),

    #[error("Negative start offset {value} at position {position}")]
    NegativeOffset { position: usize, value: i32 },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type WireResult<T> = Result<T, WireError>;
pub type BackendResult<T> = Result<T, BackendError>;
pub type SessionResult<T> = Result<T, SessionError>;
