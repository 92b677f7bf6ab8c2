pub mod adapters;
pub mod application;
pub mod common;
pub mod config;
pub mod domains;

pub use config::Config;

pub use common::{
    BackendError, FixedPoint, FixedPointOverflow, IntMatrix, SessionError, WireError,
};
pub use domains::{DomainLogger, DynLogger, SessionParameters};
