pub mod error;
pub mod fixed_point;
pub mod matrix;

pub use error::*;
pub use fixed_point::*;
pub use matrix::*;
