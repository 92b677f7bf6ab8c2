pub mod layout;
pub mod ports;
pub mod types;

pub use layout::*;
pub use ports::*;
pub use types::*;
