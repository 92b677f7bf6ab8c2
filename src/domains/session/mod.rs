pub mod params;
pub mod state;

pub use params::*;
pub use state::*;
