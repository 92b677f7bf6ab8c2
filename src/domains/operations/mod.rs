pub mod human;
pub mod measurer;
pub mod robot;
pub mod synthesizer;
pub mod types;

pub use human::*;
pub use measurer::*;
pub use robot::*;
pub use synthesizer::*;
pub use types::*;
