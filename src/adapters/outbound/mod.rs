pub mod frame_writer;
pub mod loggers;
pub mod workcell_simulator;

pub use frame_writer::*;
pub use loggers::*;
pub use workcell_simulator::*;
