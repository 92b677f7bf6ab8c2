pub mod frame_reader;
pub mod tcp_listener;

pub use frame_reader::*;
pub use tcp_listener::*;
