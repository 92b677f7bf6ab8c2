pub mod planner_stub;
pub mod session_service;

pub use planner_stub::*;
pub use session_service::*;
