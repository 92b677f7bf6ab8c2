pub mod gantt;

pub use gantt::*;
