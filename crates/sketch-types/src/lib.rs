pub mod constraint;
pub mod entity;
pub mod persist;
pub mod sketch;

pub use constraint::*;
pub use entity::*;
pub use persist::*;
pub use sketch::*;
