//! Live progress fan-out

pub mod hub;

pub use hub::{ProgressEvent, ProgressHub};
