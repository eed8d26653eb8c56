//! Clip production: trimming and fixed-duration segmentation

pub mod splitter;
pub mod trimmer;

pub use splitter::{clip_count, split_into_clips};
pub use trimmer::{probe_duration_secs, trim_segment};
