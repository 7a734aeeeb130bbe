#![forbid(unsafe_code)]

pub mod calendar;
pub mod ids;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod reorder;
pub mod stats;
