//! Content package archive metadata.

pub mod properties;

pub use properties::{read_coordinate, read_properties};
