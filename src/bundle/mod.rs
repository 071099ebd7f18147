//! Bundle health snapshots from the OSGi web console.

pub mod parser;
pub mod status;
pub mod wait;

pub use parser::BundleStatusParser;
pub use status::{BundleEntry, BundleStatus};
pub use wait::BundleStatusChecker;
