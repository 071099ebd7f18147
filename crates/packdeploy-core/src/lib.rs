//! Core utilities for packdeploy
//!
//! Shared error taxonomy, package value types, credential storage and
//! platform paths used by the `packdeploy` library and binary.

pub mod core;
pub mod package;

pub use crate::core::{CredentialStore, PackMgrError, PackMgrResult};
pub use crate::package::{PackageCoordinate, PackageFile};
