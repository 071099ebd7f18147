//! Packdeploy: deploy content packages to a content repository server
//!
//! This crate provides the packdeploy library, re-exporting the error
//! taxonomy and value types from `packdeploy-core` and organizing the
//! upload, install, download and unpack workflows around them.

pub use packdeploy_core::{
    CredentialStore, PackMgrError, PackMgrResult, PackageCoordinate, PackageFile,
};

/// Core module re-exported from packdeploy-core.
pub mod core {
    pub use packdeploy_core::core::*;
    pub use packdeploy_core::*;

    /// Path module re-exported from packdeploy-core.
    pub mod path {
        pub use packdeploy_core::core::path::*;
    }
}

/// Configuration management.
pub mod config;

/// Regex pattern lists used by bundle and unpack filters.
pub mod filter;

/// HTTP transport, retries and response classification.
pub mod http;

/// XML tree parsing and document-view writing.
pub mod xml;

/// OSGi bundle status parsing and activation wait.
pub mod bundle;

/// Package upload and install.
pub mod install;

/// Package download from the server.
pub mod download;

/// Package extraction with exclusion rules.
pub mod unpack;

/// Package archive metadata.
pub mod package;
