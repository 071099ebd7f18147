//! HTTP plumbing shared by installers, downloader and bundle status checks.

pub mod response;
pub mod retry;
pub mod transport;

pub use response::{ResponseClassifier, ResponseOutcome, PACKAGE_EXISTS_PREFIX};
pub use retry::RetryPolicy;
pub use transport::{Credentials, HttpResponse, Transport};

/// Percent-encode each segment of a repository path, keeping the slashes
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
