//! Argument and configuration handling of the binary

use super::common::{sample_entries, TestContext};
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let ctx = TestContext::new();
    ctx.packdeploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("install")
                .and(predicate::str::contains("download"))
                .and(predicate::str::contains("unpack"))
                .and(predicate::str::contains("bundle-status"))
                .and(predicate::str::contains("status")),
        );
}

#[test]
fn test_install_requires_files() {
    let ctx = TestContext::new();
    ctx.packdeploy()
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_install_missing_file_fails_before_any_request() {
    let ctx = TestContext::new();
    ctx.packdeploy()
        .env("PACKDEPLOY_PASSWORD", "admin")
        .arg("install")
        .arg(ctx.path().join("missing.zip"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File does not exist"));
}

#[test]
fn test_unsupported_url_is_rejected() {
    let ctx = TestContext::new();
    let package = ctx.create_package("sample.zip", &sample_entries());
    ctx.packdeploy()
        .env("PACKDEPLOY_PASSWORD", "admin")
        .arg("--url")
        .arg("http://localhost:4502/some/other/service")
        .arg("install")
        .arg(&package)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Given URL is not supported"));
}

#[test]
fn test_download_requires_crx() {
    let ctx = TestContext::new();
    let package = ctx.create_package("sample.zip", &sample_entries());
    ctx.packdeploy()
        .arg("--url")
        .arg("http://localhost:9090/bin/cpm/package.service.html")
        .arg("download")
        .arg(&package)
        .arg("--output")
        .arg(ctx.path().join("downloaded.zip"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("only supported for the CRX package manager"));
}

#[test]
fn test_bundle_status_without_url_fails() {
    let ctx = TestContext::new();
    ctx.packdeploy()
        .arg("bundle-status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No bundle_status_url configured"));
}

#[test]
fn test_missing_config_file_fails() {
    let ctx = TestContext::new();
    ctx.packdeploy()
        .arg("--config")
        .arg(ctx.path().join("nope.yaml"))
        .arg("bundle-status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_login_rejects_empty_password() {
    let ctx = TestContext::new();
    ctx.packdeploy()
        .arg("login")
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Password cannot be empty"));
}
