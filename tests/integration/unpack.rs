//! Tests for `packdeploy unpack`

use super::common::{sample_entries, TestContext, PAGE_XML};
use predicates::prelude::*;
use std::fs;

#[test]
fn test_unpack_without_rules_copies_everything() {
    let ctx = TestContext::new();
    let package = ctx.create_package("sample.zip", &sample_entries());
    let out = ctx.path().join("out");

    ctx.packdeploy()
        .arg("unpack")
        .arg(&package)
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Unpacked 4 file(s)"));

    assert!(out.join("META-INF/vault/properties.xml").is_file());
    assert_eq!(
        fs::read_to_string(out.join("jcr_root/content/sample/en/.content.xml")).unwrap(),
        PAGE_XML
    );
}

#[test]
fn test_unpack_applies_configured_rules() {
    let ctx = TestContext::new();
    let package = ctx.create_package("sample.zip", &sample_entries());
    let out = ctx.path().join("out");
    let config = ctx.write_config(
        r#"unpack:
  exclude_files:
    - "^META-INF/.*"
  exclude_nodes:
    - "^/content/dam/.*"
  exclude_properties:
    - "jcr\\:created"
  mark_replication_activated: true
  replicated_by: deployer
"#,
    );

    ctx.packdeploy()
        .arg("--config")
        .arg(&config)
        .arg("unpack")
        .arg(&package)
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 excluded"));

    assert!(!out.join("META-INF").exists());
    assert!(!out.join("jcr_root/content/dam/sample").exists());

    let page = fs::read_to_string(out.join("jcr_root/content/sample/en/.content.xml")).unwrap();
    assert!(!page.contains("jcr:created"));
    assert!(page.contains("cq:lastReplicatedBy=\"deployer\""));
    assert!(page.contains("cq:lastReplicationAction=\"Activate\""));
}

#[test]
fn test_unpack_reports_malformed_descriptor() {
    let ctx = TestContext::new();
    let package = ctx.create_package(
        "broken.zip",
        &[("jcr_root/content/broken/.content.xml", "<jcr:root><open></jcr:root>")],
    );
    let out = ctx.path().join("out");
    let config = ctx.write_config("unpack:\n  exclude_properties:\n    - \"jcr\\\\:created\"\n");

    ctx.packdeploy()
        .arg("--config")
        .arg(&config)
        .arg("unpack")
        .arg(&package)
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("malformed descriptor copied unchanged"));

    assert_eq!(
        fs::read_to_string(out.join("jcr_root/content/broken/.content.xml")).unwrap(),
        "<jcr:root><open></jcr:root>"
    );
}

#[test]
fn test_unpack_corrupt_archive_fails() {
    let ctx = TestContext::new();
    let package = ctx.path().join("corrupt.zip");
    fs::write(&package, "not a zip").unwrap();

    ctx.packdeploy()
        .arg("unpack")
        .arg(&package)
        .arg(ctx.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unpack error: Invalid package archive"));
}

#[test]
fn test_unpack_invalid_pattern_fails() {
    let ctx = TestContext::new();
    let package = ctx.create_package("sample.zip", &sample_entries());
    let config = ctx.write_config("unpack:\n  exclude_files:\n    - \"[unclosed\"\n");

    ctx.packdeploy()
        .arg("--config")
        .arg(&config)
        .arg("unpack")
        .arg(&package)
        .arg(ctx.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid regexp pattern"));
}
