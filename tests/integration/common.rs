//! Common utilities for integration tests

use assert_cmd::Command;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Isolated environment so the user's own config file is never read
pub struct TestContext {
    pub temp: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("config")).unwrap();
        Self { temp }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Command for running packdeploy with config dirs pointing into the temp dir
    pub fn packdeploy(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("packdeploy").unwrap();
        cmd.current_dir(self.path());

        let config_dir = self.path().join("config");
        if cfg!(target_os = "windows") {
            cmd.env("APPDATA", &config_dir);
            cmd.env("USERPROFILE", self.path());
        } else if cfg!(target_os = "linux") {
            cmd.env("XDG_CONFIG_HOME", &config_dir);
            cmd.env("HOME", self.path());
        } else {
            cmd.env("HOME", self.path());
        }
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.path().join("packdeploy.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Zip the given entries into `name` inside the temp dir
    pub fn create_package(&self, name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = self.path().join(name);
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        for (entry, content) in entries {
            writer.start_file(*entry, FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        path
    }
}

pub const PROPERTIES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!DOCTYPE properties SYSTEM "http://java.sun.com/dtd/properties.dtd">
<properties>
<entry key="group">adaptto</entry>
<entry key="name">sample</entry>
<entry key="version">1.0.0</entry>
</properties>
"#;

pub const PAGE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<jcr:root xmlns:jcr="http://www.jcp.org/jcr/1.0"
    jcr:primaryType="cq:Page">
    <jcr:content
        jcr:primaryType="cq:PageContent"
        jcr:created="{Date}2024-01-01T00:00:00.000+01:00"
        jcr:title="Sample"/>
</jcr:root>
"#;

/// A small content package with vault metadata and one page
pub fn sample_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        ("META-INF/vault/properties.xml", PROPERTIES_XML),
        ("META-INF/vault/filter.xml", "<workspaceFilter version=\"1.0\"/>"),
        ("jcr_root/content/sample/en/.content.xml", PAGE_XML),
        ("jcr_root/content/dam/sample/asset.txt", "asset"),
    ]
}
