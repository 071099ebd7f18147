use crate::core::{PackMgrError, PackMgrResult, PackageCoordinate};
use crate::xml;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// Archive entry holding the package metadata
pub const PROPERTIES_ENTRY: &str = "META-INF/vault/properties.xml";

/// Read `META-INF/vault/properties.xml` as a key/value map
///
/// Returns an empty map when the archive carries no properties entry.
pub fn read_properties(archive_path: &Path) -> PackMgrResult<BTreeMap<String, String>> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        PackMgrError::Unpack(format!("Invalid package {}: {}", archive_path.display(), e))
    })?;

    let mut content = String::new();
    match archive.by_name(PROPERTIES_ENTRY) {
        Ok(mut entry) if entry.is_file() => {
            entry.read_to_string(&mut content)?;
        }
        Ok(_) | Err(ZipError::FileNotFound) => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(PackMgrError::Unpack(format!(
                "Failed to read {} from {}: {}",
                PROPERTIES_ENTRY,
                archive_path.display(),
                e
            )))
        }
    }

    parse_properties(&content)
}

/// Parse the XML properties format (`<entry key="...">value</entry>`)
pub fn parse_properties(content: &str) -> PackMgrResult<BTreeMap<String, String>> {
    let root = xml::parse(content)?;
    Ok(root
        .child_elements()
        .filter(|e| e.name == "entry")
        .filter_map(|e| e.attribute("key").map(|key| (key.to_string(), e.text())))
        .collect())
}

/// Resolve group, name and version of a package file
pub fn read_coordinate(archive_path: &Path) -> PackMgrResult<PackageCoordinate> {
    let props = read_properties(archive_path)?;
    let value = |key: &str| props.get(key).map(|v| v.trim().to_string()).unwrap_or_default();

    let name = value("name");
    if name.is_empty() {
        return Err(PackMgrError::parse(
            format!("{} in {}", PROPERTIES_ENTRY, archive_path.display()),
            "package name is missing",
        ));
    }
    Ok(PackageCoordinate::new(value("group"), name, value("version")))
}

/// Write a minimal package archive carrying `properties.xml`
#[cfg(test)]
pub(crate) fn write_test_package(
    dir: &Path,
    coordinate: &PackageCoordinate,
) -> std::path::PathBuf {
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    let path = dir.join(format!("{}-{}.zip", coordinate.name, coordinate.version));
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    zip.start_file(PROPERTIES_ENTRY, FileOptions::default()).unwrap();
    write!(
        zip,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<properties>\n\
         <entry key=\"group\">{}</entry>\n<entry key=\"name\">{}</entry>\n\
         <entry key=\"version\">{}</entry>\n</properties>\n",
        coordinate.group, coordinate.name, coordinate.version
    )
    .unwrap();
    zip.start_file("jcr_root/.content.xml", FileOptions::default()).unwrap();
    zip.write_all(b"<jcr:root xmlns:jcr=\"http://www.jcp.org/jcr/1.0\"/>").unwrap();
    zip.finish().unwrap();
    path
}
