//! Project version discovery from a Maven `pom.xml`
use crate::error::{Result, SnapshotError};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::path::Path;

const VERSION_TAG: &[u8] = b"version";

/// Read the project version from a `pom.xml` file.
///
/// # Errors
///
/// Returns [`SnapshotError::ProjectVersion`] if the file cannot be read or holds no
/// usable version.
pub fn read_project_version(pom_path: &Path) -> Result<String> {
    let to_error = |message: String| SnapshotError::ProjectVersion {
        path: pom_path.display().to_string(),
        message,
    };

    let xml = fs::read_to_string(pom_path).map_err(|e| to_error(e.to_string()))?;
    let version = parse_project_version(&xml).map_err(to_error)?;

    debug!("Project version {version} from {}", pom_path.display());
    Ok(version)
}

/// Text of the first `<version>` element in document order.
///
/// Matches the element wherever it is nested, so a `<parent>` block that precedes the
/// project's own coordinates supplies the version.
///
/// # Errors
///
/// Returns a description of the problem when the XML is malformed, has no `<version>`
/// element, or the first one is empty.
pub fn parse_project_version(xml: &str) -> std::result::Result<String, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == VERSION_TAG => {
                let version = match reader.read_event_into(&mut buf) {
                    Ok(Event::Text(text)) => String::from_utf8_lossy(&text).trim().to_string(),
                    Ok(_) => String::new(),
                    Err(e) => return Err(format!("XML parsing error: {e}")),
                };
                if version.is_empty() {
                    return Err("first <version> element is empty".to_string());
                }
                return Ok(version);
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == VERSION_TAG => {
                return Err("first <version> element is empty".to_string());
            }
            Ok(Event::Eof) => return Err("no <version> element found".to_string()),
            Err(e) => return Err(format!("XML parsing error: {e}")),
            _ => {}
        }
        buf.clear();
    }
}
