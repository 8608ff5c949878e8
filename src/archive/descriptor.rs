//! Descriptor entry reading from web archives.
//!
//! Each archive may carry up to four well-known entries under `META-INF/`,
//! one per extension kind, each a newline-delimited listing of component
//! type coordinates (or content types for the viewer entry).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::extension::UiExtensionType;

/// Well-known descriptor entries and the extension kind each declares.
const DESCRIPTOR_ENTRIES: &[(&str, UiExtensionType)] = &[
    ("META-INF/flowhost-content-viewer", UiExtensionType::ContentViewer),
    (
        "META-INF/flowhost-processor-configuration",
        UiExtensionType::ProcessorConfiguration,
    ),
    (
        "META-INF/flowhost-controller-service-configuration",
        UiExtensionType::ControllerServiceConfiguration,
    ),
    (
        "META-INF/flowhost-reporting-task-configuration",
        UiExtensionType::ReportingTaskConfiguration,
    ),
];

/// Identify every UI extension an archive declares.
///
/// An archive that cannot be opened or read yields an empty result and a
/// warning; discovery of other archives must never be affected.
pub fn identify_ui_extensions(archive: &Path) -> HashMap<UiExtensionType, Vec<String>> {
    match read_ui_extensions(archive) {
        Ok(extensions) => extensions,
        Err(e) => {
            tracing::warn!(
                archive = %archive.display(),
                error = %e,
                "Unable to inspect archive for UI extensions"
            );
            HashMap::new()
        }
    }
}

fn read_ui_extensions(
    archive: &Path,
) -> Result<HashMap<UiExtensionType, Vec<String>>, Box<dyn std::error::Error>> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;

    let mut extensions = HashMap::new();
    for (entry_name, kind) in DESCRIPTOR_ENTRIES {
        let mut entry = match zip.by_name(entry_name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => continue,
            Err(e) => return Err(e.into()),
        };

        let mut listing = String::new();
        entry.read_to_string(&mut listing)?;

        for line in listing.lines() {
            if let Some(component_type) = extract_component_type(line) {
                extensions
                    .entry(*kind)
                    .or_insert_with(Vec::new)
                    .push(component_type.to_string());
            }
        }
    }
    Ok(extensions)
}

/// Extract the component type from a descriptor line. Trims the line and
/// honors comments: a leading `#` drops the whole line, an embedded `#`
/// truncates at the comment. Returns None when nothing remains.
fn extract_component_type(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let value = match trimmed.find('#') {
        Some(index) => trimmed[..index].trim_end(),
        None => trimmed,
    };
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn archive_with_entries(entries: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        file
    }

    #[test]
    fn trailing_comment_is_stripped() {
        assert_eq!(
            extract_component_type("org.example.Bar # custom UI"),
            Some("org.example.Bar")
        );
    }

    #[test]
    fn full_line_comment_yields_nothing() {
        assert_eq!(extract_component_type("# org.example.Baz"), None);
        assert_eq!(extract_component_type("   # indented"), None);
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(extract_component_type(""), None);
        assert_eq!(extract_component_type("   "), None);
    }

    #[test]
    fn plain_coordinate_is_trimmed() {
        assert_eq!(
            extract_component_type("  org.example.Foo  "),
            Some("org.example.Foo")
        );
    }

    #[test]
    fn reads_all_descriptor_kinds() {
        let archive = archive_with_entries(&[
            (
                "META-INF/flowhost-processor-configuration",
                "org.example.Foo\n# comment\norg.example.Bar # inline\n",
            ),
            ("META-INF/flowhost-content-viewer", "application/json\n"),
            ("index.html", "<html></html>"),
        ]);

        let extensions = identify_ui_extensions(archive.path());
        assert_eq!(
            extensions[&UiExtensionType::ProcessorConfiguration],
            vec!["org.example.Foo".to_string(), "org.example.Bar".to_string()]
        );
        assert_eq!(
            extensions[&UiExtensionType::ContentViewer],
            vec!["application/json".to_string()]
        );
        assert!(!extensions.contains_key(&UiExtensionType::ReportingTaskConfiguration));
    }

    #[test]
    fn archive_without_descriptors_yields_empty_map() {
        let archive = archive_with_entries(&[("static/app.js", "console.log(1)")]);
        assert!(identify_ui_extensions(archive.path()).is_empty());
    }

    #[test]
    fn unreadable_archive_yields_empty_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not a zip archive").unwrap();

        assert!(identify_ui_extensions(file.path()).is_empty());
    }
}
