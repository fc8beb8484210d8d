//! File-extension-driven document serialization.
//!
//! `.json` writes pretty-printed JSON; `.yaml`/`.yml` (and any other
//! extension) write YAML. Output files are created with Unix mode `0o600`
//! since a generated document may embed example values or server URLs drawn
//! from internal configuration.

use std::fs::OpenOptions;
use std::io::BufWriter;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use oasforge_core::Document;

use crate::error::{Error, Result};

/// Serialize `document` to `path`, choosing JSON or YAML by file extension.
pub fn write_document(document: &Document, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    let mut writer = BufWriter::new(file);

    match extension.as_deref() {
        Some("json") => serde_json::to_writer_pretty(&mut writer, document)?,
        Some("yaml") | Some("yml") => serde_yaml_ng::to_writer(&mut writer, document)?,
        _ => {
            return Err(Error::UnrecognizedExtension {
                extension: extension.unwrap_or_default(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasforge_core::Info;

    fn sample_document() -> Document {
        Document {
            oas_version: oasforge_core::OasVersion::V3_1,
            swagger: None,
            openapi: Some("3.1.1".to_owned()),
            info: Info {
                title: "Sample".to_owned(),
                version: "1.0.0".to_owned(),
                ..Info::default()
            },
            servers: Vec::new(),
            host: None,
            base_path: None,
            schemes: Vec::new(),
            paths: indexmap::IndexMap::new(),
            webhooks: indexmap::IndexMap::new(),
            tags: Vec::new(),
            security: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            definitions: None,
            parameters: None,
            responses: None,
            security_definitions: None,
            components: None,
            external_docs: None,
            extensions: indexmap::IndexMap::new(),
        }
    }

    #[test]
    fn writes_json_for_json_extension() {
        let dir = std::env::temp_dir().join("oasforge-openapi-output-test-json");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("doc.json");

        write_document(&sample_document(), &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"title\": \"Sample\""));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn writes_yaml_for_yaml_extension() {
        let dir = std::env::temp_dir().join("oasforge-openapi-output-test-yaml");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("doc.yaml");

        write_document(&sample_document(), &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("title: Sample"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unrecognized_extension_is_an_error() {
        let dir = std::env::temp_dir().join("oasforge-openapi-output-test-bad-ext");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("doc.txt");

        let result = write_document(&sample_document(), &path);
        assert!(matches!(result, Err(Error::UnrecognizedExtension { .. })));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn output_file_has_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join("oasforge-openapi-output-test-perms");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("doc.json");

        write_document(&sample_document(), &path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        std::fs::remove_dir_all(&dir).ok();
    }
}
