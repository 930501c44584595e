//! Declarative constraint configuration (YAML/TOML formats).
//!
//! This crate reads constraint documents describing class configurations
//! and constraint sets, and serves them to the engine through
//! [`FileConfigurer`].
//!
//! # Example
//!
//! ```rust
//! use constraints_parser::parse_yaml;
//!
//! let yaml = r#"
//! classes:
//!   - class: Person
//!     fields:
//!       - name: email
//!         checks:
//!           - type: not_null
//!           - type: email
//!             message: "{context} must be an email address"
//! constraint_sets:
//!   - id: code
//!     checks:
//!       - type: pattern
//!         pattern: "[A-Z]{3}[0-9]{4}"
//! "#;
//!
//! let document = parse_yaml(yaml).expect("Failed to parse constraints");
//! assert_eq!(document.classes[0].class, "Person");
//! assert_eq!(document.constraint_sets[0].id, "code");
//! ```

mod configurer;
mod document;

pub use configurer::*;
pub use document::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reading constraint documents.
#[derive(Debug, Error)]
pub enum ParserError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,

    /// A check definition cannot be turned into a check
    #[error("Invalid check at {location}: {reason}")]
    InvalidCheck { location: String, reason: String },
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// Parse a constraints document from a YAML string.
pub fn parse_yaml(content: &str) -> Result<ConstraintsDocument> {
    let document: ConstraintsDocument = serde_yaml_ng::from_str(content)?;
    debug!(
        "Parsed YAML document: {} class(es), {} constraint set(s)",
        document.classes.len(),
        document.constraint_sets.len()
    );
    Ok(document)
}

/// Parse a constraints document from a TOML string.
///
/// # Example
///
/// ```rust
/// use constraints_parser::parse_toml;
///
/// let toml = r#"
/// [[classes]]
/// class = "Person"
///
/// [[classes.fields]]
/// name = "age"
/// checks = [{ type = "range", min = 0, max = 150 }]
/// "#;
///
/// let document = parse_toml(toml).unwrap();
/// assert_eq!(document.classes[0].fields[0].name, "age");
/// ```
pub fn parse_toml(content: &str) -> Result<ConstraintsDocument> {
    let document: ConstraintsDocument =
        toml::from_str(content).map_err(|e| ParserError::TomlError(e.to_string()))?;
    debug!(
        "Parsed TOML document: {} class(es), {} constraint set(s)",
        document.classes.len(),
        document.constraint_sets.len()
    );
    Ok(document)
}

/// Detect the document format from a file path based on its extension.
///
/// # Supported Extensions
///
/// * `.yaml`, `.yml` → `DocumentFormat::Yaml`
/// * `.toml` → `DocumentFormat::Toml`
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<DocumentFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(DocumentFormat::Yaml),
        "toml" => Ok(DocumentFormat::Toml),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a constraints document from a file with automatic format detection.
///
/// ```no_run
/// use constraints_parser::parse_file;
/// use std::path::Path;
///
/// let document = parse_file(Path::new("constraints/person.yml")).unwrap();
/// println!("Loaded {} class configuration(s)", document.classes.len());
/// ```
pub fn parse_file(path: &Path) -> Result<ConstraintsDocument> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        DocumentFormat::Yaml => parse_yaml(&content),
        DocumentFormat::Toml => parse_toml(&content),
    }
}
