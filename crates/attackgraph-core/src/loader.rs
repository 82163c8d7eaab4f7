//! Boundary conversion from configuration text to typed entities.
//!
//! Documents arrive as JSON, TOML or YAML text with six top-level
//! collections. They are deserialised straight into [`EntitySet`] and then
//! validated, so nothing downstream ever sees an untyped map.

use config::{Config, File, FileFormat};

use crate::error::{CoreError, Result};
use crate::types::EntitySet;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Toml,
    Yaml,
}

impl InputFormat {
    /// Guess the format from the document text.
    ///
    /// JSON starts with `{` or `[`; TOML has a `[table]` or `[[array]]`
    /// header line or a `key = value` line; anything else is read as YAML.
    pub fn detect(text: &str) -> Self {
        let trimmed = text.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') && !looks_like_toml(trimmed) {
            return InputFormat::Json;
        }
        if looks_like_toml(trimmed) {
            InputFormat::Toml
        } else {
            InputFormat::Yaml
        }
    }

    /// Parse a format name such as `json`, `toml`, `yaml` or `yml`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "json" => Some(InputFormat::Json),
            "toml" => Some(InputFormat::Toml),
            "yaml" | "yml" => Some(InputFormat::Yaml),
            _ => None,
        }
    }
}

fn looks_like_toml(text: &str) -> bool {
    text.lines().map(str::trim).any(|line| {
        let is_header = (line.starts_with("[[") && line.ends_with("]]"))
            || (line.starts_with('[')
                && line.ends_with(']')
                && line[1..line.len() - 1]
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '.'));
        let is_assignment = line
            .split_once('=')
            .map(|(key, _)| {
                let key = key.trim();
                !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_')
            })
            .unwrap_or(false);
        is_header || is_assignment
    })
}

/// Parse and validate an entity document in the given format.
pub fn parse_entities(text: &str, format: InputFormat) -> Result<EntitySet> {
    let set: EntitySet = match format {
        InputFormat::Json => serde_json::from_str(text)?,
        InputFormat::Toml => from_config_text(text, FileFormat::Toml)?,
        InputFormat::Yaml => from_config_text(text, FileFormat::Yaml)?,
    };
    validate(&set)?;

    tracing::debug!(
        hosts = set.hosts.len(),
        vulnerabilities = set.vulnerabilities.len(),
        privileges = set.privileges.len(),
        services = set.services.len(),
        exploits = set.exploits.len(),
        network_edges = set.network_edges.len(),
        "Loaded entity document"
    );
    Ok(set)
}

/// Parse an entity document, detecting its format.
pub fn parse_entities_auto(text: &str) -> Result<EntitySet> {
    parse_entities(text, InputFormat::detect(text))
}

fn from_config_text(text: &str, format: FileFormat) -> Result<EntitySet> {
    let cfg = Config::builder()
        .add_source(File::from_str(text, format))
        .build()?;
    Ok(cfg.try_deserialize()?)
}

/// Field-level checks that serde cannot express.
///
/// Cross-references are checked later by the graph builder, which owns the
/// node namespace.
pub fn validate(set: &EntitySet) -> Result<()> {
    for entity in set.entities() {
        if entity.id().trim().is_empty() {
            return Err(CoreError::InvalidField {
                entity_id: format!("<{}>", entity.kind()),
                field: "id",
                reason: "must not be empty".to_string(),
            });
        }
    }

    for vuln in &set.vulnerabilities {
        if !vuln.severity.is_finite() || !(0.0..=10.0).contains(&vuln.severity) {
            return Err(CoreError::InvalidField {
                entity_id: vuln.id.clone(),
                field: "severity",
                reason: format!("{} is outside 0.0–10.0", vuln.severity),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrivilegeLevel;

    const JSON_DOC: &str = r#"{
        "hosts": [{"id": "attacker", "label": "Attacker"}, {"id": "web", "zone": "dmz"}],
        "vulnerabilities": [{"id": "cve1", "severity": 9.8, "affected_host": "web"}],
        "privileges": [{"id": "root_web", "level": "root", "host": "web"}],
        "network_edges": [{"from": "attacker", "to": "web"}]
    }"#;

    const TOML_DOC: &str = r#"
[[hosts]]
id = "attacker"

[[hosts]]
id = "web"
zone = "dmz"

[[vulnerabilities]]
id = "cve1"
severity = 9
affected_host = "web"

[[privileges]]
id = "root_web"
level = "root"
host = "web"

[[network_edges]]
from = "attacker"
to = "web"
"#;

    const YAML_DOC: &str = r#"
hosts:
  - id: attacker
  - id: web
    zone: dmz
vulnerabilities:
  - id: cve1
    severity: 9.8
    affected_host: web
privileges:
  - id: root_web
    level: root
    host: web
network_edges:
  - from: attacker
    to: web
"#;

    #[test]
    fn test_detect_format() {
        assert_eq!(InputFormat::detect(JSON_DOC), InputFormat::Json);
        assert_eq!(InputFormat::detect(TOML_DOC), InputFormat::Toml);
        assert_eq!(InputFormat::detect(YAML_DOC), InputFormat::Yaml);
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(InputFormat::from_name("JSON"), Some(InputFormat::Json));
        assert_eq!(InputFormat::from_name("yml"), Some(InputFormat::Yaml));
        assert_eq!(InputFormat::from_name("toml"), Some(InputFormat::Toml));
        assert_eq!(InputFormat::from_name("xml"), None);
    }

    #[test]
    fn test_parse_json() {
        let set = parse_entities(JSON_DOC, InputFormat::Json).unwrap();
        assert_eq!(set.hosts.len(), 2);
        assert_eq!(set.hosts[0].label, "Attacker");
        assert_eq!(set.hosts[1].zone.as_deref(), Some("dmz"));
        assert_eq!(set.privileges[0].level, PrivilegeLevel::Root);
        assert!(set.services.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let set = parse_entities_auto(TOML_DOC).unwrap();
        assert_eq!(set.hosts.len(), 2);
        assert!((set.vulnerabilities[0].severity - 9.0).abs() < f64::EPSILON);
        assert_eq!(set.network_edges[0].from, "attacker");
        assert_eq!(set.network_edges[0].to, "web");
    }

    #[test]
    fn test_parse_yaml() {
        let set = parse_entities_auto(YAML_DOC).unwrap();
        assert_eq!(set.hosts.len(), 2);
        assert_eq!(set.privileges[0].host.as_deref(), Some("web"));
        assert_eq!(set.vulnerabilities[0].affected_host, "web");
    }

    #[test]
    fn test_severity_out_of_range_rejected() {
        let doc = r#"{"hosts": [{"id": "h"}],
            "vulnerabilities": [{"id": "v", "severity": 11.0, "affected_host": "h"}]}"#;
        let err = parse_entities(doc, InputFormat::Json).unwrap_err();
        match err {
            CoreError::InvalidField {
                entity_id, field, ..
            } => {
                assert_eq!(entity_id, "v");
                assert_eq!(field, "severity");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_id_rejected() {
        let doc = r#"{"hosts": [{"id": "  "}]}"#;
        let err = parse_entities(doc, InputFormat::Json).unwrap_err();
        assert!(matches!(err, CoreError::InvalidField { field: "id", .. }));
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let doc = r#"{"vulnerabilities": [{"id": "v", "severity": 5.0}]}"#;
        let err = parse_entities(doc, InputFormat::Json).unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }
}
