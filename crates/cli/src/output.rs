//! Human and JSON renderings of the hand-off result.

use anyhow::Result;
use keysource_types::KeySource;
use keysource_util::{KeyMaterial, redact_key_text};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Report<'a> {
    source: &'a KeySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a KeyMaterial>,
}

/// JSON object with the key source and, when inspected, the key summary.
pub fn render_json(source: &KeySource, material: Option<&KeyMaterial>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Report { source, key: material })?)
}

/// A short summary for people. Manual key text is redacted.
pub fn render_human(source: &KeySource, material: Option<&KeyMaterial>) -> String {
    let mut lines = vec![match source {
        KeySource::FromFile(path) => format!("Key source: file {}", path.display()),
        KeySource::Manual(text) => format!("Key source: manual ({} chars) {}", text.chars().count(), first_line(text)),
    }];

    if let Some(material) = material {
        let mut summary = format!(
            "Key: {} {} key ({}), {} bytes",
            material.format, material.kind, material.label, material.body_len
        );
        if material.encrypted {
            summary.push_str(", passphrase protected");
        }
        if let Some(comment) = &material.comment {
            summary.push_str(&format!(", comment \"{comment}\""));
        }
        lines.push(summary);
    }
    lines.join("\n")
}

fn first_line(text: &str) -> String {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or_default();
    redact_key_text(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keysource_util::{KeyFormat, KeyKind};
    use std::path::PathBuf;

    fn public_material() -> KeyMaterial {
        KeyMaterial {
            kind: KeyKind::Public,
            format: KeyFormat::OpenSsh,
            label: "ssh-ed25519".into(),
            encrypted: false,
            body_len: 51,
            comment: Some("me@host".into()),
        }
    }

    #[test]
    fn human_output_redacts_manual_text() {
        let source = KeySource::Manual("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIOMqqnkVzrm0 me@host".into());
        let text = render_human(&source, Some(&public_material()));
        assert!(text.starts_with("Key source: manual"));
        assert!(text.contains("<redacted>"));
        assert!(!text.contains("AAAAC3NzaC1lZDI1NTE5"));
        assert!(text.contains("Key: OpenSSH public key (ssh-ed25519), 51 bytes, comment \"me@host\""));
    }

    #[test]
    fn json_output_carries_mode_and_value() {
        let source = KeySource::FromFile(PathBuf::from("/keys/id.pem"));
        let value: serde_json::Value = serde_json::from_str(&render_json(&source, None).unwrap()).unwrap();
        assert_eq!(value["source"]["mode"], "from_file");
        assert_eq!(value["source"]["value"], "/keys/id.pem");
        assert!(value.get("key").is_none());
    }
}
