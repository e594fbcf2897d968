// Keytouch Config - Layout Descriptions
// Builds a Layout from a TOML list of rows

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::layout::{
    alphabet_key, backspace_key, comma_key, lang_switch_key, return_key, shift_key, space_key, KeyDef,
    Layout,
};

/// Widths may overshoot a full row by this much before the row is rejected
const WIDTH_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutToml {
    #[serde(default)]
    row: Vec<RowToml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RowToml {
    keys: Vec<KeyToml>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KeyKindToml {
    #[default]
    Text,
    Space,
    Backspace,
    Return,
    Lang,
    Shift,
    Comma,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyToml {
    #[serde(default)]
    kind: KeyKindToml,
    text: Option<String>,
    alt: Option<String>,
    width: Option<f32>,
}

impl KeyToml {
    fn to_key_def(&self, row: usize, index: usize) -> Result<KeyDef, ConfigError> {
        if self.alt.is_some() && !matches!(self.kind, KeyKindToml::Text) {
            return Err(ConfigError::InvalidKey(format!(
                "row {} key {}: only text keys take an alt",
                row, index
            )));
        }
        let key = match self.kind {
            KeyKindToml::Text => {
                let text = self.text.as_deref().filter(|t| !t.is_empty()).ok_or_else(|| {
                    ConfigError::InvalidKey(format!("row {} key {}: text key without text", row, index))
                })?;
                alphabet_key(text, self.alt.as_deref().filter(|a| !a.is_empty()))
            }
            KeyKindToml::Space => space_key(),
            KeyKindToml::Backspace => backspace_key(),
            KeyKindToml::Return => return_key(),
            KeyKindToml::Lang => lang_switch_key(),
            KeyKindToml::Shift => shift_key(),
            KeyKindToml::Comma => comma_key(),
        };
        match self.width {
            None => Ok(key),
            Some(width) if (0.0..=1.0).contains(&width) => Ok(key.with_width(width)),
            Some(width) => Err(ConfigError::OutOfRange(format!(
                "row {} key {}: width {} not in 0..=1",
                row, index, width
            ))),
        }
    }
}

/// Parse a layout description from a TOML string
pub fn parse_layout(content: &str) -> Result<Layout, ConfigError> {
    let description: LayoutToml =
        toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
    if description.row.is_empty() {
        return Err(ConfigError::InvalidLayout("layout has no rows".to_string()));
    }

    let mut rows = Vec::with_capacity(description.row.len());
    for (row_index, row) in description.row.iter().enumerate() {
        if row.keys.is_empty() {
            return Err(ConfigError::InvalidLayout(format!("row {} has no keys", row_index)));
        }
        let keys = row
            .keys
            .iter()
            .enumerate()
            .map(|(index, key)| key.to_key_def(row_index, index))
            .collect::<Result<Vec<_>, _>>()?;
        let used: f32 = keys.iter().map(|k| k.width).sum();
        if used > 1.0 + WIDTH_TOLERANCE {
            return Err(ConfigError::InvalidLayout(format!(
                "row {} widths add up to {}",
                row_index, used
            )));
        }
        rows.push(keys);
    }

    let layout = Layout::new(rows);
    log::debug!(
        "Parsed layout with {} rows and {} keys",
        layout.rows.len(),
        layout.key_count()
    );
    Ok(layout)
}

/// Parse a layout description file
pub fn parse_layout_file<P: AsRef<Path>>(path: P) -> Result<Layout, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_layout(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::KeyAction;
    use crate::layout::KeyKind;

    const SAMPLE: &str = r#"
[[row]]
keys = [
    { text = "q", alt = "1" },
    { text = "w", alt = "2" },
    { kind = "backspace", width = 0.2 },
]

[[row]]
keys = [
    { kind = "lang", width = 0.15 },
    { kind = "comma", width = 0.1 },
    { kind = "space" },
    { kind = "return", width = 0.15 },
]
"#;

    #[test]
    fn test_parse_sample() {
        let layout = parse_layout(SAMPLE).unwrap();
        assert_eq!(layout.rows.len(), 2);
        assert_eq!(layout.key_count(), 7);
        assert_eq!(layout.rows[0][0].label, "q");
        assert_eq!(layout.rows[0][2].kind, KeyKind::Backspace);
        assert_eq!(layout.rows[1][2].kind, KeyKind::Space);
        assert_eq!(layout.widths()[1], vec![0.15, 0.1, 0.0, 0.15]);
        assert_eq!(
            layout.rows[1][0].press_action(),
            Some(&KeyAction::LangSwitch)
        );
    }

    #[test]
    fn test_text_key_needs_text() {
        let err = parse_layout("[[row]]\nkeys = [{ kind = \"text\" }]").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey(_)));
    }

    #[test]
    fn test_alt_only_on_text_keys() {
        let err = parse_layout("[[row]]\nkeys = [{ kind = \"space\", alt = \"x\" }]").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey(_)));
    }

    #[test]
    fn test_rows_must_fit() {
        let err = parse_layout(
            "[[row]]\nkeys = [{ text = \"a\", width = 0.6 }, { text = \"b\", width = 0.6 }]",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLayout(_)));

        let err = parse_layout("[[row]]\nkeys = [{ text = \"a\", width = 1.5 }]").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange(_)));
    }

    #[test]
    fn test_empty_layouts_rejected() {
        assert!(matches!(parse_layout(""), Err(ConfigError::InvalidLayout(_))));
        assert!(matches!(
            parse_layout("[[row]]\nkeys = []"),
            Err(ConfigError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(matches!(
            parse_layout("[[row]]\nkeys = [{ kind = \"emoji\" }]"),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
