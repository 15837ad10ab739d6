//! Key and value presentation for inspector rows

use serde_json::Value;

/// Keys shown but never edited
const READ_ONLY_KEYS: &[&str] = &["id", "type"];

/// A value as rendered in a property row
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedValue {
    /// Editable text input; holds the current draft
    Input(String),
    /// Editable on/off switch
    Switch(bool),
    /// Read-only text
    Text(String),
}

impl RenderedValue {
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Switch(_))
    }

    pub fn display(&self) -> String {
        match self {
            Self::Input(text) | Self::Text(text) => text.clone(),
            Self::Switch(true) => "on".to_string(),
            Self::Switch(false) => "off".to_string(),
        }
    }
}

/// Presentation label for a raw key: `visibleToPublicUsers` becomes
/// `Visible To Public Users`, `_html_class` becomes `Html Class`.
pub fn format_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in key.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a raw value for `key`
pub fn format_value(key: &str, raw: &Value) -> RenderedValue {
    let rendered = match raw {
        Value::Null => RenderedValue::Input(String::new()),
        Value::String(s) => RenderedValue::Input(s.clone()),
        Value::Number(n) => RenderedValue::Input(n.to_string()),
        Value::Bool(b) => RenderedValue::Switch(*b),
        Value::Array(_) | Value::Object(_) => RenderedValue::Text(raw.to_string()),
    };

    if READ_ONLY_KEYS.contains(&key) {
        RenderedValue::Text(rendered.display())
    } else {
        rendered
    }
}

/// Value to send when committing `text` for a field whose fetched value was
/// `original`. Numeric fields stay numeric when the text still parses.
pub fn commit_value(original: &Value, text: &str) -> Value {
    match original {
        Value::Number(_) => {
            let trimmed = text.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Value::from(i);
            }
            if let Some(n) = trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                return Value::Number(n);
            }
            Value::String(text.to_string())
        }
        Value::Null if text.is_empty() => Value::Null,
        _ => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_spaced_and_capitalised() {
        assert_eq!(format_key("visibleToPublicUsers"), "Visible To Public Users");
        assert_eq!(format_key("_html_class"), "Html Class");
        assert_eq!(format_key("created_by"), "Created By");
        assert_eq!(format_key("id"), "Id");
        assert_eq!(format_key("h1Title"), "H1 Title");
    }

    #[test]
    fn values_by_shape() {
        assert_eq!(format_value("name", &json!("Foo")), RenderedValue::Input("Foo".into()));
        assert_eq!(format_value("size", &json!(42)), RenderedValue::Input("42".into()));
        assert_eq!(format_value("hidden", &json!(true)), RenderedValue::Switch(true));
        assert_eq!(format_value("tags", &json!(["a"])), RenderedValue::Text("[\"a\"]".into()));
        assert_eq!(format_value("owner", &Value::Null), RenderedValue::Input(String::new()));
    }

    #[test]
    fn identity_keys_are_read_only() {
        let id = format_value("id", &json!("abc"));
        assert_eq!(id, RenderedValue::Text("abc".into()));
        assert!(!id.is_editable());
        assert!(!format_value("type", &json!("Folder")).is_editable());
    }

    #[test]
    fn commit_keeps_numbers_numeric() {
        assert_eq!(commit_value(&json!(3), "7"), json!(7));
        assert_eq!(commit_value(&json!(1.5), "2.25"), json!(2.25));
        assert_eq!(commit_value(&json!(3), "seven"), json!("seven"));
        assert_eq!(commit_value(&json!("a"), "12"), json!("12"));
        assert_eq!(commit_value(&Value::Null, ""), Value::Null);
    }
}
