//! Theme registered once per session
//!
//! Accepts a `devup.json` document (`{"theme": {...}}`) or the bare theme
//! object.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SheetError, SheetResult};

pub const DEFAULT_BREAKPOINTS: [u32; 5] = [0, 480, 768, 992, 1280];

fn default_breakpoints() -> Vec<u32> {
    DEFAULT_BREAKPOINTS.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// mode -> color name -> value
    #[serde(default)]
    pub colors: BTreeMap<String, BTreeMap<String, String>>,
    /// name -> style object, or an array of style objects per breakpoint
    #[serde(default)]
    pub typography: BTreeMap<String, Value>,
    #[serde(default)]
    pub tokens: BTreeMap<String, Value>,
    #[serde(default = "default_breakpoints")]
    pub breakpoints: Vec<u32>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: BTreeMap::new(),
            typography: BTreeMap::new(),
            tokens: BTreeMap::new(),
            breakpoints: default_breakpoints(),
        }
    }
}

impl Theme {
    pub fn from_json(text: &str) -> SheetResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SheetError::Theme(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> SheetResult<Self> {
        let value = match value {
            Value::Object(mut map) if map.contains_key("theme") => {
                map.remove("theme").unwrap_or(Value::Null)
            }
            Value::Null => return Ok(Self::default()),
            other => other,
        };
        let theme: Theme =
            serde_json::from_value(value).map_err(|e| SheetError::Theme(e.to_string()))?;
        theme.validate()?;
        Ok(theme)
    }

    fn validate(&self) -> SheetResult<()> {
        if self.breakpoints.is_empty() {
            return Err(SheetError::Theme("breakpoints must not be empty".into()));
        }
        if self.breakpoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SheetError::Theme(format!(
                "breakpoints must be strictly ascending, got {:?}",
                self.breakpoints
            )));
        }
        Ok(())
    }

    /// `light` when present, otherwise the first mode in sorted order
    pub fn default_mode(&self) -> Option<&str> {
        if self.colors.contains_key("light") {
            return Some("light");
        }
        self.colors.keys().next().map(String::as_str)
    }

    pub fn breakpoint(&self, level: u8) -> Option<u32> {
        self.breakpoints.get(level as usize).copied()
    }

    pub fn typography(&self, name: &str) -> Option<&Value> {
        self.typography.get(name)
    }

    fn is_color(&self, name: &str) -> bool {
        self.colors.values().any(|mode| mode.contains_key(name))
    }

    /// Value for `$name`: colors become custom-property references, plain
    /// tokens their literal value
    pub fn resolve_token(&self, name: &str) -> Option<String> {
        if self.is_color(name) {
            return Some(format!("var({})", css_var_name(name)));
        }
        match self.tokens.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Replace every `$token` reference in `text`.
    ///
    /// Returns the first undefined token name on failure.
    pub fn resolve_references<'t>(&self, text: &'t str) -> Result<Cow<'t, str>, String> {
        if !text.contains('$') {
            return Ok(Cow::Borrowed(text));
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'))
                .unwrap_or(after.len());
            let name = after[..len].trim_end_matches('.');
            if name.is_empty() {
                out.push('$');
                rest = after;
                continue;
            }
            match self.resolve_token(name) {
                Some(value) => out.push_str(&value),
                None => return Err(name.to_string()),
            }
            rest = &after[name.len()..];
        }
        out.push_str(rest);
        Ok(Cow::Owned(out))
    }

    /// Color custom properties: the default mode under `:root`, every other
    /// mode under `:root[data-theme=<mode>]`
    pub fn to_css(&self) -> String {
        let Some(default_mode) = self.default_mode() else {
            return String::new();
        };

        let mut css = String::new();
        let ordered = self
            .colors
            .get_key_value(default_mode)
            .into_iter()
            .chain(self.colors.iter().filter(|(mode, _)| mode.as_str() != default_mode));

        for (mode, colors) in ordered {
            if colors.is_empty() {
                continue;
            }
            if mode == default_mode {
                css.push_str(":root{");
            } else {
                css.push_str(&format!(":root[data-theme={}]{{", mode));
            }
            let body: Vec<String> = colors
                .iter()
                .map(|(name, value)| format!("{}:{}", css_var_name(name), value))
                .collect();
            css.push_str(&body.join(";"));
            css.push('}');
        }
        css
    }
}

/// `--primary` for `primary`; dots are not valid in custom property names
pub fn css_var_name(name: &str) -> String {
    format!("--{}", name.replace('.', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THEME: &str = r##"{
        "theme": {
            "colors": {
                "light": { "primary": "#5A44FF", "text": "#000" },
                "dark": { "primary": "#8163E1", "text": "#FFF" }
            },
            "typography": { "h1": { "fontSize": [24, null, 32], "fontWeight": 700 } },
            "tokens": { "radius": "8px", "gap": 4 }
        }
    }"##;

    #[test]
    fn test_parse_wrapped_and_bare() {
        let wrapped = Theme::from_json(THEME).unwrap();
        let bare = Theme::from_json(r#"{"tokens": {"radius": "8px"}}"#).unwrap();
        assert_eq!(wrapped.breakpoints, DEFAULT_BREAKPOINTS.to_vec());
        assert_eq!(bare.resolve_token("radius").as_deref(), Some("8px"));
        assert!(wrapped.typography("h1").is_some());
    }

    #[test]
    fn test_resolve_tokens() {
        let theme = Theme::from_json(THEME).unwrap();
        assert_eq!(theme.resolve_token("primary").as_deref(), Some("var(--primary)"));
        assert_eq!(theme.resolve_token("gap").as_deref(), Some("4"));
        assert_eq!(theme.resolve_token("missing"), None);
    }

    #[test]
    fn test_resolve_references_inside_strings() {
        let theme = Theme::from_json(THEME).unwrap();
        assert_eq!(
            theme.resolve_references("1px solid $primary").unwrap(),
            "1px solid var(--primary)"
        );
        assert_eq!(
            theme.resolve_references("$radius $radius 0").unwrap(),
            "8px 8px 0"
        );
        assert_eq!(theme.resolve_references("no tokens").unwrap(), "no tokens");
        assert_eq!(theme.resolve_references("$ 5").unwrap(), "$ 5");
        assert_eq!(theme.resolve_references("$nope").unwrap_err(), "nope");
    }

    #[test]
    fn test_theme_css() {
        let theme = Theme::from_json(THEME).unwrap();
        assert_eq!(
            theme.to_css(),
            ":root{--primary:#5A44FF;--text:#000}:root[data-theme=dark]{--primary:#8163E1;--text:#FFF}"
        );
    }

    #[test]
    fn test_default_mode_without_light() {
        let theme =
            Theme::from_json(r##"{"colors": {"night": {"a": "#111"}, "day": {"a": "#eee"}}}"##)
                .unwrap();
        assert_eq!(theme.default_mode(), Some("day"));
        assert!(theme.to_css().starts_with(":root{--a:#eee}"));
    }

    #[test]
    fn test_invalid_breakpoints() {
        assert!(Theme::from_json(r#"{"breakpoints": [0, 768, 480]}"#).is_err());
        assert!(Theme::from_json(r#"{"breakpoints": []}"#).is_err());
    }
}
