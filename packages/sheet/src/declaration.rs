use serde::{Deserialize, Serialize};

/// Value half of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleValue {
    Static(String),
    /// Supplied at runtime through `style={{"--<class>": value}}`
    Dynamic,
}

/// One atomic, canonical style rule candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDeclaration {
    /// kebab-case CSS property
    pub property: String,
    pub value: StyleValue,
    /// Breakpoint index; 0 is the base
    #[serde(default)]
    pub level: u8,
    /// Selector template containing `&`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default)]
    pub style_order: i32,
}

impl StyleDeclaration {
    pub fn new(property: impl Into<String>, value: StyleValue) -> Self {
        Self {
            property: property.into(),
            value,
            level: 0,
            selector: None,
            style_order: 0,
        }
    }

    pub fn at_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_selector(mut self, selector: Option<String>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_order(mut self, style_order: i32) -> Self {
        self.style_order = style_order;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.value == StyleValue::Dynamic
    }

    /// Key identifying the declaration in the class map.
    ///
    /// Fields are `|`-separated with `\` escaping so distinct declarations
    /// never share a key.
    pub fn canonical_key(&self) -> String {
        let value = match &self.value {
            StyleValue::Static(text) => format!("s:{}", escape(text)),
            StyleValue::Dynamic => "d:".to_string(),
        };
        format!(
            "{}|{}|{}|{}|{}",
            escape(&self.property),
            value,
            self.level,
            self.style_order,
            self.selector.as_deref().map(escape).unwrap_or_default()
        )
    }

    /// Minified rule body for class `class_name`
    pub fn render_rule(&self, class_name: &str) -> String {
        let class_selector = format!(".{}", class_name);
        let selector = match &self.selector {
            Some(template) => template.replace('&', &class_selector),
            None => class_selector,
        };
        let value = match &self.value {
            StyleValue::Static(text) => text.clone(),
            StyleValue::Dynamic => format!("var(--{})", class_name),
        };
        format!("{}{{{}:{}}}", selector, self.property, value)
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('|', "\\|")
}
