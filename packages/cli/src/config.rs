use devup_ui_extractor::{DEFAULT_CSS_DIR, DEFAULT_PACKAGE};
use devup_ui_sheet::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "devup-ui.config.json";

/// devup-ui configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Source directory containing the modules to extract
    #[serde(default = "default_src_dir")]
    pub src_dir: String,

    /// Where rewritten modules are written, mirroring `srcDir`
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Where stylesheets and snapshot sidecars are written
    #[serde(default = "default_css_dir")]
    pub css_dir: String,

    /// Theme file (`devup.json`)
    #[serde(default = "default_theme_file")]
    pub theme_file: String,

    /// Module the styling API is imported from
    #[serde(default = "default_package")]
    pub package: String,

    /// Emit one stylesheet for the whole project
    #[serde(default)]
    pub single_css: bool,

    /// Prefix for generated class names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// File extensions to extract
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_src_dir() -> String {
    "src".to_string()
}

fn default_out_dir() -> String {
    "dist".to_string()
}

fn default_css_dir() -> String {
    DEFAULT_CSS_DIR.to_string()
}

fn default_theme_file() -> String {
    "devup.json".to_string()
}

fn default_package() -> String {
    DEFAULT_PACKAGE.to_string()
}

fn default_extensions() -> Vec<String> {
    ["js", "jsx", "ts", "tsx", "mjs"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid {}: {}", DEFAULT_CONFIG_NAME, e))?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Theme from `themeFile`; the empty theme when the file is absent
    pub fn load_theme(&self, cwd: &Path) -> anyhow::Result<Theme> {
        let theme_path = cwd.join(&self.theme_file);
        if !theme_path.exists() {
            return Ok(Theme::default());
        }
        let content = std::fs::read_to_string(&theme_path)?;
        Theme::from_json(&content)
            .map_err(|e| anyhow::anyhow!("{}: {}", theme_path.display(), e))
    }

    pub fn get_src_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.src_dir)
    }

    pub fn get_out_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.out_dir)
    }

    pub fn get_css_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.css_dir)
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            out_dir: default_out_dir(),
            css_dir: default_css_dir(),
            theme_file: default_theme_file(),
            package: default_package(),
            single_css: false,
            prefix: None,
            extensions: default_extensions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "srcDir": "app",
            "cssDir": "styles",
            "singleCss": true,
            "prefix": "d-",
            "extensions": ["tsx"]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.src_dir, "app");
        assert_eq!(config.out_dir, "dist");
        assert_eq!(config.css_dir, "styles");
        assert_eq!(config.package, "@devup-ui/react");
        assert!(config.single_css);
        assert_eq!(config.prefix.as_deref(), Some("d-"));
        assert!(config.accepts(Path::new("a/b.tsx")));
        assert!(!config.accepts(Path::new("a/b.ts")));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.src_dir, "src");
        assert_eq!(config.css_dir, "df/devup-ui");
        assert_eq!(config.theme_file, "devup.json");
        assert!(!config.single_css);
        assert!(config.accepts(Path::new("page.jsx")));
        assert!(!config.accepts(Path::new("README.md")));
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.load_theme(dir.path()).unwrap(), Theme::default());
    }

    #[test]
    fn test_invalid_theme_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("devup.json"), "{\"breakpoints\": []}").unwrap();
        let err = Config::default().load_theme(dir.path()).unwrap_err();
        assert!(err.to_string().contains("devup.json"));
    }
}
