use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Source directory
    #[arg(short, long, default_value = "src")]
    pub src_dir: String,

    /// Emit one stylesheet for the whole project
    #[arg(long)]
    pub single_css: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

const EXAMPLE_COMPONENT: &str = r#"import { Box, Text } from "@devup-ui/react";

export function Welcome() {
  return (
    <Box bg="$background" p={[4, 8]} _hover={{ bg: "$primary" }}>
      <Text typography="heading" color="$text">
        Hello devup-ui
      </Text>
    </Box>
  );
}
"#;

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing devup-ui project...".bright_blue().bold());

    let config = Config {
        src_dir: args.src_dir.clone(),
        single_css: args.single_css,
        ..Config::default()
    };

    // Create source directory if it doesn't exist
    let src_dir = config.get_src_dir(cwd);
    if !src_dir.exists() {
        fs::create_dir_all(&src_dir)?;
        println!("  {} Created {}/", "✓".green(), args.src_dir);
    }

    let example_file = src_dir.join("Welcome.tsx");
    if !example_file.exists() {
        fs::write(&example_file, EXAMPLE_COMPONENT)?;
        println!("  {} Created Welcome.tsx", "✓".green());
    }

    let theme_path = cwd.join(&config.theme_file);
    if !theme_path.exists() {
        fs::write(&theme_path, serde_json::to_string_pretty(&starter_theme())?)?;
        println!("  {} Created {}", "✓".green(), config.theme_file);
    }

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/Welcome.tsx", args.src_dir);
    println!("  2. Run: devup-ui extract");
    println!("  3. Check output in {}/ and {}/", config.out_dir, config.css_dir);

    Ok(())
}

fn starter_theme() -> serde_json::Value {
    json!({
        "theme": {
            "colors": {
                "light": { "primary": "#5a44ff", "text": "#1a1a1a", "background": "#ffffff" },
                "dark": { "primary": "#9c8fff", "text": "#f4f4f4", "background": "#121212" }
            },
            "typography": {
                "heading": [
                    { "fontSize": "24px", "fontWeight": 700, "lineHeight": 1.3 },
                    null,
                    { "fontSize": "32px", "fontWeight": 700, "lineHeight": 1.2 }
                ]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use devup_ui_sheet::Theme;

    fn args() -> InitArgs {
        InitArgs {
            src_dir: "app".into(),
            single_css: false,
            force: false,
        }
    }

    #[test]
    fn test_init_writes_loadable_files() {
        let dir = tempfile::tempdir().unwrap();
        init(args(), dir.path()).unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.src_dir, "app");
        assert!(dir.path().join("app/Welcome.tsx").exists());

        let theme = config.load_theme(dir.path()).unwrap();
        assert!(theme.typography("heading").is_some());
        assert!(theme.resolve_token("primary").is_some());
        assert_ne!(theme, Theme::default());
    }

    #[test]
    fn test_init_keeps_existing_config_without_force() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{\"srcDir\": \"lib\"}").unwrap();
        init(args(), dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap().src_dir, "lib");
    }
}
