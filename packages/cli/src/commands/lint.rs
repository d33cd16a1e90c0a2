use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use devup_ui_linter::{lint_source, Diagnostic, DiagnosticLevel, LintOptions};
use devup_ui_sheet::Theme;
use devup_ui_sourcemap::LineIndex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct LintArgs {
    /// File or directory to lint (defaults to srcDir)
    pub input: Option<PathBuf>,

    /// Show all diagnostics including info level
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Diagnostics of one file, as printed by `--format json`
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    diagnostics: Vec<LocatedDiagnostic>,
}

#[derive(Debug, Serialize)]
struct LocatedDiagnostic {
    line: usize,
    column: usize,
    #[serde(flatten)]
    diagnostic: Diagnostic,
}

pub fn lint(args: LintArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let theme = config.load_theme(cwd)?;
    let input = args
        .input
        .clone()
        .map(|input| cwd.join(input))
        .unwrap_or_else(|| config.get_src_dir(cwd));
    let json = args.format == "json";

    let files = if input.is_file() {
        vec![input.clone()]
    } else if input.is_dir() {
        find_sources(&input, &config)
    } else {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            input.display()
        ));
    };

    if !json {
        println!("🔍 {} devup-ui Linter", "Starting".green().bold());
        println!("   Input: {}", input.display());
        println!("   Found {} files", files.len());
        println!();
    }

    let mut reports = Vec::new();
    for file in &files {
        let report = lint_file(file, &config, &theme)?;
        if !json {
            print_report(&report, args.verbose);
        }
        reports.push(report);
    }

    let count = |level: DiagnosticLevel| {
        reports
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.diagnostic.level == level)
            .count()
    };
    let total_errors = count(DiagnosticLevel::Error);
    let total_warnings = count(DiagnosticLevel::Warning);

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!(
            "✨ {} Linting complete!",
            if total_errors > 0 {
                "Done".red().bold()
            } else {
                "Done".green().bold()
            }
        );
        println!("   Files checked: {}", files.len());
        if total_errors > 0 {
            println!("   {} {}", "Errors:".red(), total_errors);
        }
        if total_warnings > 0 {
            println!("   {} {}", "Warnings:".yellow(), total_warnings);
        }
        if total_errors == 0 && total_warnings == 0 {
            println!("   {} No issues found!", "✓".green());
        }
    }

    // Exit with error code if there are errors
    if total_errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn lint_file(file_path: &Path, config: &Config, theme: &Theme) -> Result<FileReport> {
    let source = fs::read_to_string(file_path)?;
    let index = LineIndex::new(&source);
    let diagnostics = lint_source(
        &source,
        &LintOptions {
            registry: None,
            package: &config.package,
            theme: Some(theme),
        },
    );

    Ok(FileReport {
        file: file_path.display().to_string(),
        diagnostics: diagnostics
            .into_iter()
            .map(|diagnostic| {
                let (line, column) = index.location(diagnostic.span.start);
                LocatedDiagnostic {
                    line,
                    column,
                    diagnostic,
                }
            })
            .collect(),
    })
}

fn print_report(report: &FileReport, verbose: bool) {
    if report.diagnostics.is_empty() {
        if verbose {
            println!("{} {}", "✓".green(), report.file);
        }
        return;
    }

    println!("{}", report.file);
    for located in &report.diagnostics {
        let diagnostic = &located.diagnostic;
        let level_str = match diagnostic.level {
            DiagnosticLevel::Error => "error".red().bold(),
            DiagnosticLevel::Warning => "warning".yellow().bold(),
            DiagnosticLevel::Info => "info".blue().bold(),
        };

        if !verbose && diagnostic.level == DiagnosticLevel::Info {
            continue;
        }

        println!(
            "  {}:{} {} [{}] {}",
            located.line, located.column, level_str, diagnostic.rule, diagnostic.message
        );

        if let Some(suggestion) = &diagnostic.suggestion {
            println!("    {} {}", "💡".dimmed(), suggestion.dimmed());
        }
    }
    println!();
}

fn find_sources(dir: &Path, config: &Config) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && config.accepts(e.path()))
        .map(|e| e.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lint_file_locates_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("App.tsx");
        fs::write(
            &file,
            "import { css } from \"@devup-ui/react\";\nconst a = css({ color: c });\n",
        )
        .unwrap();

        let report = lint_file(&file, &Config::default(), &Theme::default()).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        let located = &report.diagnostics[0];
        assert_eq!((located.line, located.column), (2, 24));
        assert_eq!(located.diagnostic.rule, "literal-only");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["diagnostics"][0]["line"], 2);
        assert_eq!(json["diagnostics"][0]["rule"], "literal-only");
    }

    #[test]
    fn test_find_sources_skips_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(dir.path().join("b.tsx"), "").unwrap();
        fs::write(dir.path().join("a.ts"), "").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();

        let files = find_sources(dir.path(), &Config::default());
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ts", "b.tsx"]);
    }
}
