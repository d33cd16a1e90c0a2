//! Extraction over a project tree
//!
//! A `Project` owns one session for the whole build. Modules are extracted in
//! parallel; stylesheets and snapshot sidecars are written once the batch is
//! done.

use crate::config::Config;
use anyhow::{anyhow, bail, Result};
use devup_ui_extractor::{chunk_file_name, ExtractOptions, ExtractResult, Session, BASE_CSS_FILE};
use rayon::prelude::*;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const SHEET_FILE: &str = "sheet.json";
pub const CLASS_MAP_FILE: &str = "classMap.json";
pub const FILE_MAP_FILE: &str = "fileMap.json";

type Import = fn(&Session, &str) -> ExtractResult<()>;

pub struct Project {
    root: PathBuf,
    config: Config,
    session: Session,
}

/// What happened to one module
#[derive(Debug)]
pub struct FileOutcome {
    pub output: PathBuf,
    pub css_file: Option<String>,
    pub updated_base_style: bool,
}

impl Project {
    /// Register the theme and restore sidecars left by a previous build
    pub fn open(root: &Path, config: Config) -> Result<Self> {
        if config.get_src_dir(root) == config.get_out_dir(root) {
            bail!("outDir must differ from srcDir ({})", config.src_dir);
        }

        let session = Session::new();
        session.register_theme(config.load_theme(root)?)?;

        let project = Self {
            root: root.to_path_buf(),
            config,
            session,
        };
        project.load_snapshots()?;
        if let Some(prefix) = &project.config.prefix {
            project.session.set_prefix(prefix.clone())?;
        }
        Ok(project)
    }

    fn load_snapshots(&self) -> Result<()> {
        let css_dir = self.config.get_css_dir(&self.root);
        let sidecars: [(&str, Import); 3] = [
            (SHEET_FILE, Session::import_sheet),
            (CLASS_MAP_FILE, Session::import_class_map),
            (FILE_MAP_FILE, Session::import_file_map),
        ];
        for (name, import) in sidecars {
            let path = css_dir.join(name);
            if !path.exists() {
                continue;
            }
            let json = fs::read_to_string(&path)?;
            import(&self.session, &json).map_err(|e| anyhow!("{}: {}", path.display(), e))?;
            info!(file = %path.display(), "Restored snapshot");
        }
        Ok(())
    }

    /// Modules under `srcDir`, in file name order
    pub fn sources(&self) -> Vec<PathBuf> {
        let out_dir = self.config.get_out_dir(&self.root);
        WalkDir::new(self.config.get_src_dir(&self.root))
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != "node_modules" && e.path() != out_dir)
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.config.accepts(e.path()))
            .map(|e| e.into_path())
            .collect()
    }

    /// Whether a watcher event for `path` concerns this project
    pub fn is_source(&self, path: &Path) -> bool {
        path.starts_with(self.config.get_src_dir(&self.root))
            && !path.starts_with(self.config.get_out_dir(&self.root))
            && !path.components().any(|c| c.as_os_str() == "node_modules")
            && self.config.accepts(path)
    }

    pub fn extract_all(&self, files: &[PathBuf]) -> Vec<(PathBuf, Result<FileOutcome>)> {
        files
            .par_iter()
            .map(|file| (file.clone(), self.extract_file(file)))
            .collect()
    }

    /// Rewrite one module into `outDir`, with a `.map` next to it
    pub fn extract_file(&self, path: &Path) -> Result<FileOutcome> {
        let source = fs::read_to_string(path)?;
        let key = self.file_key(path);
        let output = self.output_path(path);
        let options = ExtractOptions {
            package: self.config.package.clone(),
            css_dir: self.css_import_dir(&output),
            single_css: self.config.single_css,
        };

        let extracted = self
            .session
            .code_extract(&key, &source, &options)
            .map_err(|e| anyhow!("\n{}", e.pretty(&source)))?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut code = extracted.code;
        if let Some(map) = &extracted.map {
            let map_path = with_suffix(&output, ".map");
            fs::write(&map_path, map)?;
            if let Some(name) = map_path.file_name() {
                code.push_str(&format!(
                    "\n//# sourceMappingURL={}\n",
                    name.to_string_lossy()
                ));
            }
        }
        fs::write(&output, code)?;
        debug!(file = %key, css = ?extracted.css_file, "Wrote module");

        Ok(FileOutcome {
            output,
            css_file: extracted.css_file,
            updated_base_style: extracted.updated_base_style,
        })
    }

    /// Drop a deleted module and its output
    pub fn forget_file(&self, path: &Path) -> Result<bool> {
        let key = self.file_key(path);
        let options = ExtractOptions {
            package: self.config.package.clone(),
            css_dir: String::new(),
            single_css: self.config.single_css,
        };
        let extracted = self.session.code_extract(&key, "", &options)?;

        let output = self.output_path(path);
        for stale in [with_suffix(&output, ".map"), output] {
            if stale.exists() {
                fs::remove_file(&stale)?;
            }
        }
        Ok(extracted.updated_base_style)
    }

    /// `devup-ui.css` plus one stylesheet per chunk
    pub fn write_css(&self, watch: bool) -> Result<Vec<PathBuf>> {
        let css_dir = self.config.get_css_dir(&self.root);
        fs::create_dir_all(&css_dir)?;

        let base = css_dir.join(BASE_CSS_FILE);
        fs::write(&base, self.session.get_css(None, watch)?)?;
        let mut written = vec![base];

        for chunk in self.session.chunks()? {
            let path = css_dir.join(chunk_file_name(chunk));
            fs::write(&path, self.session.get_css(Some(chunk), watch)?)?;
            written.push(path);
        }
        info!(files = written.len(), "Wrote stylesheets");
        Ok(written)
    }

    pub fn write_snapshots(&self) -> Result<()> {
        let css_dir = self.config.get_css_dir(&self.root);
        fs::create_dir_all(&css_dir)?;
        fs::write(css_dir.join(SHEET_FILE), self.session.export_sheet()?)?;
        fs::write(css_dir.join(CLASS_MAP_FILE), self.session.export_class_map()?)?;
        fs::write(css_dir.join(FILE_MAP_FILE), self.session.export_file_map()?)?;
        Ok(())
    }

    fn file_key(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn output_path(&self, path: &Path) -> PathBuf {
        let src_dir = self.config.get_src_dir(&self.root);
        let relative = path.strip_prefix(&src_dir).unwrap_or(path);
        self.config.get_out_dir(&self.root).join(relative)
    }

    /// Stylesheet directory as an import specifier from `output`
    fn css_import_dir(&self, output: &Path) -> String {
        let from = output.parent().unwrap_or(&self.root);
        relative_specifier(from, &self.config.get_css_dir(&self.root))
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// `./a/b` or `../a/b`, always with `/`
fn relative_specifier(from: &Path, to: &Path) -> String {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts = vec!["..".to_string(); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    match parts.first().map(String::as_str) {
        None => ".".to_string(),
        Some("..") => parts.join("/"),
        Some(_) => format!("./{}", parts.join("/")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUTTON: &str = r#"import { Box } from "@devup-ui/react";
export const Button = () => <Box color="red" px={4}>Go</Box>;
"#;

    const PLAIN: &str = "export const answer = 42;\n";

    fn project_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_relative_specifier() {
        assert_eq!(
            relative_specifier(Path::new("/p/dist/ui"), Path::new("/p/df/devup-ui")),
            "../../df/devup-ui"
        );
        assert_eq!(relative_specifier(Path::new("/p"), Path::new("/p/df")), "./df");
        assert_eq!(relative_specifier(Path::new("/p"), Path::new("/p")), ".");
    }

    #[test]
    fn test_build_writes_modules_css_and_sidecars() {
        let dir = project_dir(&[("src/ui/Button.tsx", BUTTON), ("src/util.ts", PLAIN)]);
        let project = Project::open(dir.path(), Config::default()).unwrap();

        let files = project.sources();
        assert_eq!(files.len(), 2);
        for (file, outcome) in project.extract_all(&files) {
            outcome.unwrap_or_else(|e| panic!("{}: {}", file.display(), e));
        }
        project.write_css(false).unwrap();
        project.write_snapshots().unwrap();

        let button = fs::read_to_string(dir.path().join("dist/ui/Button.tsx")).unwrap();
        assert!(button.contains(r#"import "../../df/devup-ui/devup-ui-0.css";"#));
        assert!(button.contains("<div className="));
        assert!(button.ends_with("//# sourceMappingURL=Button.tsx.map\n"));
        assert!(dir.path().join("dist/ui/Button.tsx.map").exists());

        let util = fs::read_to_string(dir.path().join("dist/util.ts")).unwrap();
        assert_eq!(util, PLAIN);

        let css_dir = dir.path().join("df/devup-ui");
        let chunk = fs::read_to_string(css_dir.join("devup-ui-0.css")).unwrap();
        assert!(chunk.contains("{color:red}"));
        for sidecar in [SHEET_FILE, CLASS_MAP_FILE, FILE_MAP_FILE, BASE_CSS_FILE] {
            assert!(css_dir.join(sidecar).exists(), "{} missing", sidecar);
        }
        let file_map = fs::read_to_string(css_dir.join(FILE_MAP_FILE)).unwrap();
        assert!(file_map.contains("src/ui/Button.tsx"));
    }

    #[test]
    fn test_rebuild_reuses_sidecars() {
        let dir = project_dir(&[("src/Button.tsx", BUTTON)]);
        let first = Project::open(dir.path(), Config::default()).unwrap();
        first.extract_file(&dir.path().join("src/Button.tsx")).unwrap();
        first.write_snapshots().unwrap();
        let before = fs::read_to_string(dir.path().join("dist/Button.tsx")).unwrap();

        let second = Project::open(dir.path(), Config::default()).unwrap();
        let outcome = second.extract_file(&dir.path().join("src/Button.tsx")).unwrap();
        let after = fs::read_to_string(&outcome.output).unwrap();
        assert_eq!(before, after);
        assert!(!outcome.updated_base_style);
    }

    #[test]
    fn test_single_css_imports_base_sheet() {
        let dir = project_dir(&[("src/Button.tsx", BUTTON)]);
        let config = Config {
            single_css: true,
            ..Config::default()
        };
        let project = Project::open(dir.path(), config).unwrap();
        let outcome = project.extract_file(&dir.path().join("src/Button.tsx")).unwrap();
        assert_eq!(outcome.css_file.as_deref(), Some("../df/devup-ui/devup-ui.css"));
        assert!(outcome.updated_base_style);
        assert_eq!(project.write_css(false).unwrap().len(), 1);
    }

    #[test]
    fn test_forget_removes_output() {
        let dir = project_dir(&[("src/Button.tsx", BUTTON)]);
        let project = Project::open(dir.path(), Config::default()).unwrap();
        let source = dir.path().join("src/Button.tsx");
        let outcome = project.extract_file(&source).unwrap();
        assert!(outcome.output.exists());

        fs::remove_file(&source).unwrap();
        project.forget_file(&source).unwrap();
        assert!(!outcome.output.exists());
        assert!(project.session.chunks().unwrap().is_empty());
    }

    #[test]
    fn test_same_src_and_out_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            out_dir: "src".into(),
            ..Config::default()
        };
        assert!(Project::open(dir.path(), config).is_err());
    }

    #[test]
    fn test_is_source_filters_output_and_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::open(dir.path(), Config::default()).unwrap();
        assert!(project.is_source(&dir.path().join("src/a/App.tsx")));
        assert!(!project.is_source(&dir.path().join("src/node_modules/x/index.js")));
        assert!(!project.is_source(&dir.path().join("dist/App.tsx")));
        assert!(!project.is_source(&dir.path().join("src/notes.md")));
    }
}
