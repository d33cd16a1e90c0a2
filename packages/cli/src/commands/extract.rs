use crate::config::Config;
use crate::project::{FileOutcome, Project};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use notify::{Config as WatchConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, warn};

/// Events arriving within this window are handled as one batch
const DEBOUNCE: Duration = Duration::from_millis(50);

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Watch for file changes
    #[arg(short, long)]
    pub watch: bool,

    /// Worker threads; one per core when omitted
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Emit one stylesheet for the whole project (overrides config)
    #[arg(long)]
    pub single_css: bool,
}

pub fn extract(args: ExtractArgs, cwd: &Path) -> Result<()> {
    let mut config = Config::load(cwd)?;
    config.single_css |= args.single_css;

    let src_dir = config.get_src_dir(cwd);
    if !src_dir.exists() {
        return Err(anyhow!("Source directory does not exist: {:?}", src_dir));
    }

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build()?;

    let project = Project::open(cwd, config)?;

    println!("{}", "🔨 Extracting styles...".bright_blue().bold());

    let files = project.sources();
    if files.is_empty() {
        println!("{}", "⚠️  No source files found".yellow());
    } else {
        println!("Found {} files", files.len());
    }

    let errors = pool.install(|| report(&project.extract_all(&files), &src_dir));
    let written = project.write_css(args.watch)?;
    project.write_snapshots()?;

    println!();
    if errors == 0 {
        println!(
            "{} Extracted {} files into {} stylesheets",
            "✅".green(),
            files.len(),
            written.len()
        );
    } else {
        println!(
            "{} Extracted {} files, {} errors",
            "⚠️".yellow(),
            files.len() - errors,
            errors
        );
    }

    if args.watch {
        return watch(&project, &pool, &src_dir);
    }
    if errors > 0 {
        return Err(anyhow!("{} files failed to extract", errors));
    }
    Ok(())
}

/// Print one line per file; returns the number of failures
fn report(outcomes: &[(PathBuf, Result<FileOutcome>)], src_dir: &Path) -> usize {
    let mut errors = 0;
    for (file, outcome) in outcomes {
        let relative_path = file.strip_prefix(src_dir).unwrap_or(file);
        match outcome {
            Ok(outcome) => {
                if let Some(css_file) = &outcome.css_file {
                    println!(
                        "  {} {} → {}",
                        "✓".green(),
                        relative_path.display(),
                        css_file.dimmed()
                    );
                } else {
                    debug!(file = %relative_path.display(), "No styles");
                }
            }
            Err(e) => {
                errors += 1;
                eprintln!(
                    "  {} {} - {}",
                    "✗".red(),
                    relative_path.display(),
                    e.to_string().red()
                );
            }
        }
    }
    errors
}

fn watch(project: &Project, pool: &rayon::ThreadPool, src_dir: &Path) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    let _ = tx.send(event);
                }
            }
            Err(e) => warn!("Watch error: {}", e),
        },
        WatchConfig::default(),
    )?;
    watcher.watch(src_dir, RecursiveMode::Recursive)?;

    println!("\n{}", "👀 Watching for changes...".bright_blue());

    while let Ok(first) = rx.recv() {
        let mut changed: BTreeSet<PathBuf> = first.paths.into_iter().collect();
        loop {
            match rx.recv_timeout(DEBOUNCE) {
                Ok(event) => changed.extend(event.paths),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }

        let (present, removed): (Vec<PathBuf>, Vec<PathBuf>) = changed
            .into_iter()
            .filter(|path| project.is_source(path))
            .partition(|path| path.exists());
        if present.is_empty() && removed.is_empty() {
            continue;
        }

        println!("📝 {} files changed", present.len() + removed.len());
        for path in &removed {
            if let Err(e) = project.forget_file(path) {
                eprintln!("  {} {} - {}", "✗".red(), path.display(), e);
            }
        }
        pool.install(|| report(&project.extract_all(&present), src_dir));

        // stale rules stay in the base sheet until the next full build
        project.write_css(true)?;
        project.write_snapshots()?;
    }
    Ok(())
}
