//! Watch mode for automatic rebuilds on file changes
//!
//! Provides file system watching with debouncing for `ccexport build --watch`.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::build::{BuildContext, BuildPipeline, BuildResult};

/// Error during watch mode
#[derive(Debug)]
pub enum WatchError {
    /// Failed to initialize file watcher
    WatcherInit(notify::Error),
    /// Failed to add watch path
    WatchPath(notify::Error),
    /// Channel receive error
    ChannelError(String),
    /// Assets directory not found
    SourceNotFound(PathBuf),
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::WatcherInit(e) => write!(f, "Failed to initialize file watcher: {}", e),
            WatchError::WatchPath(e) => write!(f, "Failed to watch path: {}", e),
            WatchError::ChannelError(msg) => write!(f, "Watch channel error: {}", msg),
            WatchError::SourceNotFound(path) => {
                write!(f, "Assets directory not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for WatchError {}

/// Tracks scenes that failed across rebuilds so recoveries can be reported
#[derive(Debug, Default)]
pub struct ErrorTracker {
    failing: HashSet<String>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a build, returning scenes that failed last time and converted now
    pub fn update(&mut self, result: &BuildResult) -> Vec<String> {
        let current: HashSet<String> = result.failures().iter().map(|t| t.target_id.clone()).collect();
        let mut fixed: Vec<String> = self.failing.difference(&current).cloned().collect();
        fixed.sort();
        self.failing = current;
        fixed
    }

    pub fn has_errors(&self) -> bool {
        !self.failing.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.failing.len()
    }
}

/// Options for watch mode
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Project the rebuilds run against
    pub context: BuildContext,
    /// Verbose output
    pub verbose: bool,
}

impl WatchOptions {
    pub fn new(context: BuildContext) -> Self {
        Self { context, verbose: false }
    }

    /// Directories whose changes trigger a rebuild: the assets directory and
    /// every index mount that exists.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.context.assets_dir()];
        for mount in &self.context.config().index.mounts {
            let mount = self.context.resolve_path(mount);
            if mount.exists() && !roots.iter().any(|r| mount.starts_with(r)) {
                roots.push(mount);
            }
        }
        roots
    }
}

fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Wall-clock time of day, UTC
fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Run one full build. A pipeline error becomes a failed build so the
/// watcher keeps going.
pub fn do_build(options: &WatchOptions) -> Result<BuildResult, String> {
    let start = Instant::now();
    let context = options.context.clone().with_verbose(options.verbose);
    let mut result = BuildPipeline::new(context).build().map_err(|e| e.to_string())?;
    result.total_duration = start.elapsed();
    Ok(result)
}

/// Watch for file changes and rebuild automatically.
///
/// Blocks until interrupted (Ctrl+C) or the watcher channel closes.
pub fn watch_and_rebuild(options: WatchOptions) -> Result<(), WatchError> {
    let assets_dir = options.context.assets_dir();
    if !assets_dir.exists() {
        return Err(WatchError::SourceNotFound(assets_dir));
    }
    let out_dir = options.context.out_dir();
    let watch_config = options.context.config().watch.clone();

    let (tx, rx) = channel();
    let debounce_duration = Duration::from_millis(watch_config.debounce_ms as u64);
    let mut debouncer = new_debouncer(debounce_duration, tx).map_err(WatchError::WatcherInit)?;

    let roots = options.watch_roots();
    for root in &roots {
        debouncer.watcher().watch(root, RecursiveMode::Recursive).map_err(WatchError::WatchPath)?;
    }

    let mut error_tracker = ErrorTracker::new();

    if watch_config.clear_screen {
        clear_screen();
    }
    println!("[{}] Building...", timestamp());
    rebuild(&options, &mut error_tracker);
    println!("[{}] Watching {} for changes...", timestamp(), assets_dir.display());

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        matches!(e.kind, DebouncedEventKind::Any)
                            && !e.path.starts_with(&out_dir)
                            && is_relevant_file(&e.path)
                    })
                    .collect();
                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    if let Some(name) = event.path.file_name() {
                        println!("[{}] Changed: {}", timestamp(), name.to_string_lossy());
                    }
                }
                if watch_config.clear_screen {
                    clear_screen();
                }
                println!("[{}] Building...", timestamp());
                rebuild(&options, &mut error_tracker);
                println!("[{}] Watching {} for changes...", timestamp(), assets_dir.display());
            }
            Ok(Err(error)) => {
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
                eprintln!("[{}] Continuing to watch...", timestamp());
            }
            Err(e) => return Err(WatchError::ChannelError(e.to_string())),
        }
    }
}

fn rebuild(options: &WatchOptions, tracker: &mut ErrorTracker) {
    match do_build(options) {
        Ok(result) => {
            let fixed = tracker.update(&result);
            print_build_result(&result, &fixed);
        }
        Err(e) => eprintln!("[{}] Build failed: {}", timestamp(), e),
    }
}

/// Scenes, prefabs, clips, metadata and imported documents trigger a rebuild
fn is_relevant_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            matches!(ext.as_str(), "fire" | "prefab" | "anim" | "meta" | "json")
        }
        None => false,
    }
}

fn print_build_result(result: &BuildResult, fixed: &[String]) {
    for scene in fixed {
        println!("[{}] Fixed: {}", timestamp(), scene);
    }

    if result.is_success() {
        println!(
            "[{}] Build complete ({}) - Scenes: {} | Resources: {}",
            timestamp(),
            format_duration(result.total_duration),
            result.success_count(),
            result.resources
        );
    } else {
        let failed = result.failed_count();
        println!(
            "[{}] Build failed ({}) - {} scene{} failed",
            timestamp(),
            format_duration(result.total_duration),
            failed,
            if failed == 1 { "" } else { "s" }
        );
        for target in result.failures() {
            eprintln!("[{}] Error in {}: {}", timestamp(), target.target_id, target.status);
        }
    }

    for warning in result.all_warnings() {
        eprintln!("[{}] Warning: {}", timestamp(), warning);
    }
}
