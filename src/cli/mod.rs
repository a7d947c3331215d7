//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod convert;
mod tree;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::assets::{AssetDatabase, IndexError};
use crate::build::BuildContext;
use crate::config::{default_config, find_config_from, load_config, CcConfig, ConfigError, CONFIG_FILE};

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// ccexport - Convert Cocos Creator scenes and prefabs to canonical JSON documents
#[derive(Parser)]
#[command(name = "ccexport")]
#[command(about = "Convert Cocos Creator scenes (.fire) and prefabs (.prefab) to canonical JSON scene documents")]
#[command(version)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to ccexport.toml (default: search upward from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert scene or prefab files
    Convert {
        /// Scene (.fire) or prefab (.prefab) files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Creator project root; its .meta files form the asset index
        #[arg(long, conflicts_with = "index")]
        project: Option<PathBuf>,

        /// Prebuilt asset index (JSON object of uuid to asset entry)
        #[arg(long)]
        index: Option<PathBuf>,

        /// Prefix for paths the runtime loads directly
        #[arg(long)]
        prefix: Option<String>,

        /// Output file (single input) or directory; default: stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write compact JSON instead of tab-indented
        #[arg(long)]
        compact: bool,

        /// Write the merged resource manifest to this file
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Strict mode: treat conversion warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Convert every scene of the project described by ccexport.toml
    Build {
        /// Output directory (overrides config)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Scene directory (overrides config)
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Rebuild when scenes, clips or metadata change
        #[arg(long)]
        watch: bool,

        /// List the scenes that would be converted
        #[arg(long)]
        dry_run: bool,

        /// Strict mode: treat conversion warnings as errors
        #[arg(long)]
        strict: bool,

        /// Only convert scenes whose path contains one of these strings
        targets: Vec<String>,
    },

    /// Print the classified node tree of a scene or prefab
    Tree {
        /// Scene (.fire) or prefab (.prefab) file
        input: PathBuf,

        /// Creator project root; its .meta files form the asset index
        #[arg(long, conflicts_with = "index")]
        project: Option<PathBuf>,

        /// Prebuilt asset index
        #[arg(long)]
        index: Option<PathBuf>,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert { inputs, project, index, prefix, output, compact, manifest, strict } => {
            convert::run_convert(convert::ConvertArgs {
                inputs,
                project,
                index,
                config: cli.config,
                prefix,
                output,
                pretty: !compact,
                manifest,
                strict,
            })
        }
        Commands::Build { out, assets, watch, dry_run, strict, targets } => build::run_build(build::BuildArgs {
            config: cli.config,
            out,
            assets,
            watch,
            dry_run,
            strict,
            targets,
            verbose: cli.verbose > 0,
        }),
        Commands::Tree { input, project, index } => {
            tree::run_tree(&input, project.as_deref(), index.as_deref(), cli.config.as_deref())
        }
    }
}

/// Initialize `env_logger`; `RUST_LOG` takes precedence over the `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).try_init();
}

/// Check if a path is a scene or prefab file.
pub fn is_scene_file(path: &Path) -> bool {
    crate::build::is_scene_file(path)
}

/// Configuration and root of the project a command runs against.
///
/// An explicit `--project` directory wins; otherwise `--config`, then a
/// ccexport.toml found upward from the current directory. Without any of
/// them the current directory is the project with default settings.
pub(crate) fn open_project(
    project: Option<&Path>,
    config: Option<&Path>,
) -> Result<(CcConfig, PathBuf), ConfigError> {
    if let Some(project) = project {
        let candidate = project.join(CONFIG_FILE);
        let config = if candidate.exists() { load_config(Some(&candidate))? } else { default_config() };
        return Ok((config, project.to_path_buf()));
    }

    let cwd = std::env::current_dir()?;
    let config_path = match config {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_from(cwd.clone()),
    };
    match config_path {
        Some(path) => {
            let root = crate::config::project_root(&path).map(Path::to_path_buf).unwrap_or_else(|| cwd.clone());
            log::info!("using config {}", path.display());
            Ok((load_config(Some(&path))?, root))
        }
        None => Ok((default_config(), cwd)),
    }
}

/// Asset index for a one-off command: the explicit index file when given,
/// else the project's configured index.
pub(crate) fn open_index(index: Option<&Path>, context: &BuildContext) -> Result<AssetDatabase, IndexError> {
    match index {
        Some(file) => AssetDatabase::from_index_file(file),
        None => crate::build::load_asset_index(context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_args() {
        let cli = Cli::try_parse_from(["ccexport", "-vv", "convert", "a.fire", "b.prefab", "--prefix", "res", "--compact"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Convert { inputs, prefix, compact, .. } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(prefix.as_deref(), Some("res"));
                assert!(compact);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_project_and_index_conflict() {
        let result = Cli::try_parse_from(["ccexport", "convert", "a.fire", "--project", "p", "--index", "i.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_scene_file() {
        assert!(is_scene_file(Path::new("main.fire")));
        assert!(is_scene_file(Path::new("ui/enemy.prefab")));
        assert!(!is_scene_file(Path::new("main.json")));
    }

    #[test]
    fn test_open_project_reads_project_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "[project]\nname = \"game\"\nasset_prefix = \"res\"\n").unwrap();

        let (config, root) = open_project(Some(temp.path()), None).unwrap();
        assert_eq!(config.project.name, "game");
        assert_eq!(config.project.asset_prefix, "res");
        assert_eq!(root, temp.path());
    }

    #[test]
    fn test_open_project_without_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let (config, _) = open_project(Some(temp.path()), None).unwrap();
        assert_eq!(config.project.out, PathBuf::from("json"));
    }
}
