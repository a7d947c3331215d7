//! Build command implementation

use std::path::PathBuf;
use std::process::ExitCode;

use super::{open_project, EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{BuildContext, BuildPipeline};
use crate::config::{merge_cli_overrides, CliOverrides};
use crate::watch::{watch_and_rebuild, WatchOptions};

/// Arguments of `ccexport build`
pub struct BuildArgs {
    pub config: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub assets: Option<PathBuf>,
    pub watch: bool,
    pub dry_run: bool,
    pub strict: bool,
    pub targets: Vec<String>,
    pub verbose: bool,
}

/// Run the build command
pub fn run_build(args: BuildArgs) -> ExitCode {
    let (mut config, project_root) = match open_project(None, args.config.as_deref()) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let overrides = CliOverrides {
        out: args.out,
        assets: args.assets,
        strict: if args.strict { Some(true) } else { None },
        ..Default::default()
    };
    merge_cli_overrides(&mut config, &overrides);

    let mut context = BuildContext::new(config, project_root).with_verbose(args.verbose);
    if !args.targets.is_empty() {
        context = context.with_filter(args.targets);
    }

    let assets_dir = context.assets_dir();
    if !assets_dir.exists() {
        eprintln!("Error: Assets directory not found: {}", assets_dir.display());
        eprintln!("Create the directory or specify a different path with --assets");
        return ExitCode::from(EXIT_ERROR);
    }

    if args.dry_run {
        println!("Dry run - would convert:");
        println!("  Assets: {}", assets_dir.display());
        println!("  Output: {}", context.out_dir().display());

        match BuildPipeline::new(context).with_dry_run(true).build() {
            Ok(result) => {
                println!("  Scenes: {}", result.targets.len());
                for target in &result.targets {
                    println!("    - {}", target.target_id);
                }
                return ExitCode::from(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("  Error discovering scenes: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }

    if args.watch {
        println!("Starting watch mode...");
        println!("Press Ctrl+C to stop");
        println!();

        let options = WatchOptions { verbose: context.is_verbose(), context };
        return match watch_and_rebuild(options) {
            Ok(()) => ExitCode::from(EXIT_SUCCESS),
            Err(e) => {
                eprintln!("Watch error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    println!("Building...");
    match BuildPipeline::new(context).build() {
        Ok(result) if result.is_success() => {
            println!("{}", result.summary());
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(result) => {
            eprintln!("{}", result.summary());
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            eprintln!("Build error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
