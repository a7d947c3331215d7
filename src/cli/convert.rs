//! Convert command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{open_index, open_project, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::{load_collision_matrix, BuildContext};
use crate::convert::{ConvertOptions, SceneConverter};
use crate::document::{to_json, write_document, write_manifest};
use crate::resolver::ResourceManifest;

/// Arguments of `ccexport convert`
pub struct ConvertArgs {
    pub inputs: Vec<PathBuf>,
    pub project: Option<PathBuf>,
    pub index: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub prefix: Option<String>,
    pub output: Option<PathBuf>,
    pub pretty: bool,
    pub manifest: Option<PathBuf>,
    pub strict: bool,
}

/// Where the document for `input` goes; `None` prints it.
///
/// A single input with a `.json` output names the file directly; any other
/// output is a directory receiving `<stem>.json` per input.
pub(crate) fn output_path(input: &Path, output: Option<&Path>, single: bool) -> Option<PathBuf> {
    let output = output?;
    if single && output.extension().and_then(|e| e.to_str()) == Some("json") {
        return Some(output.to_path_buf());
    }
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "scene".to_string());
    Some(output.join(format!("{}.json", stem)))
}

/// Run the convert command
pub fn run_convert(args: ConvertArgs) -> ExitCode {
    if let Some(bad) = args.inputs.iter().find(|p| !super::is_scene_file(p)) {
        eprintln!("Error: {} is not a .fire or .prefab file", bad.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let (config, root) = match open_project(args.project.as_deref(), args.config.as_deref()) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let context = BuildContext::new(config, root);

    let index = match open_index(args.index.as_deref(), &context) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("Error loading asset index: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let options = ConvertOptions {
        asset_prefix: args.prefix.unwrap_or_else(|| context.asset_prefix().to_string()),
        collision_matrix: load_collision_matrix(&context),
    };
    let converter = SceneConverter::new(&index, options);

    let single = args.inputs.len() == 1;
    let mut manifest = ResourceManifest::new();
    let mut failed = 0;

    for (input, result) in converter.convert_batch(&args.inputs) {
        let output = match result {
            Ok(output) => output,
            Err(e) => {
                eprintln!("Error: {}: {}", input.display(), e);
                failed += 1;
                continue;
            }
        };

        for warning in &output.warnings {
            eprintln!("Warning: {}: {}", input.display(), warning);
        }
        if args.strict && !output.warnings.is_empty() {
            eprintln!("Error: {}: {} warnings in strict mode", input.display(), output.warnings.len());
            failed += 1;
            continue;
        }

        match output_path(&input, args.output.as_deref(), single) {
            Some(path) => {
                if let Err(e) = write_document(&output.document, &path, args.pretty) {
                    eprintln!("Error: failed to write {}: {}", path.display(), e);
                    failed += 1;
                    continue;
                }
                println!("{} -> {}", input.display(), path.display());
            }
            None => match to_json(&output.document, args.pretty) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}: {}", input.display(), e);
                    failed += 1;
                    continue;
                }
            },
        }

        for (key, descriptor) in output.manifest {
            manifest.entry(key).or_insert(descriptor);
        }
    }

    if let Some(path) = &args.manifest {
        if let Err(e) = write_manifest(&manifest, path, args.pretty) {
            eprintln!("Error: failed to write {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if failed > 0 {
        eprintln!("{} of {} files failed", failed, args.inputs.len());
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
