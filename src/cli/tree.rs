//! Tree command: print the classified node tree of a scene

use std::fmt::Write as _;
use std::path::Path;
use std::process::ExitCode;

use super::{open_index, open_project, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::BuildContext;
use crate::convert::{ConvertOptions, SceneConverter};
use crate::document::CanonicalNode;

/// One line per node, `<variant> "<name>"`, indented two spaces per level.
pub(crate) fn render_tree(node: &CanonicalNode) -> String {
    let mut out = String::new();
    render_node(node, 0, &mut out);
    out
}

fn render_node(node: &CanonicalNode, depth: usize, out: &mut String) {
    let name = node.base.get("name").and_then(|n| n.as_str()).unwrap_or("");
    let _ = writeln!(out, "{:indent$}{} \"{}\"", "", node.variant, name, indent = depth * 2);
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}

/// Run the tree command
pub fn run_tree(input: &Path, project: Option<&Path>, index: Option<&Path>, config: Option<&Path>) -> ExitCode {
    if !super::is_scene_file(input) {
        eprintln!("Error: {} is not a .fire or .prefab file", input.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let (config, root) = match open_project(project, config) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let context = BuildContext::new(config, root);
    let index = match open_index(index, &context) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("Error loading asset index: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let options = ConvertOptions { asset_prefix: context.asset_prefix().to_string(), ..Default::default() };
    match SceneConverter::new(&index, options).convert_file(input) {
        Ok(output) => {
            print!("{}", render_tree(&output.document.root));
            if !output.warnings.is_empty() {
                eprintln!("{} warnings (run with -v for details)", output.warnings.len());
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}: {}", input.display(), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Variant;
    use crate::document::Properties;
    use serde_json::json;

    fn node(variant: Variant, name: &str) -> CanonicalNode {
        let mut base = Properties::new();
        base.insert("name".to_string(), json!(name));
        CanonicalNode::new(variant, base)
    }

    #[test]
    fn test_render_tree_indents_children() {
        let mut root = node(Variant::Scene, "main");
        let mut canvas = node(Variant::Canvas, "Canvas");
        canvas.children.push(node(Variant::Sprite, "bg"));
        root.children.push(canvas);

        assert_eq!(render_tree(&root), "Scene \"main\"\n  Canvas \"Canvas\"\n    Sprite \"bg\"\n");
    }
}
