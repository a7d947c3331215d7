//! Build result types.

use std::path::PathBuf;
use std::time::Duration;

/// Status of a single scene conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// Document written
    Success,
    /// Not converted (dry run)
    Skipped,
    /// Conversion failed with error
    Failed(String),
}

impl BuildStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Skipped)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildStatus::Failed(_))
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Success => write!(f, "success"),
            BuildStatus::Skipped => write!(f, "skipped"),
            BuildStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of converting one scene.
#[derive(Debug, Clone)]
pub struct TargetResult {
    /// Scene id (path under the assets directory)
    pub target_id: String,
    pub status: BuildStatus,
    /// Documents written
    pub outputs: Vec<PathBuf>,
    /// Nodes in the converted tree
    pub nodes: usize,
    pub duration: Duration,
    /// Non-fatal conversion problems
    pub warnings: Vec<String>,
}

impl TargetResult {
    pub fn success(target_id: String, output: PathBuf, nodes: usize, duration: Duration) -> Self {
        Self { target_id, status: BuildStatus::Success, outputs: vec![output], nodes, duration, warnings: vec![] }
    }

    pub fn skipped(target_id: String) -> Self {
        Self {
            target_id,
            status: BuildStatus::Skipped,
            outputs: vec![],
            nodes: 0,
            duration: Duration::ZERO,
            warnings: vec![],
        }
    }

    pub fn failed(target_id: String, error: String, duration: Duration) -> Self {
        Self { target_id, status: BuildStatus::Failed(error), outputs: vec![], nodes: 0, duration, warnings: vec![] }
    }

    /// Add warnings to the result.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each scene, in build order
    pub targets: Vec<TargetResult>,
    /// Merged manifest, when one was written
    pub manifest: Option<PathBuf>,
    /// Entries in the merged manifest
    pub resources: usize,
    pub total_duration: Duration,
}

impl BuildResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: TargetResult) {
        self.targets.push(result);
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    pub fn success_count(&self) -> usize {
        self.targets.iter().filter(|r| matches!(r.status, BuildStatus::Success)).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.targets.iter().filter(|r| matches!(r.status, BuildStatus::Skipped)).count()
    }

    pub fn failed_count(&self) -> usize {
        self.targets.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Check if the overall build succeeded (no failures).
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// All files written, manifest last.
    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.targets.iter().flat_map(|r| r.outputs.iter()).chain(self.manifest.iter()).collect()
    }

    /// Warnings prefixed with the scene they came from.
    pub fn all_warnings(&self) -> Vec<String> {
        self.targets
            .iter()
            .flat_map(|r| r.warnings.iter().map(move |w| format!("{}: {}", r.target_id, w)))
            .collect()
    }

    pub fn failures(&self) -> Vec<&TargetResult> {
        self.targets.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Format a summary of the build result.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let skipped = self.skipped_count();
        let failed = self.failed_count();
        let total = self.targets.len();

        if failed > 0 {
            lines.push(format!(
                "Build failed: {} converted, {} skipped, {} failed ({} scenes)",
                success, skipped, failed, total
            ));
            for target in self.failures() {
                lines.push(format!("  - {}: {}", target.target_id, target.status));
            }
        } else {
            let nodes: usize = self.targets.iter().map(|r| r.nodes).sum();
            lines.push(format!(
                "Build succeeded: {} converted, {} skipped ({} scenes, {} nodes, {} resources) in {:?}",
                success, skipped, total, nodes, self.resources, self.total_duration
            ));
        }

        let warnings = self.all_warnings();
        if !warnings.is_empty() {
            lines.push(format!("Warnings ({}):", warnings.len()));
            for warning in warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if warnings.len() > 5 {
                lines.push(format!("  ... and {} more", warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_status_display() {
        assert_eq!(BuildStatus::Success.to_string(), "success");
        assert_eq!(BuildStatus::Skipped.to_string(), "skipped");
        assert_eq!(BuildStatus::Failed("bad root".to_string()).to_string(), "failed: bad root");
    }

    #[test]
    fn test_build_result_counts() {
        let mut result = BuildResult::new();
        result.add_result(TargetResult::success("a.fire".into(), "a.json".into(), 3, Duration::ZERO));
        result.add_result(TargetResult::skipped("b.fire".into()));
        result.add_result(TargetResult::failed("c.fire".into(), "error".into(), Duration::ZERO));

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.skipped_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.is_success());
        assert!(result.summary().contains("c.fire: failed: error"));
    }

    #[test]
    fn test_build_result_outputs_include_manifest() {
        let mut result = BuildResult::new();
        result.add_result(TargetResult::success("a.fire".into(), "a.json".into(), 1, Duration::ZERO));
        result.manifest = Some(PathBuf::from("resources.json"));

        let outputs = result.all_outputs();
        assert_eq!(outputs, vec![&PathBuf::from("a.json"), &PathBuf::from("resources.json")]);
    }

    #[test]
    fn test_build_result_warnings_are_attributed() {
        let mut result = BuildResult::new();
        result.add_result(
            TargetResult::success("menu.fire".into(), "menu.json".into(), 2, Duration::ZERO)
                .with_warnings(vec!["unknown asset 'x'".into()]),
        );
        assert_eq!(result.all_warnings(), vec!["menu.fire: unknown asset 'x'".to_string()]);
    }

    #[test]
    fn test_build_result_summary() {
        let mut result = BuildResult::new();
        result.add_result(TargetResult::success("a.fire".into(), "a.json".into(), 4, Duration::ZERO));
        result.resources = 2;

        let summary = result.with_duration(Duration::from_millis(100)).summary();
        assert!(summary.contains("Build succeeded"));
        assert!(summary.contains("4 nodes, 2 resources"));
    }
}
