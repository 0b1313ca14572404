use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Location of a violation within a file (1-indexed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceLocation {
    pub row: usize,
    pub column: usize,
}

/// Result of checking a file against a rule.
/// Each CheckResult represents a single violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub rule_name: String,
    pub file_path: String,
    pub has_issue: bool,
    pub issue_count: usize,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// Result of converting/fixing a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertResult {
    pub rule_name: String,
    pub file_path: String,
    pub fixes_applied: usize,
    /// Whether the transformed content differs from the original.
    pub changed: bool,
    pub message: Option<String>,
}

/// A rule that can check for and fix issues in Markdown files
pub trait Rule {
    /// The name of this rule (e.g., "external-links", "figure-captions")
    fn name(&self) -> &str;

    /// A short description of what this rule checks/fixes
    fn description(&self) -> &str;

    /// Whether `convert` runs this rule when no rule is named.
    /// Lossy rewrites opt out and must be requested explicitly.
    fn default_for_convert(&self) -> bool {
        true
    }

    /// Check if a file violates this rule
    /// Returns a vector of CheckResults, one per violation found
    fn check(&self, file_path: &Path, verbose: bool) -> Result<Vec<CheckResult>>;

    /// Convert/fix rule violations in a file.
    ///
    /// With `in_place` the file is rewritten when its content changed;
    /// with `check_mode` nothing is ever written. The returned message
    /// is a one-line summary suitable for the per-file report.
    fn convert(
        &self,
        file_path: &Path,
        in_place: bool,
        check_mode: bool,
        verbose: bool,
    ) -> Result<ConvertResult>;
}

/// Registry of all available rules
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn Rule + Send + Sync>>,
}

impl RuleRegistry {
    /// Create a new registry and register all known rules
    pub fn new() -> Result<Self> {
        let mut registry = Self {
            rules: HashMap::new(),
        };

        // Check-only diagnostics
        registry.register(Arc::new(
            crate::diagnostics::markdown_lint::MarkdownLintChecker::new()?,
        ));

        // Conversion rules
        registry.register(Arc::new(
            crate::conversions::external_links::ExternalLinksConverter::new()?,
        ));
        registry.register(Arc::new(
            crate::conversions::figure_captions::FigureCaptionsConverter::new()?,
        ));
        registry.register(Arc::new(
            crate::conversions::math_tags::MathTagsConverter::new()?,
        ));
        registry.register(Arc::new(
            crate::conversions::image_paths::ImagePathsConverter::new()?,
        ));

        Ok(registry)
    }

    /// Register a rule
    fn register(&mut self, rule: Arc<dyn Rule + Send + Sync>) {
        self.rules.insert(rule.name().to_string(), rule);
    }

    /// Get a rule by name, or return an error if not found
    pub fn get(&self, name: &str) -> Result<Arc<dyn Rule + Send + Sync>> {
        self.rules
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown rule: {}", name))
    }

    /// Get all registered rules
    pub fn all(&self) -> Vec<Arc<dyn Rule + Send + Sync>> {
        self.rules.values().cloned().collect()
    }

    /// The rules `convert` applies when no rule is named. Lossy rules
    /// are excluded here and only run when asked for by name.
    pub fn convert_defaults(&self) -> Vec<Arc<dyn Rule + Send + Sync>> {
        self.rules
            .values()
            .filter(|r| r.default_for_convert())
            .cloned()
            .collect()
    }

    /// List all rule names
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_defaults_exclude_lossy_rules() {
        let registry = RuleRegistry::new().unwrap();
        let defaults: Vec<String> = registry
            .convert_defaults()
            .iter()
            .map(|r| r.name().to_string())
            .collect();

        assert!(!defaults.contains(&"image-paths".to_string()));
        assert!(defaults.contains(&"external-links".to_string()));
        assert!(defaults.contains(&"figure-captions".to_string()));

        // Still registered, still reachable when named explicitly.
        assert!(registry.get("image-paths").is_ok());
    }
}
