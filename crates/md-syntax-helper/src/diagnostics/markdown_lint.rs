// markdown-lint: heuristic checks around image/link syntax.
//
// This is a LINTING diagnostic with no auto-fix; it catches the
// constructs that have actually broken rendering before: stray base64
// data-URI lines, image syntax the renderer cannot parse, unbalanced
// parens/braces, broken title quoting, and KaTeX-hostile Unicode.

use anyhow::Result;
use regex::Regex;
use std::path::Path;

use crate::rule::{CheckResult, ConvertResult, Rule, SourceLocation};
use crate::utils::read_file;
use crate::utils::unicode::contains_katex_unicode;

const EXCERPT_LEN: usize = 220;

/// A single lint finding.
#[derive(Debug, Clone)]
pub struct LintIssue {
    /// 1-indexed line number.
    pub line: usize,
    pub kind: &'static str,
    pub excerpt: String,
}

pub struct MarkdownLintChecker {
    img_re: Regex,
    // ![alt](url "title"){width=...} variant used elsewhere in the content
    img_attr_tail_re: Regex,
    data_uri_re: Regex,
}

impl MarkdownLintChecker {
    pub fn new() -> Result<Self> {
        Ok(Self {
            img_re: Regex::new(r#"!\[(?P<alt>[^\]]*)\]\((?P<url>[^)\s]+)(?:\s+"[^"]*")?\)"#)
                .unwrap(),
            img_attr_tail_re: Regex::new(r"!\[[^\]]*\]\([^)]*\)\{[^}]*\}").unwrap(),
            data_uri_re: Regex::new(r"^\s*\[\]\(data:image/[^;]+;base64,[^)]+\)\s*$").unwrap(),
        })
    }

    fn excerpt(line: &str) -> String {
        line.chars().take(EXCERPT_LEN).collect()
    }

    /// Run all heuristics over a document's lines.
    pub fn iter_issues(&self, lines: &[&str]) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        for (ix, line) in lines.iter().enumerate() {
            let n = ix + 1;

            // Huge inline base64 blobs from exports; should be removed.
            if self.data_uri_re.is_match(line) {
                issues.push(LintIssue {
                    line: n,
                    kind: "inline_base64_data_uri",
                    excerpt: Self::excerpt(line),
                });
                continue;
            }

            if contains_katex_unicode(line) {
                issues.push(LintIssue {
                    line: n,
                    kind: "katex_unicode_whitespace",
                    excerpt: Self::excerpt(line),
                });
            }

            // Image-shaped text that no image pattern parses.
            if line.contains("![")
                && line.contains("](")
                && !self.img_re.is_match(line)
                && !self.img_attr_tail_re.is_match(line)
            {
                issues.push(LintIssue {
                    line: n,
                    kind: "unparsed_image_syntax",
                    excerpt: Self::excerpt(line),
                });
            }

            // Crude balance check: "](" opens a span a ")" must close.
            if line.contains("![") && line.matches("](").count() > line.matches(')').count() {
                issues.push(LintIssue {
                    line: n,
                    kind: "unclosed_paren_after_link",
                    excerpt: Self::excerpt(line),
                });
            }

            // Quote count inside the first (...) span after "](" must
            // be 0 (no title) or 2 (one quoted title).
            if line.contains("![") && line.contains("](") && line.contains('"') {
                if let Some(open) = line.find("](") {
                    if let Some(close_rel) = line[open + 2..].find(')') {
                        let inside = &line[open + 2..open + 2 + close_rel];
                        let quotes = inside.matches('"').count();
                        if quotes != 0 && quotes != 2 {
                            issues.push(LintIssue {
                                line: n,
                                kind: "suspicious_quote_count_in_image_parens",
                                excerpt: Self::excerpt(line),
                            });
                        }
                    }
                }
            }

            // Attribute tail opened but never closed.
            if line.contains("){") && !line.contains('}') {
                issues.push(LintIssue {
                    line: n,
                    kind: "unclosed_image_attrs_brace",
                    excerpt: Self::excerpt(line),
                });
            }
        }

        issues
    }
}

impl Rule for MarkdownLintChecker {
    fn name(&self) -> &str {
        "markdown-lint"
    }

    fn description(&self) -> &str {
        "Check image/link syntax for constructs the renderer cannot handle"
    }

    fn check(&self, file_path: &Path, verbose: bool) -> Result<Vec<CheckResult>> {
        let content = read_file(file_path)?;
        let lines: Vec<&str> = content.lines().collect();
        let issues = self.iter_issues(&lines);

        if verbose {
            println!("  Found {} lint issue(s)", issues.len());
        }

        let results = issues
            .into_iter()
            .map(|issue| CheckResult {
                rule_name: self.name().to_string(),
                file_path: file_path.to_string_lossy().to_string(),
                has_issue: true,
                issue_count: 1,
                message: Some(format!("{}: {}", issue.kind, issue.excerpt)),
                location: Some(SourceLocation {
                    row: issue.line,
                    column: 1,
                }),
            })
            .collect();

        Ok(results)
    }

    fn convert(
        &self,
        file_path: &Path,
        _in_place: bool,
        _check_mode: bool,
        _verbose: bool,
    ) -> Result<ConvertResult> {
        // Lint findings need manual attention; image-paths handles the
        // mechanical part (placeholders, unicode normalization).
        Ok(ConvertResult {
            rule_name: self.name().to_string(),
            file_path: file_path.to_string_lossy().to_string(),
            fixes_applied: 0,
            changed: false,
            message: None,
        })
    }
}
