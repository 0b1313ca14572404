// external-links: convert inline external links into the footnote
// reference style the site already renders.
//
//   [label](https://example.com/page)  ->  label[^example-com-page]
//
// with a definition appended at the end of the file:
//
//   [^example-com-page]: label. https://example.com/page
//
// Existing definition blocks are parsed first, so footnotes keep their
// ids and a URL that already has a definition is reused rather than
// duplicated. Fenced code blocks and the definition blocks themselves
// are emitted verbatim. Only http/https links count as external;
// image syntax `![alt](...)` is never touched.

use anyhow::Result;
use regex::{Captures, Regex};
use std::path::Path;

use crate::footnotes::{DefinitionScanner, IdSet, UrlRegistry};
use crate::rule::{CheckResult, ConvertResult, Rule, SourceLocation};
use crate::utils::{read_file, write_file};

/// A footnote minted during the rewrite pass, in first-encounter order.
#[derive(Debug, Clone)]
pub struct NewFootnote {
    pub id: String,
    /// First label seen for this URL; used as the definition text.
    pub label: String,
    pub url: String,
}

/// Result of rewriting one document.
#[derive(Debug)]
pub struct RewriteOutcome {
    pub content: String,
    pub links_rewritten: usize,
    pub new_footnotes: Vec<NewFootnote>,
}

impl RewriteOutcome {
    pub fn summary(&self) -> String {
        format!("new footnotes: {}", self.new_footnotes.len())
    }
}

/// An inline external link that would be rewritten.
#[derive(Debug)]
pub struct LinkOccurrence {
    pub row: usize,
    pub column: usize,
    pub url: String,
}

pub struct ExternalLinksConverter {
    scanner: DefinitionScanner,
    // Single-line markdown links: [text](https://example.com) with an
    // optional quoted title. The regex crate has no lookbehind, so the
    // image `!` prefix is captured and such matches are put back
    // unchanged.
    link_re: Regex,
}

impl ExternalLinksConverter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            scanner: DefinitionScanner::new(),
            link_re: Regex::new(
                r#"(!?)\[(?P<label>[^\]]+)\]\((?P<url>https?://[^)\s]+)(?:\s+"[^"]*")?\)"#,
            )
            .unwrap(),
        })
    }

    fn is_fence_line(line: &str) -> bool {
        line.trim_start().starts_with("```")
    }

    /// Rewrite a document. Pure over its input: returns the new content
    /// plus the ordered list of footnotes that were minted.
    pub fn rewrite(&self, content: &str) -> RewriteOutcome {
        // Keep line endings on the rewrite side; parse on stripped lines.
        let raw_lines: Vec<&str> = content.split_inclusive('\n').collect();
        let stripped: Vec<&str> = raw_lines
            .iter()
            .map(|l| l.trim_end_matches('\n').trim_end_matches('\r'))
            .collect();

        let defs = self.scanner.scan(&stripped);
        let mut registry = self.scanner.url_map(&defs);
        let mut used = IdSet::default();
        for id in defs.ids() {
            used.insert(id);
        }

        let mut new_footnotes: Vec<NewFootnote> = Vec::new();
        let mut links_rewritten = 0usize;
        let mut out = String::with_capacity(content.len());
        let mut in_code = false;

        for (ix, raw) in raw_lines.iter().enumerate() {
            if Self::is_fence_line(stripped[ix]) {
                in_code = !in_code;
                out.push_str(raw);
                continue;
            }
            if in_code || defs.occupies(ix) {
                out.push_str(raw);
                continue;
            }

            let rewritten = self.link_re.replace_all(raw, |caps: &Captures<'_>| {
                // Image syntax: put the match back untouched.
                if !caps[1].is_empty() {
                    return caps[0].to_string();
                }
                let label = &caps["label"];
                let url = &caps["url"];
                let id = self.resolve_or_mint(
                    url,
                    label,
                    &mut registry,
                    &mut used,
                    &mut new_footnotes,
                );
                links_rewritten += 1;

                let label = label.trim();
                if label.is_empty() {
                    format!("[^{id}]")
                } else {
                    format!("{label}[^{id}]")
                }
            });
            out.push_str(&rewritten);
        }

        self.append_definitions(&mut out, &new_footnotes);

        RewriteOutcome {
            content: out,
            links_rewritten,
            new_footnotes,
        }
    }

    /// Reuse the registered id for `url`, or mint a new one and record
    /// the footnote. Registering immediately makes later occurrences of
    /// the same URL (same line or later lines) reuse the id.
    fn resolve_or_mint(
        &self,
        url: &str,
        label: &str,
        registry: &mut UrlRegistry,
        used: &mut IdSet,
        new_footnotes: &mut Vec<NewFootnote>,
    ) -> String {
        if let Some(id) = registry.get(url) {
            return id.to_string();
        }
        let id = used.mint(url);
        registry.insert_first(url, &id);
        new_footnotes.push(NewFootnote {
            id: id.clone(),
            label: label.to_string(),
            url: url.to_string(),
        });
        id
    }

    /// Append definitions for newly minted footnotes, separated from
    /// the body by exactly one blank line.
    fn append_definitions(&self, out: &mut String, new_footnotes: &[NewFootnote]) {
        if new_footnotes.is_empty() {
            return;
        }

        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        let last_line_nonblank = out
            .rsplit_terminator('\n')
            .next()
            .is_some_and(|l| !l.trim().is_empty());
        if last_line_nonblank {
            out.push('\n');
        }

        for nf in new_footnotes {
            let desc = nf.label.trim();
            if desc.is_empty() {
                out.push_str(&format!("[^{}]: {}\n", nf.id, nf.url));
            } else if desc.ends_with(['.', '!', '?', ':', ';']) {
                // Label already ends a sentence; no extra period.
                out.push_str(&format!("[^{}]: {} {}\n", nf.id, desc, nf.url));
            } else {
                out.push_str(&format!("[^{}]: {}. {}\n", nf.id, desc, nf.url));
            }
        }
    }

    /// Find every inline external link that the rewrite pass would
    /// touch, with its position for reporting.
    pub fn find_links(&self, content: &str) -> Vec<LinkOccurrence> {
        let lines: Vec<&str> = content.lines().collect();
        let defs = self.scanner.scan(&lines);

        let mut found = Vec::new();
        let mut in_code = false;
        for (ix, line) in lines.iter().enumerate() {
            if Self::is_fence_line(line) {
                in_code = !in_code;
                continue;
            }
            if in_code || defs.occupies(ix) {
                continue;
            }
            for caps in self.link_re.captures_iter(line) {
                if !caps[1].is_empty() {
                    continue;
                }
                let m = caps.get(0).map(|m| m.start()).unwrap_or(0);
                found.push(LinkOccurrence {
                    row: ix + 1,
                    column: m + 1,
                    url: caps["url"].to_string(),
                });
            }
        }
        found
    }
}

impl Rule for ExternalLinksConverter {
    fn name(&self) -> &str {
        "external-links"
    }

    fn description(&self) -> &str {
        "Convert inline external links to footnote references, deduplicated by URL"
    }

    fn check(&self, file_path: &Path, verbose: bool) -> Result<Vec<CheckResult>> {
        let content = read_file(file_path)?;
        let links = self.find_links(&content);

        if verbose {
            if links.is_empty() {
                println!("  No inline external links found");
            } else {
                println!("  Found {} inline external link(s)", links.len());
            }
        }

        let results = links
            .into_iter()
            .map(|link| CheckResult {
                rule_name: self.name().to_string(),
                file_path: file_path.to_string_lossy().to_string(),
                has_issue: true,
                issue_count: 1,
                message: Some(format!("Inline external link: {}", link.url)),
                location: Some(SourceLocation {
                    row: link.row,
                    column: link.column,
                }),
            })
            .collect();

        Ok(results)
    }

    fn convert(
        &self,
        file_path: &Path,
        in_place: bool,
        check_mode: bool,
        _verbose: bool,
    ) -> Result<ConvertResult> {
        let content = read_file(file_path)?;
        let outcome = self.rewrite(&content);
        let changed = outcome.content != content;

        if changed && in_place && !check_mode {
            write_file(file_path, &outcome.content)?;
        }

        Ok(ConvertResult {
            rule_name: self.name().to_string(),
            file_path: file_path.to_string_lossy().to_string(),
            fixes_applied: outcome.links_rewritten,
            changed,
            message: Some(outcome.summary()),
        })
    }
}
