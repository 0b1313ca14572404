// image-paths: replace image URLs with a placeholder so a "no-image"
// rendition of a page still shows alt text and captions.
//
//   ![alt](assets/fig3.png "Figure 3: ...")
// becomes
//   ![alt](__IMAGE_PLACEHOLDER__ "Figure 3: ...")
//
// Standalone base64 data-URI link lines (export bloat) are deleted,
// and KaTeX-hostile Unicode is normalized on the way through.

use anyhow::Result;
use regex::{Captures, Regex};
use std::path::Path;

use crate::rule::{CheckResult, ConvertResult, Rule, SourceLocation};
use crate::utils::unicode::normalize_katex_unicode;
use crate::utils::{read_file, write_file};

/// The renderer treats this URL specially and shows only alt/caption.
pub const IMAGE_PLACEHOLDER: &str = "__IMAGE_PLACEHOLDER__";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StripStats {
    pub images_rewritten: usize,
    pub data_uri_lines_dropped: usize,
    pub unicode_normalized: usize,
}

pub struct ImagePathsConverter {
    // ![alt](url "title"): url without whitespace, title double-quoted
    img_re: Regex,
    // [](data:image/...;base64,...) alone on a line
    data_uri_re: Regex,
}

impl ImagePathsConverter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            img_re: Regex::new(
                r#"!\[(?P<alt>[^\]]*)\]\((?P<url>[^)\s]+)(?P<title>\s+"[^"]*")?\)"#,
            )
            .unwrap(),
            data_uri_re: Regex::new(r"^\s*\[\]\(data:image/[^;]+;base64,[^)]+\)\s*$").unwrap(),
        })
    }

    /// Rewrite a document: drop data-URI lines, normalize Unicode, and
    /// point every image at the placeholder.
    pub fn transform(&self, text: &str) -> (String, StripStats) {
        let mut stats = StripStats::default();

        let mut kept = String::with_capacity(text.len());
        for line in text.split_inclusive('\n') {
            if self
                .data_uri_re
                .is_match(line.trim_end_matches('\n').trim_end_matches('\r'))
            {
                stats.data_uri_lines_dropped += 1;
                continue;
            }
            kept.push_str(line);
        }

        let (normalized, counts) = normalize_katex_unicode(&kept);
        stats.unicode_normalized = counts.iter().map(|(_, n)| n).sum();

        let out = self.img_re.replace_all(&normalized, |caps: &Captures<'_>| {
            stats.images_rewritten += 1;
            let alt = caps.name("alt").map_or("", |m| m.as_str());
            let title = caps.name("title").map_or("", |m| m.as_str());
            format!("![{alt}]({IMAGE_PLACEHOLDER}{title})")
        });

        (out.into_owned(), stats)
    }
}

impl Rule for ImagePathsConverter {
    fn name(&self) -> &str {
        "image-paths"
    }

    fn description(&self) -> &str {
        "Replace image URLs with __IMAGE_PLACEHOLDER__ and drop data-URI lines"
    }

    // Discards real image paths, so never part of the default set.
    fn default_for_convert(&self) -> bool {
        false
    }

    fn check(&self, file_path: &Path, verbose: bool) -> Result<Vec<CheckResult>> {
        let content = read_file(file_path)?;

        let mut results = Vec::new();
        for (ix, line) in content.lines().enumerate() {
            for caps in self.img_re.captures_iter(line) {
                let url = &caps["url"];
                if url == IMAGE_PLACEHOLDER {
                    continue;
                }
                let column = caps.get(0).map_or(0, |m| m.start()) + 1;
                results.push(CheckResult {
                    rule_name: self.name().to_string(),
                    file_path: file_path.to_string_lossy().to_string(),
                    has_issue: true,
                    issue_count: 1,
                    message: Some(format!("Image with a concrete path: {url}")),
                    location: Some(SourceLocation { row: ix + 1, column }),
                });
            }
        }

        if verbose {
            println!("  Found {} image path(s) to strip", results.len());
        }
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
        let (new_content, stats) = self.transform(&content);
        let changed = new_content != content;

        if changed && in_place && !check_mode {
            write_file(file_path, &new_content)?;
        }

        Ok(ConvertResult {
            rule_name: self.name().to_string(),
            file_path: file_path.to_string_lossy().to_string(),
            fixes_applied: stats.images_rewritten + stats.data_uri_lines_dropped,
            changed,
            message: Some(format!(
                "images rewritten: {}; data-uri lines dropped: {}; unicode normalized: {}",
                stats.images_rewritten, stats.data_uri_lines_dropped, stats.unicode_normalized
            )),
        })
    }
}
