// figure-captions: fold "Figure N: ..." caption paragraphs into the
// title of the image line above them, so the renderer can style the
// caption (image titles render as a caption block).
//
//   ![alt](url)
//   **Figure 2:** Results on the held-out set.
//
// becomes
//
//   ![alt](url "Figure 2: Results on the held-out set.")
//
// Images that already carry a title keep it; the duplicate caption
// paragraph is still removed. A caption that runs on into ordinary
// prose is split: the sentence stays in the title, the remainder
// becomes its own paragraph.

use anyhow::Result;
use regex::Regex;
use std::path::Path;

use crate::rule::{CheckResult, ConvertResult, Rule, SourceLocation};
use crate::utils::{read_file, write_file};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptionStats {
    pub images_titled: usize,
    pub captions_removed: usize,
    pub captions_split: usize,
}

pub struct FigureCaptionsConverter {
    fence_re: Regex,
    // Whole-line image: ![alt](url "optional title"){optional attrs}
    img_re: Regex,
    // Caption paragraph: Figure 2: ... / **Figure 2:** ... / Figure 12(a). ...
    caption_re: Regex,
    // A caption sentence followed by ordinary prose we should keep.
    split_re: Regex,
}

impl FigureCaptionsConverter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fence_re: Regex::new(r"^\s*```").unwrap(),
            img_re: Regex::new(
                r#"^(?P<prefix>\s*)!\[(?P<alt>[^\]]*)\]\((?P<url>[^)\s]+)(?:\s+"(?P<title>[^"]*)")?\)(?P<attrs>\{[^}]*\})?\s*$"#,
            )
            .unwrap(),
            caption_re: Regex::new(
                r"(?i)^\s*(?:\*\*)?figure\s+(?P<num>\d+(?:\([a-z]\))?)\s*[:.]\s*(?P<body>.+?)(?:\*\*)?\s*$",
            )
            .unwrap(),
            split_re: Regex::new(r"^(?P<cap>.*?\.)\s+(?P<rest>(?:Beyond|We|In|This)\b.*)$")
                .unwrap(),
        })
    }

    /// Normalize caption text to plain prose: strip bold markers and
    /// collapse whitespace. Styling belongs to the renderer, not the
    /// markdown.
    fn clean_caption(raw: &str) -> String {
        let mut s = raw.trim().to_string();
        if s.starts_with("**") && s.ends_with("**") && s.len() >= 4 {
            s = s[2..s.len() - 2].trim().to_string();
        }
        if let Some(rest) = s.strip_prefix("**") {
            s = rest.to_string();
        }
        if let Some(rest) = s.strip_suffix("**") {
            s = rest.to_string();
        }
        s = s.replace("**", "").replace("__", "");
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Double-quote a title, HTML-escaping embedded quotes so the
    /// markdown stays parseable (renderers show &quot; as ").
    fn quote_title(title: &str) -> String {
        format!(" \"{}\"", title.replace('"', "&quot;"))
    }

    /// Promote caption paragraphs into image titles across a document.
    pub fn transform(&self, text: &str) -> (String, CaptionStats) {
        let lines: Vec<&str> = text.lines().collect();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        let mut stats = CaptionStats::default();

        let mut in_fence = false;
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];

            if self.fence_re.is_match(line) {
                in_fence = !in_fence;
                out.push(line.to_string());
                i += 1;
                continue;
            }
            if in_fence {
                out.push(line.to_string());
                i += 1;
                continue;
            }

            let Some(img) = self.img_re.captures(line) else {
                out.push(line.to_string());
                i += 1;
                continue;
            };

            // Image line found; look ahead past blank lines for a caption.
            let mut j = i + 1;
            while j < lines.len() && lines[j].trim().is_empty() {
                j += 1;
            }
            let caption = if j < lines.len() {
                self.caption_re.captures(lines[j])
            } else {
                None
            };
            let Some(cap) = caption else {
                out.push(line.to_string());
                i += 1;
                continue;
            };

            let mut caption_text = Self::clean_caption(&format!(
                "Figure {}: {}",
                &cap["num"],
                cap["body"].trim()
            ));

            let mut remainder: Option<String> = None;
            let full_caption = caption_text.clone();
            if let Some(split) = self.split_re.captures(&full_caption) {
                caption_text = split["cap"].trim().to_string();
                remainder = Some(split["rest"].trim().to_string());
                stats.captions_split += 1;
            }

            let has_title = img.name("title").is_some();
            if has_title {
                // Keep the existing title; just drop the duplicate caption.
                out.push(line.to_string());
            } else {
                let prefix = img.name("prefix").map_or("", |m| m.as_str());
                let alt = img.name("alt").map_or("", |m| m.as_str());
                let url = &img["url"];
                let attrs = img.name("attrs").map_or("", |m| m.as_str());
                out.push(format!(
                    "{prefix}![{alt}]({url}{}){attrs}",
                    Self::quote_title(&caption_text)
                ));
                stats.images_titled += 1;
            }
            stats.captions_removed += 1;

            // Collapse blank runs between image and caption to one blank line.
            if j > i + 1 {
                out.push(String::new());
            }
            if let Some(rest) = remainder {
                out.push(rest);
            }

            i = j + 1;
        }

        let mut result = out.join("\n");
        if text.ends_with('\n') {
            result.push('\n');
        }
        (result, stats)
    }
}

impl Rule for FigureCaptionsConverter {
    fn name(&self) -> &str {
        "figure-captions"
    }

    fn description(&self) -> &str {
        "Promote Figure-caption paragraphs into image titles"
    }

    fn check(&self, file_path: &Path, verbose: bool) -> Result<Vec<CheckResult>> {
        let content = read_file(file_path)?;
        let lines: Vec<&str> = content.lines().collect();

        let mut results = Vec::new();
        let mut in_fence = false;
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            if self.fence_re.is_match(line) {
                in_fence = !in_fence;
                i += 1;
                continue;
            }
            if in_fence || !self.img_re.is_match(line) {
                i += 1;
                continue;
            }
            let mut j = i + 1;
            while j < lines.len() && lines[j].trim().is_empty() {
                j += 1;
            }
            if j < lines.len() && self.caption_re.is_match(lines[j]) {
                results.push(CheckResult {
                    rule_name: self.name().to_string(),
                    file_path: file_path.to_string_lossy().to_string(),
                    has_issue: true,
                    issue_count: 1,
                    message: Some("Caption paragraph could be folded into image title".to_string()),
                    location: Some(SourceLocation {
                        row: j + 1,
                        column: 1,
                    }),
                });
                i = j + 1;
                continue;
            }
            i += 1;
        }

        if verbose {
            println!("  Found {} promotable caption(s)", results.len());
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
            fixes_applied: stats.captions_removed,
            changed,
            message: Some(format!(
                "captions promoted: {}; split: {}",
                stats.images_titled, stats.captions_split
            )),
        })
    }
}
