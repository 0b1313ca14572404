// math-tags: convert `<i>...</i>` spans left over from HTML exports
// into inline `$...$` math.
//
//   Input:  the bound <i>B_problem</i> tightens
//   Output: the bound $B_\text{problem}$ tightens
//
// Word subscripts inside the converted expression are normalized to
// `\text{...}` so KaTeX renders them as words instead of a product of
// single-letter variables. Applies to the whole file, matching across
// lines; exports never put these tags inside code fences.

use anyhow::Result;
use regex::{Captures, Regex};
use std::path::Path;

use crate::rule::{CheckResult, ConvertResult, Rule, SourceLocation};
use crate::utils::{read_file, write_file};

pub struct MathTagsConverter {
    // <i ...>...</i>, attributes allowed, lazy, across newlines
    i_tag_re: Regex,
    text_sub_re: Regex,
    mathrm_sub_re: Regex,
    braced_sub_re: Regex,
    bare_sub_re: Regex,
}

impl MathTagsConverter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            i_tag_re: Regex::new(r"(?is)<i\b[^>]*>(.*?)</i>").unwrap(),
            // X_{\text{word}} -> X_\text{word}
            text_sub_re: Regex::new(r"([A-Za-z])_\{\\text\{([a-z]{2,})\}\}").unwrap(),
            // X_{\mathrm{word}} -> X_\text{word}
            mathrm_sub_re: Regex::new(r"([A-Za-z])_\{\\mathrm\{([a-z]{2,})\}\}").unwrap(),
            // X_{word} -> X_\text{word}
            braced_sub_re: Regex::new(r"([A-Za-z])_\{([a-z]{2,})\}").unwrap(),
            // X_word -> X_\text{word}
            bare_sub_re: Regex::new(r"\b([A-Za-z])_([a-z]{2,})\b").unwrap(),
        })
    }

    /// Normalize multi-letter word subscripts to `\text{...}` form.
    /// Mechanical, best-effort; single-letter subscripts are left alone.
    fn normalize_subscripts(&self, expr: &str) -> String {
        let expr = self.text_sub_re.replace_all(expr, r"${1}_\text{${2}}");
        let expr = self.mathrm_sub_re.replace_all(&expr, r"${1}_\text{${2}}");
        let expr = self.braced_sub_re.replace_all(&expr, r"${1}_\text{${2}}");
        self.bare_sub_re
            .replace_all(&expr, r"${1}_\text{${2}}")
            .into_owned()
    }

    /// Replace every `<i>...</i>` with `$...$`, normalizing subscripts
    /// in the enclosed expression. Returns the new text and the number
    /// of spans converted.
    pub fn transform(&self, text: &str) -> (String, usize) {
        let mut converted = 0usize;
        let out = self.i_tag_re.replace_all(text, |caps: &Captures<'_>| {
            converted += 1;
            format!("${}$", self.normalize_subscripts(&caps[1]))
        });
        (out.into_owned(), converted)
    }
}

impl Rule for MathTagsConverter {
    fn name(&self) -> &str {
        "math-tags"
    }

    fn description(&self) -> &str {
        "Convert <i>...</i> spans to inline $...$ math with \\text{} subscripts"
    }

    fn check(&self, file_path: &Path, verbose: bool) -> Result<Vec<CheckResult>> {
        let content = read_file(file_path)?;

        let mut results = Vec::new();
        for m in self.i_tag_re.find_iter(&content) {
            let row = content[..m.start()].matches('\n').count() + 1;
            let line_start = content[..m.start()].rfind('\n').map_or(0, |p| p + 1);
            results.push(CheckResult {
                rule_name: self.name().to_string(),
                file_path: file_path.to_string_lossy().to_string(),
                has_issue: true,
                issue_count: 1,
                message: Some("HTML <i> span should be inline math".to_string()),
                location: Some(SourceLocation {
                    row,
                    column: m.start() - line_start + 1,
                }),
            });
        }

        if verbose {
            println!("  Found {} <i> span(s)", results.len());
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
        let (new_content, converted) = self.transform(&content);
        let changed = new_content != content;

        if changed && in_place && !check_mode {
            write_file(file_path, &new_content)?;
        }

        Ok(ConvertResult {
            rule_name: self.name().to_string(),
            file_path: file_path.to_string_lossy().to_string(),
            fixes_applied: converted,
            changed,
            message: Some(format!("math spans converted: {converted}")),
        })
    }
}
