//! Footnote definition parsing, URL deduplication, and id generation.
//!
//! The site renders footnote references in text as `[^some-id]` with
//! matching definitions at the end of the file:
//!
//! ```text
//! [^some-id]: Short description. https://example.com
//! ```
//!
//! Definitions may continue over indented or blank lines. This module
//! collects those blocks, maps the URL each one mentions back to its
//! id, and mints readable ids for URLs that have none yet.

use regex::Regex;
use std::collections::{HashMap, HashSet};

/// A footnote definition block collected from a document.
#[derive(Debug, Clone)]
pub struct FootnoteDef {
    pub id: String,
    /// Content lines, with the `[^id]:` prefix stripped from the first.
    pub raw_lines: Vec<String>,
}

/// All definition blocks of a document, in document order, plus the
/// set of line indices they occupy (so the rewrite pass can skip them).
#[derive(Debug, Default)]
pub struct DefinitionSet {
    defs: Vec<FootnoteDef>,
    by_id: HashMap<String, usize>,
    occupied: HashSet<usize>,
}

impl DefinitionSet {
    /// Record a flushed definition block. A repeated id overwrites the
    /// earlier content but keeps its original position; tolerated, not
    /// an error.
    fn insert(&mut self, id: String, raw_lines: Vec<String>, line_indices: &[usize]) {
        self.occupied.extend(line_indices.iter().copied());
        match self.by_id.get(&id) {
            Some(&idx) => self.defs[idx].raw_lines = raw_lines,
            None => {
                self.by_id.insert(id.clone(), self.defs.len());
                self.defs.push(FootnoteDef { id, raw_lines });
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FootnoteDef> {
        self.defs.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|d| d.id.as_str())
    }

    /// Is this line index part of a definition block?
    pub fn occupies(&self, line_index: usize) -> bool {
        self.occupied.contains(&line_index)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// URL -> footnote id. One id per URL; built from existing definitions
/// and grown (never shrunk) while rewriting.
#[derive(Debug, Default)]
pub struct UrlRegistry {
    by_url: HashMap<String, String>,
}

impl UrlRegistry {
    pub fn get(&self, url: &str) -> Option<&str> {
        self.by_url.get(url).map(String::as_str)
    }

    /// Register `url -> id` unless the URL is already mapped. When two
    /// manually authored definitions mention the same URL, the first id
    /// wins.
    pub fn insert_first(&mut self, url: &str, id: &str) {
        self.by_url
            .entry(url.to_string())
            .or_insert_with(|| id.to_string());
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}

/// Footnote ids in use within one document. Every id handed out by
/// [`IdSet::mint`] is inserted before it is returned, so ids stay
/// unique for the document's lifetime.
#[derive(Debug, Default)]
pub struct IdSet {
    ids: HashSet<String>,
}

impl IdSet {
    pub fn insert(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Create a readable, stable-ish id from a URL, unique within this
    /// set. Domain plus last path segment reads well for arxiv/hf/etc.
    pub fn mint(&mut self, url: &str) -> String {
        let trimmed = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        let (domain, rest) = match trimmed.split_once('/') {
            Some((domain, rest)) => (domain, rest.trim_start_matches('/')),
            None => (trimmed, ""),
        };
        let last = if rest.is_empty() {
            domain
        } else {
            rest.rsplit('/').next().unwrap_or(domain)
        };

        let mut base = slugify(&format!("{domain}-{last}"));
        base.truncate(48);
        if base.is_empty() {
            base = "ext".to_string();
        }

        let mut candidate = base.clone();
        let mut k = 2;
        while self.ids.contains(&candidate) {
            candidate = format!("{base}-{k}");
            k += 1;
        }
        self.ids.insert(candidate.clone());
        candidate
    }
}

/// Fold a string to lowercase `[a-z0-9]` runs joined by single dashes,
/// with no leading or trailing dash.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for ch in s.trim().chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Line-oriented scanner for footnote definition blocks.
pub struct DefinitionScanner {
    def_re: Regex,
    cont_re: Regex,
    url_re: Regex,
}

impl Default for DefinitionScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionScanner {
    pub fn new() -> Self {
        Self {
            // [^id]: rest-of-line
            def_re: Regex::new(r"^\[\^([^\]]+)\]:\s*(.*)$").unwrap(),
            // Continuation lines are indented by two+ spaces or a tab
            cont_re: Regex::new(r"^(?:\s{2,}|\t).+").unwrap(),
            url_re: Regex::new(r"https?://\S+").unwrap(),
        }
    }

    /// Scan a document (lines without trailing newlines) and collect
    /// its definition blocks. A definition opens on a `[^id]:` line and
    /// stays open across blank or indented lines; any other line (or
    /// the end of input) closes it.
    pub fn scan(&self, lines: &[&str]) -> DefinitionSet {
        let mut set = DefinitionSet::default();
        let mut current: Option<(String, Vec<String>, Vec<usize>)> = None;

        for (ix, line) in lines.iter().enumerate() {
            if let Some(caps) = self.def_re.captures(line) {
                if let Some((id, raw, idxs)) = current.take() {
                    set.insert(id, raw, &idxs);
                }
                current = Some((caps[1].to_string(), vec![caps[2].to_string()], vec![ix]));
                continue;
            }

            let continues = line.trim().is_empty() || self.cont_re.is_match(line);
            if continues {
                if let Some((_, raw, idxs)) = current.as_mut() {
                    raw.push((*line).to_string());
                    idxs.push(ix);
                    continue;
                }
            }

            // Ordinary text closes any open block.
            if let Some((id, raw, idxs)) = current.take() {
                set.insert(id, raw, &idxs);
            }
        }

        if let Some((id, raw, idxs)) = current.take() {
            set.insert(id, raw, &idxs);
        }
        set
    }

    /// Build the URL registry from parsed definitions: the first URL a
    /// definition mentions (raw lines joined with spaces) maps back to
    /// its id.
    pub fn url_map(&self, defs: &DefinitionSet) -> UrlRegistry {
        let mut registry = UrlRegistry::default();
        for def in defs.iter() {
            let joined = def.raw_lines.join(" ");
            if let Some(m) = self.url_re.find(&joined) {
                let url = m.as_str().trim_end_matches([')', '.', ',', ';']);
                registry.insert_first(url, &def.id);
            }
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> DefinitionSet {
        let lines: Vec<&str> = text.lines().collect();
        DefinitionScanner::new().scan(&lines)
    }

    #[test]
    fn scan_collects_definitions_and_continuations() {
        let set = scan(
            "Intro text\n\
             [^a]: First. https://a.com/x\n\
             \n\
             [^b]: Second line one\n\
             \x20\x20continued here\n\
             Closing prose\n",
        );

        assert_eq!(set.len(), 2);
        let defs: Vec<_> = set.iter().collect();
        assert_eq!(defs[0].id, "a");
        assert_eq!(defs[1].id, "b");
        assert_eq!(
            defs[1].raw_lines,
            vec!["Second line one".to_string(), "  continued here".to_string()]
        );

        // Lines 1..=4 belong to definition blocks; 0 and 5 do not.
        assert!(!set.occupies(0));
        assert!(set.occupies(1));
        assert!(set.occupies(2));
        assert!(set.occupies(3));
        assert!(set.occupies(4));
        assert!(!set.occupies(5));
    }

    #[test]
    fn duplicate_id_last_definition_wins() {
        let set = scan("[^x]: old. https://a.com/1\ntext\n[^x]: new. https://a.com/2\n");
        assert_eq!(set.len(), 1);
        let def = set.iter().next().unwrap();
        assert_eq!(def.raw_lines, vec!["new. https://a.com/2".to_string()]);
    }

    #[test]
    fn url_map_first_id_wins_and_trims_punctuation() {
        let scanner = DefinitionScanner::new();
        let text = "[^one]: See https://a.com/paper.\n\
                    text\n\
                    [^two]: Also https://a.com/paper.\n\
                    text\n\
                    [^three]: nothing to link here\n";
        let lines: Vec<&str> = text.lines().collect();
        let set = scanner.scan(&lines);
        let map = scanner.url_map(&set);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("https://a.com/paper"), Some("one"));
    }

    #[test]
    fn slugify_folds_and_trims() {
        assert_eq!(slugify("ArXiv.org/abs/1234"), "arxiv-org-abs-1234");
        assert_eq!(slugify("--hello__world--"), "hello-world");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn mint_uses_domain_and_last_segment() {
        let mut ids = IdSet::default();
        assert_eq!(
            ids.mint("https://arxiv.org/abs/1234.5678"),
            "arxiv-org-1234-5678"
        );
        assert_eq!(ids.mint("http://example.com"), "example-com-example-com");
    }

    #[test]
    fn mint_appends_integer_suffix_on_collision() {
        let mut ids = IdSet::default();
        assert_eq!(ids.mint("https://a.com/docs/index"), "a-com-index");
        assert_eq!(ids.mint("https://a.com/other/index"), "a-com-index-2");
        assert_eq!(ids.mint("https://a.com/third/index"), "a-com-index-3");
    }

    #[test]
    fn mint_falls_back_to_ext() {
        let mut ids = IdSet::default();
        assert_eq!(ids.mint("https://***/"), "ext");
        assert_eq!(ids.mint("https://***/"), "ext-2");
    }

    #[test]
    fn minted_ids_respect_seeded_ids() {
        let mut ids = IdSet::default();
        ids.insert("a-com-index");
        assert_eq!(ids.mint("https://a.com/docs/index"), "a-com-index-2");
    }
}
