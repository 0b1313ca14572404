//! Normalization of Unicode whitespace and invisible characters that
//! break KaTeX in strict-warn mode. These show up in Notion exports.

/// Characters to normalize, with their ASCII replacement ("" = drop).
pub const KATEX_UNICODE: &[(char, &str)] = &[
    ('\u{00A0}', " "), // NO-BREAK SPACE
    ('\u{2005}', " "), // FOUR-PER-EM SPACE
    ('\u{2009}', " "), // THIN SPACE
    ('\u{200A}', " "), // HAIR SPACE
    ('\u{200B}', ""),  // ZERO WIDTH SPACE
    ('\u{2060}', ""),  // WORD JOINER
    ('\u{2063}', ""),  // INVISIBLE SEPARATOR
    ('\u{FEFF}', ""),  // ZERO WIDTH NO-BREAK SPACE (BOM)
];

fn replacement(ch: char) -> Option<&'static str> {
    KATEX_UNICODE
        .iter()
        .find(|(c, _)| *c == ch)
        .map(|(_, repl)| *repl)
}

/// Replace or strip problematic characters. Returns the normalized
/// text and per-character replacement counts (in table order).
pub fn normalize_katex_unicode(text: &str) -> (String, Vec<(char, usize)>) {
    let mut counts = vec![0usize; KATEX_UNICODE.len()];
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        match replacement(ch) {
            Some(repl) => {
                if let Some(ix) = KATEX_UNICODE.iter().position(|(c, _)| *c == ch) {
                    counts[ix] += 1;
                }
                out.push_str(repl);
            }
            None => out.push(ch),
        }
    }

    let counted = KATEX_UNICODE
        .iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .map(|((c, _), n)| (*c, n))
        .collect();
    (out, counted)
}

/// Does this text contain any character the table would touch?
pub fn contains_katex_unicode(text: &str) -> bool {
    text.chars().any(|ch| replacement(ch).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exotic_spaces_become_ascii_spaces() {
        let input = "a\u{00A0}b\u{2009}c";
        let (out, counts) = normalize_katex_unicode(input);
        assert_eq!(out, "a b c");
        assert_eq!(counts.len(), 2);
        assert!(counts.contains(&('\u{00A0}', 1)));
        assert!(counts.contains(&('\u{2009}', 1)));
    }

    #[test]
    fn zero_width_characters_are_dropped() {
        let input = "x\u{200B}y\u{FEFF}z";
        let (out, counts) = normalize_katex_unicode(input);
        assert_eq!(out, "xyz");
        assert_eq!(counts.len(), 2);
        assert!(counts.contains(&('\u{200B}', 1)));
        assert!(counts.contains(&('\u{FEFF}', 1)));
    }

    #[test]
    fn mixed_replace_and_drop() {
        // NBSP keeps the word break; the zero-width space never had one.
        let input = "a\u{00A0}b\u{200B}c\u{2009}d";
        let (out, counts) = normalize_katex_unicode(input);
        assert_eq!(out, "a bc d");
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn clean_text_is_untouched() {
        let input = "plain ascii text\n";
        let (out, counts) = normalize_katex_unicode(input);
        assert_eq!(out, input);
        assert!(counts.is_empty());
        assert!(!contains_katex_unicode(input));
    }
}
