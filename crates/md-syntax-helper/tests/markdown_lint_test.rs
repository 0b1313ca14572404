use md_syntax_helper::diagnostics::markdown_lint::MarkdownLintChecker;
use md_syntax_helper::rule::Rule;
use std::fs;

fn checker() -> MarkdownLintChecker {
    MarkdownLintChecker::new().unwrap()
}

fn kinds(text: &str) -> Vec<&'static str> {
    let lines: Vec<&str> = text.lines().collect();
    checker()
        .iter_issues(&lines)
        .into_iter()
        .map(|i| i.kind)
        .collect()
}

#[test]
fn clean_document_has_no_issues() {
    let text = "# Title\n\
                Some prose with a [link](https://a.com/b).\n\
                ![alt](assets/x.png \"Figure 1: caption\")\n";
    assert!(kinds(text).is_empty());
}

#[test]
fn detects_inline_base64_data_uri() {
    let text = "[](data:image/png;base64,iVBORw0KGgoAAAA)\n";
    assert_eq!(kinds(text), vec!["inline_base64_data_uri"]);
}

#[test]
fn detects_katex_hostile_unicode() {
    let text = "some\u{2009}math\n";
    assert_eq!(kinds(text), vec!["katex_unicode_whitespace"]);
}

#[test]
fn detects_unparsed_image_syntax() {
    // Unclosed paren: unparseable, and "](" outnumbers ")".
    let found = kinds("![alt](broken url\n");
    assert!(found.contains(&"unparsed_image_syntax"));
    assert!(found.contains(&"unclosed_paren_after_link"));
}

#[test]
fn detects_suspicious_quote_count() {
    let found = kinds("![x](u \"a\" \"b\")\n");
    assert!(found.contains(&"suspicious_quote_count_in_image_parens"));
}

#[test]
fn detects_unclosed_attrs_brace() {
    let found = kinds("![x](u.png){width=50%\n");
    assert!(found.contains(&"unclosed_image_attrs_brace"));
}

#[test]
fn issue_lines_are_one_indexed() {
    let text = "fine\n[](data:image/png;base64,AAAA)\n";
    let lines: Vec<&str> = text.lines().collect();
    let issues = checker().iter_issues(&lines);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].line, 2);
}

#[test]
fn check_maps_issues_to_results() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("post.md");
    fs::write(&file, "ok\n[](data:image/png;base64,AAAA)\n").unwrap();

    let checker = checker();
    let results = checker.check(&file, false).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].has_issue);
    assert!(results[0]
        .message
        .as_ref()
        .unwrap()
        .starts_with("inline_base64_data_uri"));

    // No auto-fix: convert never changes anything.
    let convert = checker.convert(&file, true, false, false).unwrap();
    assert!(!convert.changed);
    assert_eq!(convert.fixes_applied, 0);
}
