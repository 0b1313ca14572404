use md_syntax_helper::conversions::image_paths::{IMAGE_PLACEHOLDER, ImagePathsConverter};
use md_syntax_helper::rule::Rule;
use std::fs;

fn converter() -> ImagePathsConverter {
    ImagePathsConverter::new().unwrap()
}

#[test]
fn replaces_image_urls_with_placeholder() {
    let input = "![alt](assets/fig.png)\n\
                 ![cap](https://a.com/x.png \"Figure 1: caption\")\n";
    let (out, stats) = converter().transform(input);

    assert_eq!(
        out,
        format!(
            "![alt]({IMAGE_PLACEHOLDER})\n![cap]({IMAGE_PLACEHOLDER} \"Figure 1: caption\")\n"
        )
    );
    assert_eq!(stats.images_rewritten, 2);
}

#[test]
fn drops_standalone_data_uri_lines() {
    let input = "before\n\
                 [](data:image/png;base64,iVBORw0KGgo)\n\
                 after\n";
    let (out, stats) = converter().transform(input);

    assert_eq!(out, "before\nafter\n");
    assert_eq!(stats.data_uri_lines_dropped, 1);
    assert_eq!(stats.images_rewritten, 0);
}

#[test]
fn normalizes_katex_hostile_unicode() {
    // The no-break space becomes a plain space; the zero-width space
    // is dropped outright.
    let input = "a\u{00A0}b\u{200B}c\n";
    let (out, stats) = converter().transform(input);

    assert_eq!(out, "a bc\n");
    assert_eq!(stats.unicode_normalized, 2);
}

#[test]
fn second_pass_changes_nothing() {
    let input = "![alt](assets/fig.png \"t\")\ntext\n";
    let (first, _) = converter().transform(input);
    let (second, stats) = converter().transform(&first);

    assert_eq!(second, first);
    assert_eq!(stats.data_uri_lines_dropped, 0);
    assert_eq!(stats.unicode_normalized, 0);
}

#[test]
fn check_skips_placeholder_images() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("post.md");
    fs::write(
        &file,
        format!("![a]({IMAGE_PLACEHOLDER})\n![b](real/path.png)\n"),
    )
    .unwrap();

    let results = converter().check(&file, false).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0]
        .message
        .as_ref()
        .unwrap()
        .contains("real/path.png"));
    assert_eq!(results[0].location.as_ref().unwrap().row, 2);
}

#[test]
fn convert_in_place_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("post.md");
    fs::write(&file, "![a](x.png)\n").unwrap();

    let converter = converter();
    let result = converter.convert(&file, true, false, false).unwrap();
    assert!(result.changed);
    assert_eq!(result.fixes_applied, 1);
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        format!("![a]({IMAGE_PLACEHOLDER})\n")
    );

    let again = converter.convert(&file, true, false, false).unwrap();
    assert!(!again.changed);
}
