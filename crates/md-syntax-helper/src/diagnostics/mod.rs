pub mod markdown_lint;
