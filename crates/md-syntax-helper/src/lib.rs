//! Helper library for checking and fixing Markdown content.
//!
//! Each transformation is a [`rule::Rule`]: it can report violations
//! (`check`) or rewrite a file (`convert`). The binary wires the rules
//! to a `check`/`convert`/`list-rules` CLI.

pub mod conversions;
pub mod diagnostics;
pub mod footnotes;
pub mod rule;
pub mod utils;
