//! Command line arguments live in the `scrollbox-cli` crate so the build script can render a manpage from them.

pub use scrollbox_cli::{render_options_markdown, Args};
