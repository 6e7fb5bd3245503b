//! Shared CLI definitions for scrollbox.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser};

/// Command-line arguments for scrollbox
#[derive(Clone, Parser, Debug, Default)]
#[command(
    name = "scrollbox",
    version,
    about = "Infinite scrolling list in the terminal",
    long_about = "Loads numbered items one at a time as you scroll towards the end of the list. \
                  The list flips to a horizontal layout while the newest item falls inside the \
                  horizontal range and jumps to the items just outside that range the first time \
                  they appear."
)]
pub struct Args {
    /// Maximum number of items to load before the list is finished (default: 50).
    /// Overrides config [scroll] finish_threshold and SCROLLBAR_FINISH.
    #[arg(long = "finish", value_name = "N")]
    pub finish: Option<u32>,

    /// First item value (inclusive) shown with a horizontal layout (default: 21).
    /// Overrides config [scroll] horizontal_lower and HORIZONTAL_SCROLLBAR_LOWER.
    #[arg(long = "lower", value_name = "N")]
    pub lower: Option<u32>,

    /// Last item value (inclusive) shown with a horizontal layout (default: 30).
    /// Overrides config [scroll] horizontal_upper and HORIZONTAL_SCROLLBAR_UPPER.
    #[arg(long = "upper", value_name = "N")]
    pub upper: Option<u32>,

    /// Simulated fetch latency in milliseconds (default: 500)
    #[arg(long = "latency-ms", value_name = "MS")]
    pub latency_ms: Option<u64>,

    /// Make every Nth simulated fetch fail (default: 0, never fail)
    #[arg(long = "fail-every", value_name = "N")]
    pub fail_every: Option<u32>,

    /// Enable debug mode to show operational information and verbose logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/scrollbox/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let mut parts = Vec::new();
        if let Some(s) = arg.get_short() {
            parts.push(format!("-{s}"));
        }
        if let Some(l) = arg.get_long() {
            parts.push(format!("--{l}"));
        }
        let op = parts.join(", ");
        let placeholder: String = if arg.get_action().takes_values() {
            arg.get_value_names()
                .map(|names| {
                    names
                        .iter()
                        .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default()
        } else {
            String::new()
        };
        let option_str = if placeholder.is_empty() {
            op
        } else {
            format!("{op} {placeholder}")
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
