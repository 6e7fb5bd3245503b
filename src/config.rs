use color_eyre::eyre::{eyre, Report};
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;
use tracing::warn;

use crate::axis::{AxisPolicy, Threshold};
use crate::cli::Args;
use crate::controller::ScrollBoxSettings;

/// Environment variable overriding `scroll.finish_threshold`
pub const ENV_FINISH: &str = "SCROLLBAR_FINISH";
/// Environment variable overriding `scroll.horizontal_lower`
pub const ENV_HORIZONTAL_LOWER: &str = "HORIZONTAL_SCROLLBAR_LOWER";
/// Environment variable overriding `scroll.horizontal_upper`
pub const ENV_HORIZONTAL_UPPER: &str = "HORIZONTAL_SCROLLBAR_UPPER";

pub const DEFAULT_FINISH: u32 = 50;
pub const DEFAULT_HORIZONTAL_LOWER: u32 = 21;
pub const DEFAULT_HORIZONTAL_UPPER: u32 = 30;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Read and parse `config.toml` from this directory. A missing file yields defaults.
    pub fn load_file(&self) -> Result<AppConfig> {
        let config_path = self.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub scroll: ScrollConfig,
    pub loading: LoadingConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub finish_threshold: Threshold,
    pub horizontal_lower: Threshold,
    pub horizontal_upper: Threshold,
    /// Units from the end at which scrolling loads the next item
    pub load_proximity: u32,
    /// Units from the end at which a freshly drawn frame loads the next item
    pub settle_proximity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    pub latency_ms: u64,
    /// Every Nth simulated fetch fails; 0 never fails
    pub fail_every: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
    /// Frames a smooth scroll takes
    pub animation_frames: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub background: String,
    pub item: String,
    pub item_text: String,
    pub placeholder: String,
    pub finished: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub keybind_hints: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    /// Log file path; defaults to scrollbox.log in the cache directory
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            scroll: ScrollConfig::default(),
            loading: LoadingConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            finish_threshold: Threshold::Value(DEFAULT_FINISH),
            horizontal_lower: Threshold::Value(DEFAULT_HORIZONTAL_LOWER),
            horizontal_upper: Threshold::Value(DEFAULT_HORIZONTAL_UPPER),
            load_proximity: 100,
            settle_proximity: 5,
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            latency_ms: 500,
            fail_every: 0,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
            animation_frames: 6,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: "black".to_string(),
            item: "#3b82f6".to_string(),
            item_text: "white".to_string(),
            placeholder: "indexed(236)".to_string(),
            finished: "#3b82f6".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            keybind_hints: "cyan".to_string(),
            error: "red".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user file → environment).
    ///
    /// A user file that cannot be read is returned alongside the config so the
    /// caller can report it once logging is up.
    pub fn load(app_name: &str) -> Result<(Self, Option<Report>)> {
        let user = ConfigManager::new(app_name).and_then(|m| m.load_file());
        Self::from_layers(user, |key| std::env::var(key).ok())
    }

    /// Stack a user file result and an environment lookup on the defaults.
    pub fn from_layers<F>(user: Result<AppConfig>, lookup: F) -> Result<(Self, Option<Report>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        // a broken user file falls back to defaults rather than refusing to start
        let ignored = match user {
            Ok(user_config) => {
                config.merge(user_config);
                None
            }
            Err(e) => Some(e),
        };

        config.apply_env(lookup);
        config.validate()?;

        Ok((config, ignored))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.scroll.merge(other.scroll);
        self.loading.merge(other.loading);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    /// Override thresholds from environment variables.
    ///
    /// A variable that is set but not a number becomes an invalid threshold;
    /// it does not fall back to the default.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = [
            (ENV_FINISH, DEFAULT_FINISH, &mut self.scroll.finish_threshold),
            (
                ENV_HORIZONTAL_LOWER,
                DEFAULT_HORIZONTAL_LOWER,
                &mut self.scroll.horizontal_lower,
            ),
            (
                ENV_HORIZONTAL_UPPER,
                DEFAULT_HORIZONTAL_UPPER,
                &mut self.scroll.horizontal_upper,
            ),
        ];
        for (key, default, slot) in overrides {
            if let Some(raw) = lookup(key) {
                *slot = Threshold::from_raw(Some(&raw), default);
            }
        }
    }

    /// Apply command line overrides (highest precedence)
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(finish) = args.finish {
            self.scroll.finish_threshold = Threshold::Value(finish);
        }
        if let Some(lower) = args.lower {
            self.scroll.horizontal_lower = Threshold::Value(lower);
        }
        if let Some(upper) = args.upper {
            self.scroll.horizontal_upper = Threshold::Value(upper);
        }
        if let Some(latency_ms) = args.latency_ms {
            self.loading.latency_ms = latency_ms;
        }
        if let Some(fail_every) = args.fail_every {
            self.loading.fail_every = fail_every;
        }
        if args.debug {
            self.debug.enabled = true;
        }
    }

    /// Validate configuration values.
    ///
    /// Thresholds are deliberately not checked: an invalid one disables the
    /// behaviour it controls.
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if self.performance.animation_frames == 0 {
            return Err(eyre!("animation_frames must be greater than 0"));
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }

    /// Resolve the thresholds the scroll box is built with.
    pub fn scroll_settings(&self) -> ScrollBoxSettings {
        let scroll = &self.scroll;
        for (name, threshold) in [
            ("finish_threshold", &scroll.finish_threshold),
            ("horizontal_lower", &scroll.horizontal_lower),
            ("horizontal_upper", &scroll.horizontal_upper),
        ] {
            if !threshold.is_valid() {
                warn!(setting = name, value = %threshold, "threshold is not a number; comparisons against it are always false");
            }
        }

        ScrollBoxSettings {
            finish: scroll.finish_threshold.clone(),
            axis: AxisPolicy::new(
                scroll.horizontal_lower.clone(),
                scroll.horizontal_upper.clone(),
            ),
            load_proximity: scroll.load_proximity,
            settle_proximity: scroll.settle_proximity,
        }
    }
}

// Merge implementations for each config section
impl ScrollConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ScrollConfig::default();
        if other.finish_threshold != default.finish_threshold {
            self.finish_threshold = other.finish_threshold;
        }
        if other.horizontal_lower != default.horizontal_lower {
            self.horizontal_lower = other.horizontal_lower;
        }
        if other.horizontal_upper != default.horizontal_upper {
            self.horizontal_upper = other.horizontal_upper;
        }
        if other.load_proximity != default.load_proximity {
            self.load_proximity = other.load_proximity;
        }
        if other.settle_proximity != default.settle_proximity {
            self.settle_proximity = other.settle_proximity;
        }
    }
}

impl LoadingConfig {
    pub fn merge(&mut self, other: Self) {
        let default = LoadingConfig::default();
        if other.latency_ms != default.latency_ms {
            self.latency_ms = other.latency_ms;
        }
        if other.fail_every != default.fail_every {
            self.fail_every = other.fail_every;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
        if other.animation_frames != default.animation_frames {
            self.animation_frames = other.animation_frames;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        self.colors.merge(other.colors);
    }
}

impl ColorConfig {
    fn entries(&self) -> [(&'static str, &String); 9] {
        [
            ("background", &self.background),
            ("item", &self.item),
            ("item_text", &self.item_text),
            ("placeholder", &self.placeholder),
            ("finished", &self.finished),
            ("controls_bg", &self.controls_bg),
            ("text_primary", &self.text_primary),
            ("keybind_hints", &self.keybind_hints),
            ("error", &self.error),
        ]
    }

    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        let fields = [
            (&mut self.background, other.background, default.background),
            (&mut self.item, other.item, default.item),
            (&mut self.item_text, other.item_text, default.item_text),
            (&mut self.placeholder, other.placeholder, default.placeholder),
            (&mut self.finished, other.finished, default.finished),
            (&mut self.controls_bg, other.controls_bg, default.controls_bg),
            (&mut self.text_primary, other.text_primary, default.text_primary),
            (
                &mut self.keybind_hints,
                other.keybind_hints,
                default.keybind_hints,
            ),
            (&mut self.error, other.error, default.error),
        ];
        for (slot, value, default) in fields {
            if value != default {
                *slot = value;
            }
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.log_file.is_some() {
            self.log_file = other.log_file;
        }
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parser with fixed capabilities, independent of the current terminal
    pub fn with_capabilities(supports_true_color: bool, supports_256: bool) -> Self {
        Self {
            supports_true_color,
            supports_256,
            no_color: false,
        }
    }

    /// Parse a color string (hex, indexed or named) into a terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.convert_rgb_to_terminal_color(r, g, b));
        }

        if trimmed.to_lowercase().starts_with("indexed(") && trimmed.ends_with(')') {
            let num_str = &trimmed[8..trimmed.len() - 1];
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        match trimmed.to_lowercase().as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),
            "gray" | "grey" | "dark_gray" | "dark_grey" => Ok(Color::Indexed(8)),
            "light_gray" | "light_grey" => Ok(Color::Indexed(7)),
            "reset" => Ok(Color::Reset),
            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 indexed(0-255), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    let component = |range: std::ops::Range<usize>, name: &str| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| eyre!("Invalid {} component in hex color: {}", name, s))
    };
    Ok((
        component(1..3, "red")?,
        component(3..5, "green")?,
        component(5..7, "blue")?,
    ))
}

/// Convert RGB to nearest xterm 256-color palette index
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16;
        } else if gray > 247 {
            return 231;
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        Self::from_config_with(config, &ColorParser::new())
    }

    pub fn from_config_with(config: &ThemeConfig, parser: &ColorParser) -> Result<Self> {
        let mut colors = HashMap::new();
        for (name, value) in config.colors.entries() {
            colors.insert(name.to_string(), parser.parse(value)?);
        }
        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config_with(
            &ThemeConfig::default(),
            &ColorParser::with_capabilities(true, true),
        )
        .unwrap_or_else(|_| Self {
            colors: HashMap::new(),
        })
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
