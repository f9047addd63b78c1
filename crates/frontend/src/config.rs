//! Configuration management for the Marquee launcher.
//!
//! Configuration is loaded from TOML files in the following locations (in order):
//! 1. `%APPDATA%/marquee/config.toml` (Windows standard)
//! 2. `~/.config/marquee/config.toml` (Unix-style)
//! 3. `./config.toml` (current directory, for development)

use anyhow::{Context, Result};
use directories::ProjectDirs;
use marquee_core_layout::{Color, LayoutOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::{classify_binding, Command};

/// Main configuration structure for Marquee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub layout: LayoutConfig,
    pub appearance: AppearanceConfig,
    pub animation: AnimationConfig,
    pub behavior: BehaviorConfig,
    pub screensaver: ScreensaverConfig,
    pub keybindings: KeyBindings,
    pub ipc: IpcConfig,
}

/// Logical screen the layout is computed for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: i32,

    #[serde(default = "default_height")]
    pub height: i32,

    /// Frames per second of the render loop.
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

/// Layout file and grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Layout file; searched for in the config directories when unset.
    pub file: Option<PathBuf>,

    /// Cards per menu row.
    #[serde(default = "default_columns")]
    pub columns: usize,

    /// Top of the scrolling area, fraction of the screen height.
    #[serde(default = "default_top_margin")]
    pub top_margin: f32,

    /// Bottom of the scrolling area, fraction of the screen height.
    #[serde(default = "default_bottom_margin")]
    pub bottom_margin: f32,

    /// Default icon inset of generated cards.
    #[serde(default = "default_icon_margin")]
    pub icon_margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            file: None,
            columns: default_columns(),
            top_margin: default_top_margin(),
            bottom_margin: default_bottom_margin(),
            icon_margin: default_icon_margin(),
        }
    }
}

/// Colors and background.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub background_color: Color,
    pub background_image: Option<PathBuf>,
    pub sidebar_highlight_color: Color,
    pub sidebar_text_color: Color,
    pub sidebar_text_color_highlighted: Color,
    pub menu_highlight_color: Color,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        let options = LayoutOptions::default();
        Self {
            background_color: options.background_color,
            background_image: None,
            sidebar_highlight_color: options.sidebar_highlight_color,
            sidebar_text_color: options.sidebar_text_color,
            sidebar_text_color_highlighted: options.sidebar_text_color_highlighted,
            menu_highlight_color: options.menu_highlight_color,
        }
    }
}

/// Animation timing in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    #[serde(default = "default_sidebar_shift_ms")]
    pub sidebar_shift_ms: u32,

    #[serde(default = "default_row_shift_ms")]
    pub row_shift_ms: u32,

    #[serde(default = "default_highlight_shift_ms")]
    pub highlight_shift_ms: u32,

    #[serde(default = "default_press_ms")]
    pub press_ms: u32,

    /// Deepest press inset, fraction of the card width.
    #[serde(default = "default_press_depth")]
    pub press_depth: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            sidebar_shift_ms: default_sidebar_shift_ms(),
            row_shift_ms: default_row_shift_ms(),
            highlight_shift_ms: default_highlight_shift_ms(),
            press_ms: default_press_ms(),
            press_depth: default_press_depth(),
        }
    }
}

/// Behavior-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log file; defaults to `marquee.log` in the project data directory.
    pub log_file: Option<PathBuf>,

    /// Capture the mouse. Clicks and the wheel are then looked up in
    /// `[keybindings]` as `MouseLeft`, `MouseRight`, `ScrollUp` and `ScrollDown`.
    pub mouse_select: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            mouse_select: false,
        }
    }
}

/// Idle dimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreensaverConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds without input before the screen dims.
    #[serde(default = "default_idle_time")]
    pub idle_time_secs: u64,

    /// Final overlay opacity.
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

impl Default for ScreensaverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_time_secs: default_idle_time(),
            intensity: default_intensity(),
        }
    }
}

/// Key bindings configuration.
///
/// Maps key names to commands. Key names are `Up`, `Down`, `Left`,
/// `Right`, `Enter`, `Esc`, `Backspace`, `Tab`, `Space`, a single character or
/// `Ctrl+<character>`.
/// Values are action names with or without the leading `:` (`move_up`,
/// `:select`, `quit`, ...) or any other command line, which is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(flatten)]
    pub bindings: HashMap<String, String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = HashMap::new();

        bindings.insert("Up".to_string(), "move_up".to_string());
        bindings.insert("Down".to_string(), "move_down".to_string());
        bindings.insert("Left".to_string(), "move_left".to_string());
        bindings.insert("Right".to_string(), "move_right".to_string());

        // vim-style navigation
        bindings.insert("k".to_string(), "move_up".to_string());
        bindings.insert("j".to_string(), "move_down".to_string());
        bindings.insert("h".to_string(), "move_left".to_string());
        bindings.insert("l".to_string(), "move_right".to_string());

        bindings.insert("Enter".to_string(), "select".to_string());
        bindings.insert("Space".to_string(), "select".to_string());
        bindings.insert("Backspace".to_string(), "move_left".to_string());
        bindings.insert("Esc".to_string(), "quit".to_string());
        // Raw mode swallows SIGINT
        bindings.insert("Ctrl+c".to_string(), "quit".to_string());

        // Only reported with behavior.mouse_select
        bindings.insert("MouseLeft".to_string(), "select".to_string());
        bindings.insert("MouseRight".to_string(), "move_left".to_string());
        bindings.insert("ScrollUp".to_string(), "move_up".to_string());
        bindings.insert("ScrollDown".to_string(), "move_down".to_string());

        Self { bindings }
    }
}

/// Remote control socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ipc_address")]
    pub address: String,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_ipc_address(),
        }
    }
}

// Default value functions for serde
fn default_width() -> i32 {
    1920
}

fn default_height() -> i32 {
    1080
}

fn default_fps() -> u32 {
    60
}

fn default_columns() -> usize {
    3
}

fn default_top_margin() -> f32 {
    0.2
}

fn default_bottom_margin() -> f32 {
    1.0
}

fn default_icon_margin() -> f32 {
    0.10
}

fn default_sidebar_shift_ms() -> u32 {
    200
}

fn default_row_shift_ms() -> u32 {
    120
}

fn default_highlight_shift_ms() -> u32 {
    100
}

fn default_press_ms() -> u32 {
    150
}

fn default_press_depth() -> f32 {
    0.04
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_idle_time() -> u64 {
    300
}

fn default_intensity() -> f32 {
    0.7
}

fn default_ipc_address() -> String {
    marquee_ipc::DEFAULT_IPC_ADDR.to_string()
}

/// A config value that was out of range and has been replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub field: &'static str,
    pub message: String,
}

impl ConfigWarning {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

const MIN_SCREEN_WIDTH: i32 = 320;
const MIN_SCREEN_HEIGHT: i32 = 240;
const MAX_COLUMNS: usize = 10;
const MAX_FPS: u32 = 240;
const MIN_IDLE_TIME_SECS: u64 = 5;
const MAX_IDLE_TIME_SECS: u64 = 24 * 60 * 60;

impl Config {
    /// Load configuration from standard locations.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self> {
        let paths = config_paths();

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise from the standard locations.
    pub fn load_or_search(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Clamp out-of-range values, reporting each correction.
    pub fn validate(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let display = &mut self.display;
        if display.width < MIN_SCREEN_WIDTH || display.height < MIN_SCREEN_HEIGHT {
            warnings.push(ConfigWarning::new(
                "display",
                format!(
                    "{}x{} is below the minimum {}x{}",
                    display.width, display.height, MIN_SCREEN_WIDTH, MIN_SCREEN_HEIGHT
                ),
            ));
            display.width = display.width.max(MIN_SCREEN_WIDTH);
            display.height = display.height.max(MIN_SCREEN_HEIGHT);
        }
        if display.fps == 0 || display.fps > MAX_FPS {
            let clamped = display.fps.clamp(1, MAX_FPS);
            warnings.push(ConfigWarning::new(
                "display.fps",
                format!("{} out of range, using {}", display.fps, clamped),
            ));
            display.fps = clamped;
        }

        let layout = &mut self.layout;
        if layout.columns == 0 || layout.columns > MAX_COLUMNS {
            let clamped = layout.columns.clamp(1, MAX_COLUMNS);
            warnings.push(ConfigWarning::new(
                "layout.columns",
                format!("{} out of range, using {}", layout.columns, clamped),
            ));
            layout.columns = clamped;
        }
        if !(0.0..0.9).contains(&layout.top_margin) {
            warnings.push(ConfigWarning::new(
                "layout.top_margin",
                format!("{} out of range, using the default", layout.top_margin),
            ));
            layout.top_margin = default_top_margin();
        }
        if layout.bottom_margin <= layout.top_margin || layout.bottom_margin > 1.0 {
            warnings.push(ConfigWarning::new(
                "layout.bottom_margin",
                format!(
                    "{} must lie between top_margin and 1.0, using 1.0",
                    layout.bottom_margin
                ),
            ));
            layout.bottom_margin = 1.0;
        }
        if !(0.0..0.5).contains(&layout.icon_margin) {
            warnings.push(ConfigWarning::new(
                "layout.icon_margin",
                format!("{} out of range, using the default", layout.icon_margin),
            ));
            layout.icon_margin = default_icon_margin();
        }

        let animation = &mut self.animation;
        for (field, value) in [
            ("animation.sidebar_shift_ms", &mut animation.sidebar_shift_ms),
            ("animation.row_shift_ms", &mut animation.row_shift_ms),
            ("animation.highlight_shift_ms", &mut animation.highlight_shift_ms),
            ("animation.press_ms", &mut animation.press_ms),
        ] {
            if *value == 0 {
                warnings.push(ConfigWarning::new(field, "duration must be at least 1 ms"));
                *value = 1;
            }
        }
        if !(0.0..=0.5).contains(&animation.press_depth) {
            let clamped = animation.press_depth.clamp(0.0, 0.5);
            warnings.push(ConfigWarning::new(
                "animation.press_depth",
                format!("{} out of range, using {}", animation.press_depth, clamped),
            ));
            animation.press_depth = clamped;
        }

        let screensaver = &mut self.screensaver;
        if !(MIN_IDLE_TIME_SECS..=MAX_IDLE_TIME_SECS).contains(&screensaver.idle_time_secs) {
            let clamped = screensaver
                .idle_time_secs
                .clamp(MIN_IDLE_TIME_SECS, MAX_IDLE_TIME_SECS);
            warnings.push(ConfigWarning::new(
                "screensaver.idle_time_secs",
                format!("{} out of range, using {}", screensaver.idle_time_secs, clamped),
            ));
            screensaver.idle_time_secs = clamped;
        }
        if !(0.1..=1.0).contains(&screensaver.intensity) {
            let clamped = screensaver.intensity.clamp(0.1, 1.0);
            warnings.push(ConfigWarning::new(
                "screensaver.intensity",
                format!("{} out of range, using {}", screensaver.intensity, clamped),
            ));
            screensaver.intensity = clamped;
        }

        let mut unknown: Vec<String> = self
            .keybindings
            .bindings
            .iter()
            .filter(|(_, binding)| {
                matches!(
                    classify_binding(binding),
                    Command::UnknownInternal(_) | Command::External("")
                )
            })
            .map(|(key, _)| key.clone())
            .collect();
        unknown.sort();
        for key in unknown {
            if let Some(binding) = self.keybindings.bindings.remove(&key) {
                warnings.push(ConfigWarning::new(
                    "keybindings",
                    format!("unknown command '{}' for key '{}', binding ignored", binding, key),
                ));
            }
        }

        warnings
    }

    /// Options for building the layout.
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            columns: self.layout.columns,
            top_margin: self.layout.top_margin,
            bottom_margin: self.layout.bottom_margin,
            icon_margin: self.layout.icon_margin,
            sidebar_shift_ms: self.animation.sidebar_shift_ms,
            row_shift_ms: self.animation.row_shift_ms,
            highlight_shift_ms: self.animation.highlight_shift_ms,
            press_ms: self.animation.press_ms,
            press_depth: self.animation.press_depth,
            background_color: self.appearance.background_color,
            background_image: self.appearance.background_image.clone(),
            sidebar_highlight_color: self.appearance.sidebar_highlight_color,
            sidebar_text_color: self.appearance.sidebar_text_color,
            sidebar_text_color_highlighted: self.appearance.sidebar_text_color_highlighted,
            menu_highlight_color: self.appearance.menu_highlight_color,
        }
    }

    /// Tracing level for `behavior.log_level`, INFO for unknown values.
    pub fn log_level(&self) -> tracing::Level {
        match self.behavior.log_level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }

    /// Where log output goes.
    pub fn log_file(&self) -> PathBuf {
        if let Some(path) = &self.behavior.log_file {
            return path.clone();
        }
        match project_dirs() {
            Some(dirs) => dirs.data_dir().join("marquee.log"),
            None => PathBuf::from("marquee.log"),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "marquee", "marquee")
}

/// Get all possible config file paths in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    config_dirs()
        .into_iter()
        .map(|dir| dir.join("config.toml"))
        .collect()
}

/// Directories searched for `config.toml` and `layout.toml`, in priority order.
pub fn config_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(proj_dirs) = project_dirs() {
        dirs.push(proj_dirs.config_dir().to_path_buf());
    }

    if let Some(home) = dirs_home() {
        let unix_style = home.join(".config").join("marquee");
        if !dirs.contains(&unix_style) {
            dirs.push(unix_style);
        }
    }

    dirs.push(PathBuf::new());

    dirs
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
