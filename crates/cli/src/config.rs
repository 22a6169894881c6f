//! Configuration loading and management

use anyhow::{Context, Result};
use phrasecast_domain::usecases::{CaptionTemplate, DailySchedule, Template};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub template: TemplateConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub instagram: InstagramConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,

    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dry_run: bool,
}

/// Image template plus optional asset paths
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    #[serde(default)]
    pub logo_path: Option<PathBuf>,

    #[serde(flatten)]
    pub layout: Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Daily publication time, HH:MM in UTC
    #[serde(default = "default_publish_at")]
    pub publish_at: String,

    #[serde(default = "default_true")]
    pub generate_on_startup: bool,

    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_secs: u64,

    #[serde(default)]
    pub caption: CaptionTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    /// `instagram` or `stub`
    #[serde(default = "default_publisher")]
    pub publisher: String,

    #[serde(default = "default_username_env")]
    pub username_env: String,

    #[serde(default = "default_password_env")]
    pub password_env: String,

    #[serde(default = "default_instagram_base_url")]
    pub base_url: String,

    #[serde(default = "default_instagram_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

// Default value functions
fn default_input_path() -> PathBuf {
    PathBuf::from("./frases.csv")
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("./content")
}

fn default_state_db_path() -> PathBuf {
    PathBuf::from("./state.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_publish_at() -> String {
    "08:00".to_string()
}

fn default_publish_timeout() -> u64 {
    60
}

fn default_publisher() -> String {
    "instagram".to_string()
}

fn default_username_env() -> String {
    "IG_USERNAME".to_string()
}

fn default_password_env() -> String {
    "IG_PASSWORD".to_string()
}

fn default_instagram_base_url() -> String {
    "https://i.instagram.com".to_string()
}

fn default_instagram_timeout() -> u64 {
    30
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            content_dir: default_content_dir(),
            state_db_path: default_state_db_path(),
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            publish_at: default_publish_at(),
            generate_on_startup: default_true(),
            publish_timeout_secs: default_publish_timeout(),
            caption: CaptionTemplate::default(),
        }
    }
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            publisher: default_publisher(),
            username_env: default_username_env(),
            password_env: default_password_env(),
            base_url: default_instagram_base_url(),
            timeout_secs: default_instagram_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl ScheduleConfig {
    pub fn daily(&self) -> Result<DailySchedule> {
        self.publish_at
            .parse()
            .with_context(|| format!("Invalid [schedule] publish_at: {}", self.publish_at))
    }
}

impl ServerConfig {
    /// Bind address; a `PORT` env var replaces the port
    pub fn addr(&self) -> Result<SocketAddr> {
        let mut addr: SocketAddr = self
            .bind
            .parse()
            .with_context(|| format!("Invalid [server] bind address: {}", self.bind))?;

        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT: {}", port))?;
            addr.set_port(port);
        }

        Ok(addr)
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("PHRASECAST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        let template = Template::default();
        format!(
            r##"# phrasecast configuration

[general]
input_path = "./frases.csv"
content_dir = "./content"
state_db_path = "./state.sqlite"
log_level = "info"
dry_run = false

[template]
# font_path = "./assets/font.ttf"   # falls back to a built-in bitmap font
# logo_path = "./assets/logo.png"
canvas_size = {canvas_size}
background = "{background}"
text_color = "{text_color}"
hashtag_color = "{hashtag_color}"
footer_color = "{footer_color}"
text_size = {text_size:.1}
hashtag_size = {hashtag_size:.1}
footer_size = {footer_size:.1}
line_height = {line_height:.1}
max_text_width = {max_text_width:.1}
text_top = {text_top:.1}
hashtag_gap = {hashtag_gap:.1}
footer_gap = {footer_gap:.1}
logo_top = {logo_top}
logo_max_width = {logo_max_width}
label_max_chars = {label_max_chars}
jpeg_quality = {jpeg_quality}

[schedule]
publish_at = "08:00"  # UTC
generate_on_startup = true
publish_timeout_secs = 60
# Placeholders: {{index}}, {{name}}, {{date}}
caption = "Frase del día #{{index}}"

[instagram]
publisher = "instagram"  # instagram, stub
username_env = "IG_USERNAME"
password_env = "IG_PASSWORD"
base_url = "https://i.instagram.com"
timeout_secs = 30

[server]
bind = "0.0.0.0:3000"  # PORT env var overrides the port
"##,
            canvas_size = template.canvas_size,
            background = template.background,
            text_color = template.text_color,
            hashtag_color = template.hashtag_color,
            footer_color = template.footer_color,
            text_size = template.text_size,
            hashtag_size = template.hashtag_size,
            footer_size = template.footer_size,
            line_height = template.line_height,
            max_text_width = template.max_text_width,
            text_top = template.text_top,
            hashtag_gap = template.hashtag_gap,
            footer_gap = template.footer_gap,
            logo_top = template.logo_top,
            logo_max_width = template.logo_max_width,
            label_max_chars = template.label_max_chars,
            jpeg_quality = template.jpeg_quality,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrasecast_domain::Color;

    #[test]
    fn test_example_parses_to_defaults() {
        let parsed: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();

        assert_eq!(parsed.template.layout, Template::default());
        assert_eq!(parsed.schedule.caption, CaptionTemplate::default());
        assert_eq!(parsed.general.content_dir, PathBuf::from("./content"));
        assert!(parsed.template.font_path.is_none());
        assert!(parsed.schedule.daily().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str("").unwrap();

        assert_eq!(parsed.schedule.publish_at, "08:00");
        assert_eq!(parsed.instagram.username_env, "IG_USERNAME");
        assert_eq!(parsed.server.bind, "0.0.0.0:3000");
        assert!(!parsed.general.dry_run);
    }

    #[test]
    fn test_partial_template_overrides() {
        let parsed: AppConfig = toml::from_str(
            r##"
[template]
background = "#000000"
text_size = 48.0
logo_path = "logo.png"
"##,
        )
        .unwrap();

        assert_eq!(parsed.template.layout.background, Color::BLACK);
        assert_eq!(parsed.template.layout.text_size, 48.0);
        assert_eq!(parsed.template.layout.canvas_size, 1080);
        assert_eq!(parsed.template.logo_path, Some(PathBuf::from("logo.png")));
    }

    #[test]
    fn test_invalid_color_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[template]\nbackground = \"navy\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let config = ScheduleConfig {
            publish_at: "25:00".to_string(),
            ..Default::default()
        };
        assert!(config.daily().is_err());
    }
}
