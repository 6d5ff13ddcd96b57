use std::path::PathBuf;
use serde::Deserialize;

/// Placeholder secret shipped in the defaults. `serve` refuses to run with it.
pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

/// All configuration for the turfbook application.
///
/// Precedence (lowest to highest): defaults → config file → env var → CLI arg.
/// CLI arg merging is done by the caller after `Config::load()`.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub db_url: String,

    // Server
    pub port: u16,

    // Logging
    pub log_level: String,
    pub utc: bool,

    // Identity provider: HS256 secret the hosted backend signs access tokens with
    pub jwt_secret: String,

    // Payment request
    pub payee_vpa: String,
    pub payee_name: String,
    pub currency: String,
}

/// Config file layout (~/.turfbook/config.toml). All fields optional; they
/// layer on top of compiled-in defaults.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    db_url: Option<String>,
    port: Option<u16>,
    log_level: Option<String>,
    utc: Option<bool>,
    jwt_secret: Option<String>,
    payee_vpa: Option<String>,
    payee_name: Option<String>,
    currency: Option<String>,
}

impl Config {
    /// Config directory: ~/.turfbook/
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".turfbook")
    }

    /// Config file path: ~/.turfbook/config.toml
    pub fn file_path() -> PathBuf {
        Self::dir().join("config.toml")
    }

    /// Load config: defaults → config file → env vars.
    /// CLI args should be merged by the caller afterward.
    pub fn load() -> Self {
        let mut config = Self::defaults();

        if let Ok(contents) = std::fs::read_to_string(Self::file_path()) {
            if let Ok(file) = toml::from_str::<FileConfig>(&contents) {
                config.apply_file(file);
            }
        }

        config.apply_env();

        config
    }

    /// True when no real token secret was configured.
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret.trim().is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET
    }

    // --- Private helpers ---

    fn defaults() -> Self {
        Self {
            db_url: "sqlite:turfbook.db?mode=rwc".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            utc: false,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            payee_vpa: "9479719961-ga25@axl".to_string(),
            payee_name: "GameZoneXP".to_string(),
            currency: "INR".to_string(),
        }
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(v) = file.db_url { self.db_url = v; }
        if let Some(v) = file.port { self.port = v; }
        if let Some(v) = file.log_level { self.log_level = v; }
        if let Some(v) = file.utc { self.utc = v; }
        if let Some(v) = file.jwt_secret { self.jwt_secret = v; }
        if let Some(v) = file.payee_vpa { self.payee_vpa = v; }
        if let Some(v) = file.payee_name { self.payee_name = v; }
        if let Some(v) = file.currency { self.currency = v; }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("TURFBOOK_DB_URL") { self.db_url = v; }
        if let Ok(v) = std::env::var("TURFBOOK_PORT") {
            if let Ok(p) = v.parse() { self.port = p; }
        }
        if let Ok(v) = std::env::var("TURFBOOK_LOG_LEVEL") { self.log_level = v; }
        if let Ok(v) = std::env::var("TURFBOOK_UTC") {
            self.utc = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("TURFBOOK_JWT_SECRET") { self.jwt_secret = v; }
        if let Ok(v) = std::env::var("TURFBOOK_PAYEE_VPA") { self.payee_vpa = v; }
        if let Ok(v) = std::env::var("TURFBOOK_PAYEE_NAME") { self.payee_name = v; }
        if let Ok(v) = std::env::var("TURFBOOK_CURRENCY") { self.currency = v; }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}
