use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::utils::crypto::PLACEHOLDER_SECRET;

pub const SECRETS_DIR_ENV: &str = "STUDYHUB_SECRETS_DIR";
pub const SETTINGS_FILE: &str = "Settings.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthSettings {
    pub application: ApplicationSettings,
    pub provider: ProviderSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Post-login redirect target and the only CORS origin allowed with
    /// credentials. When unset the app root is derived from each request.
    pub frontend_origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Server secret for state and session signatures. Never generated.
    pub app_secret: String,
}

/// `SameSite` policy for the state cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateSameSite {
    /// Sent on the top-level redirect back from the provider
    #[default]
    Lax,
    /// Needed when the callback is reached as a cross-site subrequest; forces `Secure`
    None,
}

impl std::str::FromStr for StateSameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => Err(format!("unsupported state cookie SameSite value: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
    pub state_same_site: StateSameSite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub name: String,
    pub display_name: Option<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub scopes: Vec<String>,

    // Direct values (can be overridden by environment variables)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment variable names for overrides
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,

    pub extra_auth_params: HashMap<String, String>,
    /// Upper bound on the token endpoint POST
    pub exchange_timeout_secs: u64,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            frontend_origin: None,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            app_secret: PLACEHOLDER_SECRET.to_string(),
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            state_same_site: StateSameSite::Lax,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let extra_auth_params = [
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("include_granted_scopes", "true"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            name: "google".to_string(),
            display_name: Some("Google".to_string()),
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            scopes: vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
            ],
            client_id: None,
            client_secret: None,
            client_id_env: Some("GOOGLE_CLIENT_ID".to_string()),
            client_secret_env: Some("GOOGLE_CLIENT_SECRET".to_string()),
            extra_auth_params,
            exchange_timeout_secs: 30,
        }
    }
}

impl AuthSettings {
    /// Load settings from configuration files and environment variables, and
    /// initialise logging with the configured level
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    pub fn load() -> anyhow::Result<Self> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::init_logging(&settings.logging.level);

        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `STUDYHUB_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    pub fn load_base_settings() -> anyhow::Result<Self> {
        let mut settings = Self::default();

        let default_config_path = Path::new(SETTINGS_FILE);
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var(SECRETS_DIR_ENV) {
            let secrets_path = Path::new(&secrets_dir).join(SETTINGS_FILE);
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ {SECRETS_DIR_ENV} set but no {SETTINGS_FILE} found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let toml_content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        basic_toml::from_str(&toml_content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(origin) = std::env::var("FRONTEND_ORIGIN") {
            let origin = origin.trim().trim_end_matches('/').to_string();
            app_settings.frontend_origin = (!origin.is_empty()).then_some(origin);
        }
    }

    fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(secret) = std::env::var("APP_SECRET") {
            session_settings.app_secret = secret;
        }
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
        if let Ok(same_site) = std::env::var("STATE_COOKIE_SAME_SITE") {
            match same_site.parse() {
                Ok(value) => cookie_settings.state_same_site = value,
                Err(e) => eprintln!("⚠️  Ignoring STATE_COOKIE_SAME_SITE: {e}"),
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Initialise `env_logger` once; later calls (tests) are no-ops
    fn init_logging(level: &str) {
        let env = env_logger::Env::default().default_filter_or(level);
        if env_logger::Builder::from_env(env).try_init().is_err() {
            log::debug!("Logger already initialised");
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}

impl ProviderSettings {
    /// Get the client ID, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        Self::env_or(self.client_id_env.as_deref(), self.client_id.as_ref())
    }

    /// Get the client secret, checking the environment variable first, then
    /// falling back to the direct value
    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        Self::env_or(self.client_secret_env.as_deref(), self.client_secret.as_ref())
    }

    fn env_or(env_var: Option<&str>, direct: Option<&String>) -> Option<String> {
        env_var
            .and_then(|name| std::env::var(name).ok())
            .filter(|value| !value.is_empty())
            .or_else(|| direct.cloned())
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::TempDir;

    const OVERRIDE_VARS: &[&str] = &[
        "HOST",
        "PORT",
        "FRONTEND_ORIGIN",
        "APP_SECRET",
        "COOKIE_SECURE",
        "STATE_COOKIE_SAME_SITE",
        SECRETS_DIR_ENV,
        "STUDYHUB_TEST_CLIENT_ID",
    ];

    fn clear_env() {
        for var in OVERRIDE_VARS {
            std::env::remove_var(var);
        }
    }

    fn write_settings(dir: &TempDir, contents: &str) {
        let mut file = fs::File::create(dir.path().join(SETTINGS_FILE)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_defaults() {
        let settings = AuthSettings::default();
        assert_eq!(settings.application.port, 4000);
        assert!(settings.application.frontend_origin.is_none());
        assert!(settings.cookies.secure);
        assert_eq!(settings.cookies.state_same_site, StateSameSite::Lax);
        assert_eq!(settings.session.app_secret, "change-me");
        assert_eq!(settings.provider.name, "google");
        assert_eq!(settings.provider.scopes, ["openid", "profile", "email"]);
        assert_eq!(
            settings.provider.extra_auth_params.get("access_type").map(String::as_str),
            Some("offline")
        );
        assert_eq!(settings.provider.exchange_timeout_secs, 30);
        assert_eq!(settings.get_bind_address(), "0.0.0.0:4000");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        write_settings(
            &dir,
            r#"
[application]
port = 5000
frontend_origin = "https://study.example.com"

[cookies]
state_same_site = "none"

[provider]
client_id = "file-client-id"
"#,
        );
        let settings = AuthSettings::from_file(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings.application.port, 5000);
        assert_eq!(settings.application.host, "0.0.0.0");
        assert_eq!(
            settings.application.frontend_origin.as_deref(),
            Some("https://study.example.com")
        );
        assert_eq!(settings.cookies.state_same_site, StateSameSite::None);
        assert!(settings.cookies.secure);
        assert_eq!(settings.provider.client_id.as_deref(), Some("file-client-id"));
        assert_eq!(
            settings.provider.token_endpoint,
            "https://oauth2.googleapis.com/token"
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_settings(&dir, "[application\nport = ");
        assert!(AuthSettings::from_file(&dir.path().join(SETTINGS_FILE)).is_err());
    }

    #[test]
    #[serial]
    fn test_secrets_dir_overrides_base_settings() {
        clear_env();
        let dir = TempDir::new().unwrap();
        write_settings(
            &dir,
            r#"
[session]
app_secret = "secret-from-the-secrets-directory"
"#,
        );
        std::env::set_var(SECRETS_DIR_ENV, dir.path());
        let settings = AuthSettings::load_base_settings().unwrap();
        assert_eq!(settings.session.app_secret, "secret-from-the-secrets-directory");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("HOST", "127.0.0.1");
        std::env::set_var("PORT", "8081");
        std::env::set_var("FRONTEND_ORIGIN", "https://study.example.com/");
        std::env::set_var("APP_SECRET", "env-secret-value-that-is-long-enough");
        std::env::set_var("COOKIE_SECURE", "false");
        std::env::set_var("STATE_COOKIE_SAME_SITE", "None");

        let mut settings = AuthSettings::default();
        AuthSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.get_bind_address(), "127.0.0.1:8081");
        assert_eq!(
            settings.application.frontend_origin.as_deref(),
            Some("https://study.example.com")
        );
        assert_eq!(
            settings.session.app_secret,
            "env-secret-value-that-is-long-enough"
        );
        assert!(!settings.cookies.secure);
        assert_eq!(settings.cookies.state_same_site, StateSameSite::None);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("COOKIE_SECURE", "maybe");
        std::env::set_var("STATE_COOKIE_SAME_SITE", "strict");

        let mut settings = AuthSettings::default();
        AuthSettings::apply_env_overrides(&mut settings);
        assert_eq!(settings.application.port, 4000);
        assert!(settings.cookies.secure);
        assert_eq!(settings.cookies.state_same_site, StateSameSite::Lax);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_client_id_env_takes_precedence() {
        clear_env();
        let mut provider = ProviderSettings {
            client_id: Some("from-file".to_string()),
            client_id_env: Some("STUDYHUB_TEST_CLIENT_ID".to_string()),
            ..Default::default()
        };
        assert_eq!(provider.get_client_id().as_deref(), Some("from-file"));

        std::env::set_var("STUDYHUB_TEST_CLIENT_ID", "from-env");
        assert_eq!(provider.get_client_id().as_deref(), Some("from-env"));

        provider.client_id_env = None;
        assert_eq!(provider.get_client_id().as_deref(), Some("from-file"));
        clear_env();
    }

    #[test]
    fn test_state_same_site_parsing() {
        assert_eq!("lax".parse::<StateSameSite>(), Ok(StateSameSite::Lax));
        assert_eq!(" NONE ".parse::<StateSameSite>(), Ok(StateSameSite::None));
        assert!("strict".parse::<StateSameSite>().is_err());
    }
}
