use anyhow::{bail, Context, Result};
use dirs::config_dir;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Main configuration structure for the digest
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Search term used in every query and in the email subject
    #[serde(default = "default_keyword")]
    pub keyword: String,

    /// Authors and repositories that never make it into a digest
    #[serde(default)]
    pub ignore: IgnoreConfig,

    /// When the digest window starts
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// GitHub API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Outgoing mail server
    #[serde(default)]
    pub email: EmailConfig,

    /// Optional KEY=VALUE file pre-populating unset secrets
    #[serde(default = "default_env_file")]
    pub env_file: String,
}

/// Ignore lists
#[derive(Debug, Deserialize, Clone)]
pub struct IgnoreConfig {
    /// Logins (or git author names) to skip
    #[serde(default)]
    pub authors: Vec<String>,

    /// Repository full names to skip; `*` acts as a wildcard
    #[serde(default)]
    pub repos: Vec<String>,
}

/// Digest window configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    /// Hour (UTC) on the previous day at which the window opens
    #[serde(default = "default_cutoff_hour")]
    pub cutoff_hour_utc: u32,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    /// REST/GraphQL API root
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Commits requested from the (unpaginated) commit search
    #[serde(default = "default_commit_page_size")]
    pub commit_page_size: u8,
}

/// SMTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// Implicit TLS port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

// Default value functions
fn default_keyword() -> String {
    "msgspec".to_string()
}
fn default_env_file() -> String {
    ".env".to_string()
}
fn default_cutoff_hour() -> u32 {
    14
}
fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_commit_page_size() -> u8 {
    100
}
fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    465
}

// Default implementations
impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            authors: vec![
                "jcrist".to_string(),
                "dependabot".to_string(),
                "renovate".to_string(),
                "phillip-ground".to_string(),
                "ibis-squawk-bot".to_string(),
            ],
            repos: vec![
                "jcrist/msgspec".to_string(),
                "conda-forge/msgspec-feedstock".to_string(),
                "NixOS/nixpkgs".to_string(),
            ],
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cutoff_hour_utc: default_cutoff_hour(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            commit_page_size: default_commit_page_size(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keyword: default_keyword(),
            ignore: IgnoreConfig::default(),
            schedule: ScheduleConfig::default(),
            github: GitHubConfig::default(),
            email: EmailConfig::default(),
            env_file: default_env_file(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            let mut config = Self::default();
            config.expand_paths()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.validate()?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("github-digest").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.env_file = shellexpand::full(&self.env_file)
            .context("Failed to expand env_file path")?
            .into_owned();

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.keyword.trim().is_empty() {
            bail!("keyword must not be empty");
        }
        if self.schedule.cutoff_hour_utc > 23 {
            bail!(
                "schedule.cutoff_hour_utc must be between 0 and 23, got {}",
                self.schedule.cutoff_hour_utc
            );
        }
        if !(1..=100).contains(&self.github.commit_page_size) {
            bail!(
                "github.commit_page_size must be between 1 and 100, got {}",
                self.github.commit_page_size
            );
        }
        Ok(())
    }
}

/// Pre-populate the environment from a KEY=VALUE file.
///
/// Variables that are already set win. A missing file is not an error.
pub fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!("Loaded environment from {:?}", path);
            Ok(())
        }
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to load env file: {:?}", path)),
    }
}

/// Credentials read from the environment
#[derive(Clone)]
pub struct Secrets {
    pub email_address: String,
    pub email_username: String,
    pub email_password: String,
    pub github_token: String,
}

impl Secrets {
    /// Read all required secrets, failing on the first one missing
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            email_address: required_var("EMAIL_ADDRESS")?,
            email_username: required_var("EMAIL_USERNAME")?,
            email_password: required_var("EMAIL_PASSWORD")?,
            github_token: required_var("GH_TOKEN")?,
        })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("email_address", &self.email_address)
            .field("email_username", &self.email_username)
            .field("email_password", &"<redacted>")
            .field("github_token", &"<redacted>")
            .finish()
    }
}

fn required_var(key: &str) -> Result<String> {
    let value =
        std::env::var(key).with_context(|| format!("{key} environment variable not set"))?;
    if value.trim().is_empty() {
        bail!("{key} environment variable is empty");
    }
    Ok(value)
}
