use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::constants::{self, env};

/// Operator credential attached to every request
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as `Authorization: Bearer <token>`
    Bearer(String),
    /// Sent as the dashboard session cookie
    SessionCookie(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret itself
        match self {
            Credential::Bearer(_) => f.write_str("Bearer(***)"),
            Credential::SessionCookie(_) => f.write_str("SessionCookie(***)"),
        }
    }
}

/// Console configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    /// Dashboard backend, e.g. `https://bot.example.org`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    /// Where preferences are kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub limits: Limits,
}

/// Credentials configuration. A token wins over a session cookie.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

impl Credentials {
    pub fn credential(&self) -> Option<Credential> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        non_blank(&self.token)
            .map(Credential::Bearer)
            .or_else(|| non_blank(&self.session_cookie).map(Credential::SessionCookie))
    }
}

/// Per-request row limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    pub tickets: u32,
    pub applications: u32,
    pub live_users: u32,
    pub logs: u32,
    pub birthdays: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            tickets: constants::TICKET_LIMIT,
            applications: constants::APPLICATION_LIMIT,
            live_users: constants::LIVE_USER_LIMIT,
            logs: constants::LOG_LIMIT,
            birthdays: constants::BIRTHDAY_LIMIT,
        }
    }
}

fn default_base_url() -> String {
    constants::DEFAULT_BASE_URL.to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            credentials: None,
            data_dir: None,
            limits: Limits::default(),
        }
    }
}

impl ConsoleConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize config")
    }

    /// Apply `STARRY_BASE_URL` / `STARRY_TOKEN` on top of the loaded values
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(env::BASE_URL) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        if let Ok(token) = std::env::var(env::TOKEN) {
            if !token.trim().is_empty() {
                self.set_token(token);
            }
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.set_credential(Credential::Bearer(token));
    }

    pub fn set_credential(&mut self, credential: Credential) {
        self.credentials = Some(match credential {
            Credential::Bearer(token) => Credentials {
                token: Some(token),
                session_cookie: None,
            },
            Credential::SessionCookie(cookie) => Credentials {
                token: None,
                session_cookie: Some(cookie),
            },
        });
    }

    pub fn credential(&self) -> Option<Credential> {
        self.credentials.as_ref().and_then(Credentials::credential)
    }

    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(self.base_url.trim())
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Base URL must be http(s): {}", self.base_url);
        }
        // Joining relative routes needs a trailing slash on the base path
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("starry-console"))
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_DATA_DIR))
    }
}
