use anyhow::{Context, Result};
use std::collections::HashMap;

pub const JIRA_PASSWORD_ENV: &str = "TRACKSYNC_JIRA_PASS";

type PasswordReader = fn(&str) -> std::io::Result<String>;

/// Passwords resolved during one run, keyed by username.
///
/// Lookup order: cache, environment, config value, interactive prompt.
pub struct Credentials {
    cache: HashMap<String, String>,
    env_password: Option<String>,
    read_password: PasswordReader,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            cache: HashMap::new(),
            env_password: None,
            read_password: read_hidden,
        }
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            env_password: std::env::var(JIRA_PASSWORD_ENV).ok().filter(|p| !p.is_empty()),
            ..Self::default()
        }
    }

    pub fn jira_password(&mut self, username: &str, configured: Option<&str>) -> Result<String> {
        if let Some(password) = self.cache.get(username) {
            return Ok(password.clone());
        }
        let password = match (&self.env_password, configured) {
            (Some(password), _) => password.clone(),
            (None, Some(password)) => password.to_string(),
            (None, None) => (self.read_password)(&format!("Jira password [{username}]: "))
                .context("Failed to read password from terminal")?,
        };
        self.cache.insert(username.to_string(), password.clone());
        Ok(password)
    }
}

/// Prompts on the terminal with echo turned off.
fn read_hidden(message: &str) -> std::io::Result<String> {
    rpassword::prompt_password(message)
}
