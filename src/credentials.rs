use crate::{config::Config, error::FlowError};
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub access_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            access_key: access_key.into(),
        }
    }

    /// Reads both variables named in `[credentials]`. Blank values count as missing.
    pub fn from_env(cfg: &Config) -> Result<Self, FlowError> {
        Self::from_lookup(cfg, |k| std::env::var(k).ok())
    }

    pub fn from_lookup(
        cfg: &Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FlowError> {
        let user_var = cfg.credentials.username_env.as_str();
        let key_var = cfg.credentials.access_key_env.as_str();
        let read = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        match (read(user_var), read(key_var)) {
            (Some(username), Some(access_key)) => Ok(Self::new(username, access_key)),
            (user, key) => {
                let missing: Vec<&str> = [(user.is_none(), user_var), (key.is_none(), key_var)]
                    .into_iter()
                    .filter_map(|(missing, k)| missing.then_some(k))
                    .collect();
                Err(FlowError::configuration(format!(
                    "missing credentials: set {}",
                    missing.join(" and ")
                )))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("access_key", &"<redacted>")
            .finish()
    }
}
