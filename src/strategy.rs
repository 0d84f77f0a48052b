use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The authentication providers a user can sign in with.
///
/// The set is closed: route parameters are parsed into one of these and
/// anything else is rejected before the authenticator is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Auth0,
    Google,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown authentication strategy: {0:?}")]
pub struct StrategyParseError(pub String);

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Auth0, Strategy::Google];

    pub fn parse(s: &str) -> Result<Self, StrategyParseError> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| StrategyParseError(s.to_owned()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Auth0 => "auth0",
            Strategy::Google => "google",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Auth0 => "Auth0",
            Strategy::Google => "Google",
        }
    }

    /// Prefix of the environment variables holding this strategy's client settings.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Strategy::Auth0 => "AUTH0_",
            Strategy::Google => "GOOGLE_",
        }
    }

    /// Issuer used for discovery when none is configured.
    pub fn default_issuer(self) -> Option<&'static str> {
        match self {
            Strategy::Auth0 => None,
            Strategy::Google => Some("https://accounts.google.com"),
        }
    }
}

impl FromStr for Strategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::parse(s)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
