use serde::Deserialize;
use std::net::SocketAddr;
use strategy::Strategy;

pub mod auth;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod server;
pub mod strategy;

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_addr")]
    pub addr: SocketAddr,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

/// Client registration of one strategy, read from `<PREFIX>CLIENT_ID` and friends.
#[derive(Deserialize, Clone, Debug)]
pub struct StrategyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub issuer_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub strategies: Vec<(Strategy, StrategyConfig)>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server = envy::prefixed("PANO_").from_env::<ServerConfig>()?;

        let mut strategies = Vec::new();
        for strategy in Strategy::ALL {
            match envy::prefixed(strategy.env_prefix()).from_env::<StrategyConfig>() {
                Ok(settings) if settings.client_id.trim().is_empty() => {
                    tracing::warn!(%strategy, "{}CLIENT_ID is empty, strategy disabled", strategy.env_prefix());
                }
                Ok(settings) if settings.client_secret.trim().is_empty() => {
                    tracing::warn!(%strategy, "{}CLIENT_SECRET is empty, strategy disabled", strategy.env_prefix());
                }
                Ok(settings) => strategies.push((strategy, settings)),
                Err(envy::Error::MissingValue(field)) => {
                    tracing::warn!(
                        %strategy,
                        "{}{} is not set, strategy disabled",
                        strategy.env_prefix(),
                        field.to_uppercase()
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        anyhow::ensure!(
            !strategies.is_empty(),
            "no authentication strategy is configured"
        );

        Ok(Self { server, strategies })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET: [(&str, Option<&str>); 8] = [
        ("PANO_BASE_URL", None),
        ("PANO_ADDR", None),
        ("AUTH0_CLIENT_ID", None),
        ("AUTH0_CLIENT_SECRET", None),
        ("AUTH0_ISSUER_URL", None),
        ("GOOGLE_CLIENT_ID", None),
        ("GOOGLE_CLIENT_SECRET", None),
        ("GOOGLE_ISSUER_URL", None),
    ];

    fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
        let mut all: Vec<(&str, Option<&str>)> = UNSET
            .iter()
            .filter(|(key, _)| !vars.iter().any(|(k, _)| k == key))
            .copied()
            .collect();
        all.extend_from_slice(vars);
        temp_env::with_vars(all, f)
    }

    #[test]
    fn only_fully_configured_strategies_are_enabled() {
        let config = with_env(
            &[
                ("GOOGLE_CLIENT_ID", Some("id")),
                ("GOOGLE_CLIENT_SECRET", Some("secret")),
                ("AUTH0_CLIENT_ID", Some("half")),
            ],
            Config::from_env,
        )
        .unwrap();

        assert_eq!(config.server.base_url, "http://localhost:3000");
        assert_eq!(config.server.addr, default_addr());
        assert_eq!(config.strategies.len(), 1);
        let (strategy, settings) = &config.strategies[0];
        assert_eq!(*strategy, Strategy::Google);
        assert_eq!(settings.client_id, "id");
        assert_eq!(settings.issuer_url, None);
    }

    #[test]
    fn server_settings_come_from_pano_prefix() {
        let config = with_env(
            &[
                ("PANO_BASE_URL", Some("https://pano.example")),
                ("PANO_ADDR", Some("0.0.0.0:8080")),
                ("AUTH0_CLIENT_ID", Some("id")),
                ("AUTH0_CLIENT_SECRET", Some("secret")),
                ("AUTH0_ISSUER_URL", Some("https://tenant.auth0.com/")),
            ],
            Config::from_env,
        )
        .unwrap();

        assert_eq!(config.server.base_url, "https://pano.example");
        assert_eq!(config.server.addr.port(), 8080);
        assert_eq!(
            config.strategies[0].1.issuer_url.as_deref(),
            Some("https://tenant.auth0.com/")
        );
    }

    #[test]
    fn blank_credentials_count_as_unset() {
        let config = with_env(
            &[
                ("AUTH0_CLIENT_ID", Some("")),
                ("AUTH0_CLIENT_SECRET", Some("")),
                ("AUTH0_ISSUER_URL", Some("https://your-tenant.auth0.com/")),
                ("GOOGLE_CLIENT_ID", Some("id")),
                ("GOOGLE_CLIENT_SECRET", Some(" ")),
            ],
            Config::from_env,
        );

        assert!(config.is_err());
    }

    #[test]
    fn at_least_one_strategy_is_required() {
        assert!(with_env(&[], Config::from_env).is_err());
    }
}
