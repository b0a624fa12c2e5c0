use std::env;

use thiserror::Error;
use tracing::warn;

use crate::auth::GOOGLE_JWKS_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("set FIREBASE_PROJECT_ID or AUTH_INSECURE_SECRET")]
    NoAuthMode,
}

/// How bearer tokens are verified.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// RS256 against the provider's published JWK set.
    Firebase { project_id: String, jwks_url: String },
    /// HS256 with a shared secret. Local development and tests only.
    InsecureLocal { secret: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub cors_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let port = match env::var("PORT") {
            Ok(v) => v.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: v,
            })?,
            Err(_) => 8000,
        };

        let auth = match env::var("FIREBASE_PROJECT_ID") {
            Ok(project_id) => AuthConfig::Firebase {
                project_id,
                jwks_url: env::var("AUTH_JWKS_URL")
                    .unwrap_or_else(|_| GOOGLE_JWKS_URL.to_string()),
            },
            Err(_) => match env::var("AUTH_INSECURE_SECRET") {
                Ok(secret) => {
                    warn!("FIREBASE_PROJECT_ID not set, using insecure local token verification");
                    AuthConfig::InsecureLocal { secret }
                }
                Err(_) => return Err(ConfigError::NoAuthMode),
            },
        };

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Config {
            database_url,
            port,
            auth,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the process-wide env mutations stay sequential.
    #[test]
    fn test_from_env() {
        env::remove_var("DATABASE_URL");
        env::remove_var("PORT");
        env::remove_var("FIREBASE_PROJECT_ID");
        env::remove_var("AUTH_JWKS_URL");
        env::remove_var("AUTH_INSECURE_SECRET");
        env::remove_var("CORS_ORIGIN");

        // DATABASE_URL is mandatory
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));

        env::set_var("DATABASE_URL", "postgres://localhost/apnifarm");

        // Some auth mode is mandatory
        assert!(matches!(Config::from_env(), Err(ConfigError::NoAuthMode)));

        env::set_var("AUTH_INSECURE_SECRET", "dev-secret");
        let config = Config::from_env().expect("config should load");
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert!(matches!(config.auth, AuthConfig::InsecureLocal { .. }));

        // Firebase mode wins when a project id is present
        env::set_var("FIREBASE_PROJECT_ID", "apnifarm-prod");
        env::set_var("PORT", "9000");
        let config = Config::from_env().expect("config should load");
        assert_eq!(config.port, 9000);
        match config.auth {
            AuthConfig::Firebase {
                project_id,
                jwks_url,
            } => {
                assert_eq!(project_id, "apnifarm-prod");
                assert_eq!(jwks_url, GOOGLE_JWKS_URL);
            }
            other => panic!("expected firebase auth mode, got {other:?}"),
        }

        env::set_var("PORT", "not-a-port");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
    }
}
