use anyhow::Context;
#[cfg(test)]
use mockall::{automock, predicate::*};
use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

/// Port the harness listens on
pub const DISPATCH_PORT_LABEL: &str = "DISPATCH_PORT";
/// Directory static files and dispatch scripts are resolved against
pub const DOCUMENT_ROOT_LABEL: &str = "DOCUMENT_ROOT";
/// Path prefix reserved for CGI-style dispatch
pub const DISPATCH_PREFIX_LABEL: &str = "DISPATCH_PREFIX";
/// Seconds a dispatched script may run before it is killed
pub const SCRIPT_TIMEOUT_SECONDS_LABEL: &str = "SCRIPT_TIMEOUT_SECONDS";

const DEFAULT_DISPATCH_PORT: u16 = 8080;
const DEFAULT_DISPATCH_PREFIX: &str = "/onvif";
const DEFAULT_SCRIPT_TIMEOUT_SECONDS: u64 = 10;

/// This provides a mockable way to query an env var.
#[cfg_attr(test, automock)]
pub trait EnvVarQuery {
    fn get_env_var(&self, name: &'static str) -> Result<String, VarError>;
}

pub struct ActualEnvVarQuery;
impl EnvVarQuery for ActualEnvVarQuery {
    fn get_env_var(&self, name: &'static str) -> Result<String, VarError> {
        std::env::var(name)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub document_root: PathBuf,
    pub dispatch_prefix: String,
    pub script_timeout: Duration,
}

impl Config {
    pub fn from_env(env_var_query: &impl EnvVarQuery) -> Result<Config, anyhow::Error> {
        let port = match env_var_query.get_env_var(DISPATCH_PORT_LABEL) {
            Ok(port) => port
                .parse::<u16>()
                .with_context(|| format!("{} is not a valid port: {}", DISPATCH_PORT_LABEL, port))?,
            Err(_) => DEFAULT_DISPATCH_PORT,
        };
        let document_root = match env_var_query.get_env_var(DOCUMENT_ROOT_LABEL) {
            Ok(root) => PathBuf::from(root),
            Err(_) => PathBuf::from("."),
        };
        let dispatch_prefix = match env_var_query.get_env_var(DISPATCH_PREFIX_LABEL) {
            Ok(prefix) => prefix,
            Err(_) => DEFAULT_DISPATCH_PREFIX.to_string(),
        };
        let script_timeout = match env_var_query.get_env_var(SCRIPT_TIMEOUT_SECONDS_LABEL) {
            Ok(seconds) => Duration::from_secs(seconds.parse::<u64>().with_context(|| {
                format!(
                    "{} is not a valid number of seconds: {}",
                    SCRIPT_TIMEOUT_SECONDS_LABEL, seconds
                )
            })?),
            Err(_) => Duration::from_secs(DEFAULT_SCRIPT_TIMEOUT_SECONDS),
        };

        Ok(Config {
            port,
            document_root,
            dispatch_prefix,
            script_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut env_var_query = MockEnvVarQuery::new();
        env_var_query
            .expect_get_env_var()
            .returning(|_| Err(VarError::NotPresent));

        let config = Config::from_env(&env_var_query).unwrap();
        assert_eq!(config.port, DEFAULT_DISPATCH_PORT);
        assert_eq!(config.document_root, PathBuf::from("."));
        assert_eq!(config.dispatch_prefix, DEFAULT_DISPATCH_PREFIX);
        assert_eq!(
            config.script_timeout,
            Duration::from_secs(DEFAULT_SCRIPT_TIMEOUT_SECONDS)
        );
    }

    #[test]
    fn test_from_env_explicit_values() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut env_var_query = MockEnvVarQuery::new();
        env_var_query
            .expect_get_env_var()
            .with(eq(DISPATCH_PORT_LABEL))
            .returning(|_| Ok("9000".to_string()));
        env_var_query
            .expect_get_env_var()
            .with(eq(DOCUMENT_ROOT_LABEL))
            .returning(|_| Ok("/srv/www".to_string()));
        env_var_query
            .expect_get_env_var()
            .with(eq(DISPATCH_PREFIX_LABEL))
            .returning(|_| Ok("/cgi-bin".to_string()));
        env_var_query
            .expect_get_env_var()
            .with(eq(SCRIPT_TIMEOUT_SECONDS_LABEL))
            .returning(|_| Ok("3".to_string()));

        let config = Config::from_env(&env_var_query).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.document_root, PathBuf::from("/srv/www"));
        assert_eq!(config.dispatch_prefix, "/cgi-bin");
        assert_eq!(config.script_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_from_env_rejects_invalid_port() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut env_var_query = MockEnvVarQuery::new();
        // The port is read first, so nothing else gets queried.
        env_var_query
            .expect_get_env_var()
            .with(eq(DISPATCH_PORT_LABEL))
            .returning(|_| Ok("not-a-port".to_string()));

        assert!(Config::from_env(&env_var_query).is_err());
    }
}
