use std::fmt;
use std::time::Duration;

use inquire::{Password, PasswordDisplayMode};
use url::Url;

use crate::lib::cli::{Cli, OutputFormat};
use crate::lib::error::{ConfigError, OntapError};
use crate::lib::recommender::{Mode, SizingPolicy};
use crate::Result;

/// Fixed timeout applied to every REST call
pub const POLL_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for the cluster management connection
#[derive(Clone)]
pub struct ConnectionConfig {
    pub base_url: Url,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl ConnectionConfig {
    /// Build connection settings for `cluster`
    ///
    /// Clusters commonly present self-signed certificates, so certificate
    /// validation is turned off.
    pub fn new(cluster: &str, username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url(cluster)?,
            username: username.to_string(),
            password: password.to_string(),
            timeout: POLL_TIMEOUT,
            accept_invalid_certs: true,
        })
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Runtime configuration assembled from the command line and the prompt
#[derive(Clone, Debug)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub cluster: String,
    pub aggregate: String,
    pub policy: SizingPolicy,
    pub debug: bool,
    pub details: bool,
    pub output: OutputFormat,
}

impl Config {
    pub fn new(cli: &Cli, password: String) -> Result<Self> {
        if cli.aggr.trim().is_empty() {
            return Err(ConfigError::MissingRequired("aggregate name".to_string()).into());
        }
        if cli.user.trim().is_empty() {
            return Err(ConfigError::MissingRequired("username".to_string()).into());
        }
        if password.is_empty() {
            return Err(ConfigError::MissingRequired("password".to_string()).into());
        }

        let mode = if cli.check { Mode::Check } else { Mode::Recommend };

        Ok(Self {
            connection: ConnectionConfig::new(&cli.cluster, &cli.user, &password)?,
            cluster: cli.cluster.clone(),
            aggregate: cli.aggr.clone(),
            policy: SizingPolicy::new(mode, cli.target)?,
            debug: cli.debug,
            details: cli.xml,
            output: cli.output,
        })
    }
}

/// Read the password from the terminal without echoing it
pub fn prompt_password() -> Result<String> {
    Password::new("Enter password:")
        .with_display_mode(PasswordDisplayMode::Hidden)
        .without_confirmation()
        .prompt()
        .map_err(|e| ConfigError::Prompt(e.to_string()).into())
}

/// Turn a cluster address into the base URL the REST paths hang off
///
/// A bare host gets `https://`; an explicit `http(s)://` URL is kept.
pub fn base_url(cluster: &str) -> Result<Url> {
    let cluster = cluster.trim();
    if cluster.is_empty() {
        return Err(ConfigError::MissingRequired("cluster address".to_string()).into());
    }

    let raw = if cluster.contains("://") {
        cluster.to_string()
    } else {
        format!("https://{}", cluster)
    };

    let mut url = Url::parse(&raw).map_err(|e| OntapError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(OntapError::InvalidUrl(format!("unsupported scheme '{}'", other)).into());
        }
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec![
            "volume-compression-resize",
            "--cluster",
            "cluster1",
            "--aggr",
            "aggr1",
            "--user",
            "admin",
        ];
        args.extend_from_slice(extra);
        Cli::parse_from(args)
    }

    #[test]
    fn bare_host_becomes_https() {
        let url = base_url("cluster1.example.com").unwrap();
        assert_eq!(url.as_str(), "https://cluster1.example.com/");
    }

    #[test]
    fn explicit_url_is_kept() {
        let url = base_url("http://127.0.0.1:8080").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/");

        let url = base_url("https://10.0.0.5/proxy").unwrap();
        assert_eq!(url.as_str(), "https://10.0.0.5/proxy/");
    }

    #[test]
    fn rejects_unusable_addresses() {
        assert!(base_url("  ").is_err());
        assert!(base_url("ftp://cluster1").is_err());
    }

    #[test]
    fn builds_config_from_cli() {
        let config = Config::new(&cli(&["--check", "--target", "75"]), "secret".into()).unwrap();

        assert_eq!(config.aggregate, "aggr1");
        assert_eq!(config.policy.mode, Mode::Check);
        assert_eq!(config.policy.target_percent, 75);
        assert_eq!(config.connection.timeout, Duration::from_secs(120));
        assert!(config.connection.accept_invalid_certs);
        assert_eq!(config.connection.base_url.as_str(), "https://cluster1/");
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(Config::new(&cli(&[]), String::new()).is_err());
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = Config::new(&cli(&[]), "hunter2".into()).unwrap();
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
