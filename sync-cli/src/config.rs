//! Configuration and transport selection for the CLI.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use twablet_sync_client::{ClientConfig, HttpTransport, MockTransport, Transport};
use twablet_sync_types::Account;

/// Configuration file name inside the config directory.
pub const CONFIG_FILE: &str = "twablet.toml";

/// Everything a command needs: who it acts for and how it reaches the API.
pub struct Session {
    /// Account requests are made for.
    pub account: Account,
    transport: Arc<dyn Transport>,
    mock: Option<MockTransport>,
}

impl Session {
    /// Load configuration and build the transport.
    ///
    /// In mock mode a configuration file is optional; without one a demo
    /// account is used.
    pub fn open(config_path: Option<&Path>, use_mock: bool) -> Result<Self> {
        if use_mock {
            let account = match config_path {
                Some(path) => load(path)?.account,
                None => None,
            }
            .unwrap_or_else(demo_account);
            let mock = MockTransport::new();
            return Ok(Self {
                account,
                transport: Arc::new(mock.clone()),
                mock: Some(mock),
            });
        }

        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };
        let config = load(&path)?;
        config
            .validate()
            .with_context(|| format!("Incomplete configuration in {}", path.display()))?;
        let transport =
            HttpTransport::new(&config).context("Failed to create HTTP transport")?;
        tracing::debug!("Using API at {}", transport.base_url());

        Ok(Self {
            account: config.account.unwrap_or_default(),
            transport: Arc::new(transport),
            mock: None,
        })
    }

    /// Transport shared by the command's containers.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// The mock transport, when running with `--mock`.
    pub fn mock(&self) -> Option<&MockTransport> {
        self.mock.as_ref()
    }
}

fn load(path: &Path) -> Result<ClientConfig> {
    ClientConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn demo_account() -> Account {
    Account::new("Demo", "1", "twablet_demo", "mock-token", "mock-secret")
}

/// Get the default configuration path for twablet.
fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "twablet", "twablet")
        .context("Could not determine home directory")?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}
