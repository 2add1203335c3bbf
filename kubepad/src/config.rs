//! Configuration.
//!
//! Layers, later wins:
//!
//! 1. built-in defaults,
//! 2. `Kubepad.toml` (or the file given with `--config`),
//! 3. `KUBEPAD_` environment variables, `__` between section and key,
//!    e.g. `KUBEPAD_CLUSTER__SERVICE=marathon`.
//!
//! ```toml
//! [launchpad]
//! device_name = "Launchpad MK2"
//! virtual_pad = true
//!
//! [cluster]
//! service = "kubernetes"
//! poll_interval_ms = 2500
//!
//! [kubernetes]
//! master_url = "http://127.0.0.1:8001"
//! namespace = "default"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::{parse_log_level, OutputFormat};

pub const DEFAULT_CONFIG_FILE: &str = "Kubepad.toml";
pub const ENV_PREFIX: &str = "KUBEPAD_";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterService {
    Kubernetes,
    Marathon,
}

impl fmt::Display for ClusterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClusterService::Kubernetes => "kubernetes",
            ClusterService::Marathon   => "marathon",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubepadConfig {
    pub launchpad:  LaunchpadConfig,
    pub cluster:    ClusterConfig,
    pub kubernetes: KubernetesConfig,
    pub marathon:   MarathonConfig,
    pub leap:       LeapConfig,
    pub logging:    LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchpadConfig {
    /// Substring matched against MIDI port names.
    pub device_name: String,
    /// Open the on-screen pad window.
    pub virtual_pad: bool,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        LaunchpadConfig {
            device_name: launchpad_mk2::device::DEFAULT_DEVICE_NAME.to_string(),
            virtual_pad: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub service:            ClusterService,
    pub poll_interval_ms:   u64,
    pub request_timeout_ms: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            service:            ClusterService::Kubernetes,
            poll_interval_ms:   kpad_cluster::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            request_timeout_ms: 10_000,
        }
    }
}

impl ClusterConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    pub master_url: String,
    pub namespace:  String,
    pub token_file: Option<PathBuf>,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        KubernetesConfig {
            master_url: "http://127.0.0.1:8001".into(),
            namespace:  "default".into(),
            token_file: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarathonConfig {
    pub api_endpoint:      String,
    pub access_token_file: Option<PathBuf>,
}

impl Default for MarathonConfig {
    fn default() -> Self {
        MarathonConfig {
            api_endpoint:      "http://localhost:8080".into(),
            access_token_file: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeapConfig {
    /// Only honoured when built with the `leap` feature.
    pub enabled: bool,
}

impl Default for LeapConfig {
    fn default() -> Self {
        LeapConfig { enabled: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level:  String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: "info".into(), format: "pretty".into() }
    }
}

impl KubepadConfig {
    /// The provider chain for `path`.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(KubepadConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load from `path`, or `Kubepad.toml` in the working directory.  A
    /// missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let config = Self::load_from(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> std::result::Result<Self, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    pub fn validate(&self) -> Result<()> {
        parse_log_level(&self.logging.level).map_err(Error::Config)?;
        self.logging.format.parse::<OutputFormat>().map_err(Error::Config)?;

        if self.cluster.poll_interval_ms == 0 {
            return Err(Error::Config("cluster.poll_interval_ms must be greater than 0".into()));
        }
        if self.cluster.request_timeout_ms == 0 {
            return Err(Error::Config("cluster.request_timeout_ms must be greater than 0".into()));
        }
        if self.kubernetes.namespace.trim().is_empty() {
            return Err(Error::Config("kubernetes.namespace must not be empty".into()));
        }
        if self.launchpad.device_name.is_empty() {
            return Err(Error::Config("launchpad.device_name must not be empty".into()));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
