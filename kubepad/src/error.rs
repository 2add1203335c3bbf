//! Error type for the application crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Launchpad(#[from] launchpad_mk2::Error),

    #[error(transparent)]
    Cluster(#[from] kpad_cluster::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("window error: {0}")]
    Window(String),

    #[error("failed to initialise logging: {0}")]
    Logging(String),

    #[error("failed to install the Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("kubepad was built without the `{0}` feature")]
    FeatureNotEnabled(&'static str),
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<minifb::Error> for Error {
    fn from(e: minifb::Error) -> Self {
        Error::Window(e.to_string())
    }
}
