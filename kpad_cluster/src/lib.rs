//! # kpad_cluster
//!
//! Scalable apps on a container cluster, mapped onto the eight rows of a
//! Launchpad.
//!
//! * [`KubernetesClient`] / [`KubernetesBackend`]: deployments of one
//!   namespace, over the Kubernetes REST API.
//! * [`MarathonClient`] / [`MarathonBackend`]: Marathon apps labelled
//!   `LAUNCHPAD_ENABLE==true`.
//! * [`AppTable`]: which app sits on which row, and what changed since
//!   the last listing.
//! * [`spawn_cluster_worker`]: a thread that polls a backend and serves
//!   scale requests.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use kpad_cluster::{spawn_cluster_worker, KubernetesBackend, KubernetesClient};
//!
//! let client = KubernetesClient::new("http://127.0.0.1:8001", None, Duration::from_secs(5)).unwrap();
//! let worker = spawn_cluster_worker(KubernetesBackend::new(client, "default"), Duration::from_millis(2500));
//!
//! for event in worker.drain_events() {
//!     println!("{} row {} -> {} replicas", event.kind, event.index, event.replicas);
//! }
//! worker.scale(0, 3).unwrap();
//! ```

pub mod backend;
pub mod error;
pub mod kubernetes;
pub mod marathon;
pub mod model;
pub mod table;
pub mod worker;

pub use backend::ClusterBackend;
pub use error::{Error, Result};
pub use kubernetes::{KubernetesBackend, KubernetesClient};
pub use marathon::{MarathonBackend, MarathonClient};
pub use model::{AppSnapshot, ClusterAppEvent, ClusterEventKind, Labels, LABEL_COLOR, LABEL_ENABLE, LABEL_ROW};
pub use table::AppTable;
pub use worker::{spawn_cluster_worker, ClusterCommand, ClusterWorker, DEFAULT_POLL_INTERVAL};
