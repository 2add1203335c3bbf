//! # kubepad
//!
//! A Novation Launchpad MK2 as dashboard and remote control for a
//! Kubernetes or Marathon cluster.  Each of the eight rows shows one
//! scalable app: lit squares are running instances, the right-column button
//! selects the row.
//!
//! ## Pad → Action mapping
//!
//! See [`controller`] for the full table.  In short: squares start and stop
//! instances, the cursors move the selection and scale it by one, `SESSION`
//! stops everything, `USER_1` starts everything, `USER_2` resets and
//! `MIXER` plays snake.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Swipe with N fingers | Scale the selected row to N |
//! | Screen tap | Select the row above |
//! | Key tap | Select the row below |
//!
//! ## Feature flags
//!
//! * (default): virtual pad window and keyboard gestures.
//! * `leap`: a real LeapMotion controller via LeapC.
//!
//! ### Virtual pad keys
//!
//! | Key | Gesture |
//! |---|---|
//! | `0`–`8` | Swipe with that many fingers |
//! | `Up` | Screen tap |
//! | `Down` | Key tap |
//! | `Q` / `Escape` | Quit |

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod grid;
pub mod logging;
pub mod snake;
pub mod visualizer;

pub use config::{ClusterService, KubepadConfig};
pub use error::{Error, Result};
