//! `sneezetracker` - a personal log of sneezes
//!
//! This library provides the sneeze record model, input validation, the
//! `SQLite` record store, dashboard aggregates, and the HTTP API that ties
//! them together.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod sneeze;
pub mod stats;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result, ValidationError};
pub use logging::init_logging;
pub use sneeze::{Intensity, NewSneeze, SneezeId, SneezeRecord};
pub use stats::DashboardStats;
pub use storage::{SneezeStore, Storage};
pub use validation::{validate, SneezeCandidate};
