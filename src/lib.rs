//! hymnal - hymn sheet image resolution.
//!
//! Scanned pages live on a static file server under loosely consistent
//! names: one number per file, two facing pages in one file, or a number
//! followed by continuation pages. This library guesses the candidate
//! filenames for a number, probes them, and keeps a viewing session's
//! display slots consistent while results arrive out of order.

pub mod config;
pub mod continuation;
pub mod coverage;
pub mod http_client;
pub mod models;
pub mod patterns;
pub mod probe;
pub mod rate_limit;
pub mod resolver;
pub mod session;

pub use config::{Config, ConfigError, Settings};
pub use resolver::{ProbeStrategy, Resolution, Resolver};
pub use session::{Session, SessionError, SessionEvent, SessionOptions};
