//! URL shortener service implementation.
//!
//! This crate provides the link lifecycle engine: the [`ShortenerService`]
//! that creates, resolves and reclaims links on top of the account and link
//! stores, and the background [`Sweeper`] that reclaims expired links.
//! Core types are re-exported from `tinylink_core`.

pub mod error;
pub mod service;
pub mod settings;
pub mod sweeper;

pub use error::{Result, ShortenerError};
pub use service::ShortenerService;
pub use settings::{ServiceSettings, SweeperSettings};
pub use sweeper::Sweeper;

pub use tinylink_core::{Link, SessionToken, ShortCode};
