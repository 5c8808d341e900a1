//! Core types and traits for the tinylink URL shortener.
//!
//! This crate provides the domain values shared by the generator, the
//! storage layer and the shortener service.

pub mod clock;
pub mod error;
pub mod link;
pub mod notifier;
pub mod shortcode;
pub mod token;
pub mod user;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CoreError;
pub use link::{Link, LinkState, LINK_TTL};
pub use notifier::{ConsoleNotifier, Notification, Notifier, RecordingNotifier};
pub use shortcode::{ShortCode, ALPHABET, CODE_LENGTH};
pub use token::SessionToken;
pub use user::User;
