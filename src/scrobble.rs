//! Scrobbling to Last.fm.
//!
//! [`Scrobbler`] is the part the UI talks to. It owns an optional
//! [`ScrobbleService`] (normally [`LastFmClient`]), runs the login flow as an
//! [`AuthTask`] and reports plays according to [`ScrobbleTracker`].

mod auth;
mod client;
mod error;
mod scrobbler;
mod service;
mod store;
mod tracker;

pub use auth::{AuthEvent, AuthHandle, AuthTask};
pub use client::LastFmClient;
pub use error::{Result, ScrobbleError};
pub use scrobbler::Scrobbler;
pub use service::{AuthToken, ScrobbleService, SessionKey, SessionPoll, TrackInfo};
pub use store::SessionKeyStore;
pub use tracker::{ScrobbleTracker, TrackerAction, scrobble_threshold};

#[cfg(test)]
mod tests;
