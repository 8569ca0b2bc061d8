//! Audio output boundary.
//!
//! The transport only talks to [`AudioEngine`]. [`RodioEngine`] is the real
//! implementation; tests drive a scripted fake.

mod engine;
mod rodio_engine;
mod sink;

pub use engine::AudioEngine;
pub use rodio_engine::RodioEngine;

#[cfg(test)]
pub(crate) mod fake;
