//! The seek bar: what it shows, and what happens when the user moves it.

use crate::audio::AudioEngine;
use crate::error::Result;
use crate::transport::Transport;

/// Seek bar state. While grabbed, polls leave `value` alone so the bar
/// follows the pointer rather than the engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeekController {
    grabbed: bool,
    value: f64,
    maximum: f64,
}

impl SeekController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    /// Position shown on the bar, seconds.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Bar length, seconds. Zero when nothing is loaded or the length is unknown.
    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    /// Fill ratio for rendering, `0.0..=1.0`.
    pub fn ratio(&self) -> f64 {
        if self.maximum > 0.0 {
            (self.value / self.maximum).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn on_grab(&mut self) {
        self.grabbed = true;
    }

    pub fn on_drag(&mut self, value: f64) {
        if self.grabbed {
            self.value = value.clamp(0.0, self.maximum.max(0.0));
        }
    }

    /// Let go of the bar and seek to where it was dropped.
    pub fn on_release<E: AudioEngine>(
        &mut self,
        transport: &mut Transport<E>,
        seek_value: f64,
    ) -> Result<()> {
        self.grabbed = false;
        let result = transport.seek_to(seek_value);
        self.on_poll(transport);
        result
    }

    /// Seek to `fraction` of the current track, e.g. a click at 30% of the bar.
    pub fn on_click_seek<E: AudioEngine>(
        &mut self,
        transport: &mut Transport<E>,
        fraction: f64,
    ) -> Result<()> {
        let target = fraction.clamp(0.0, 1.0) * transport.length();
        self.on_release(transport, target)
    }

    pub fn on_poll<E: AudioEngine>(&mut self, transport: &Transport<E>) {
        if self.grabbed {
            return;
        }
        self.maximum = transport.length();
        self.value = if self.maximum > 0.0 {
            transport.elapsed().min(self.maximum)
        } else {
            transport.elapsed()
        };
    }
}

/// `m:ss`. Minutes are not wrapped into hours.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
