// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timeline playback
//!
//! Times are seconds. Document bounds are authored in time codes and
//! divided by the frame rate.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use usda_lite_processing::DocumentMetadata;

/// Lowest frame rate a timeline ticks at.
pub const MIN_FPS: f64 = 1.0;

/// Whether a playback mode string asks for wrapping.
pub fn is_looping_mode(mode: Option<&str>) -> bool {
    mode.map(|m| {
        let m = m.to_ascii_lowercase();
        m.contains("loop") || m.contains("repeat")
    })
    .unwrap_or(false)
}

/// Bounds and rate of a document's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub start: f64,
    pub end: f64,
    pub fps: f64,
    pub looping: bool,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    pub time: f64,
    /// Playback reached the end and stops
    pub finished: bool,
}

impl Timeline {
    pub fn from_metadata(metadata: &DocumentMetadata, fallback_fps: f64) -> Self {
        let fps = metadata
            .fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .unwrap_or(fallback_fps)
            .max(MIN_FPS);
        let start_code = metadata.start_time.unwrap_or(0.0);
        let end_code = metadata.end_time.unwrap_or(start_code).max(start_code);
        Self {
            start: start_code / fps,
            end: end_code / fps,
            fps,
            looping: is_looping_mode(metadata.playback_mode.as_deref()),
        }
    }

    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.frame_duration())
    }

    pub fn clamp(&self, time: f64) -> f64 {
        time.clamp(self.start, self.end)
    }

    /// Move `current` forward by one frame at `speed`.
    pub fn advance(&self, current: f64, speed: f64) -> Advance {
        let next = current + self.frame_duration() * speed;
        if next >= self.end {
            if self.looping {
                Advance {
                    time: self.start,
                    finished: false,
                }
            } else {
                Advance {
                    time: self.end,
                    finished: true,
                }
            }
        } else {
            Advance {
                time: next,
                finished: false,
            }
        }
    }
}

/// Playback part of the inspector state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub timeline: Option<Timeline>,
    pub current_time: f64,
    pub is_playing: bool,
    pub speed: f64,
    pub is_scrubbing: bool,
    /// Ticker epoch; ticks from an older epoch are ignored
    pub generation: u64,
}

impl PlaybackState {
    pub fn new(speed: f64) -> Self {
        Self {
            timeline: None,
            current_time: 0.0,
            is_playing: false,
            speed,
            is_scrubbing: false,
            generation: 0,
        }
    }

    /// Whether a ticker should be running.
    pub fn should_tick(&self) -> bool {
        self.is_playing && !self.is_scrubbing && self.timeline.is_some()
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(fps: Option<f64>, mode: Option<&str>) -> Timeline {
        let metadata = DocumentMetadata {
            start_time: Some(0.0),
            end_time: Some(4.0),
            fps,
            playback_mode: mode.map(String::from),
            ..DocumentMetadata::default()
        };
        Timeline::from_metadata(&metadata, 24.0)
    }

    #[test]
    fn test_looping_mode() {
        assert!(is_looping_mode(Some("Loop")));
        assert!(is_looping_mode(Some("pingREPEAT")));
        assert!(!is_looping_mode(Some("once")));
        assert!(!is_looping_mode(None));
    }

    #[test]
    fn test_bounds_in_seconds() {
        let t = timeline(Some(2.0), None);
        assert_eq!(t.start, 0.0);
        assert_eq!(t.end, 2.0);
        assert_eq!(t.tick_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_fps_floor() {
        assert_eq!(timeline(Some(0.25), None).fps, 1.0);
        assert_eq!(timeline(Some(0.0), None).fps, 24.0);
        assert_eq!(timeline(None, None).fps, 24.0);
    }

    #[test]
    fn test_advance_clamps_and_stops() {
        let t = timeline(Some(2.0), Some("once"));
        assert_eq!(t.advance(1.0, 1.0), Advance { time: 1.5, finished: false });
        assert_eq!(t.advance(1.5, 1.0), Advance { time: 2.0, finished: true });
        assert_eq!(t.advance(1.0, 4.0), Advance { time: 2.0, finished: true });
    }

    #[test]
    fn test_advance_wraps() {
        let t = timeline(Some(2.0), Some("loop"));
        assert_eq!(t.advance(1.5, 1.0), Advance { time: 0.0, finished: false });
        assert_eq!(t.advance(0.0, 2.0), Advance { time: 1.0, finished: false });
    }
}
