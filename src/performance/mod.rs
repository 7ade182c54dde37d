//! # Frame-rate readout
//!
//! [`FpsCounter`] records one sample per rendered frame and turns the recent
//! frame times into an FPS / frame-time readout drawn as an ImGui overlay.
//!
//! ## Usage
//!
//! ```rust
//! use pulse_sphere::performance::FpsCounter;
//!
//! let mut fps = FpsCounter::new();
//!
//! // Once per frame
//! fps.update();
//!
//! let metrics = fps.metrics();
//! assert!(metrics.fps >= 0.0);
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use crate::gfx::clock::{SystemTime, TimeSource};

/// Frame timing derived from the recent frame history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetrics {
    /// Frames per second over the sample window
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            min_frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
        }
    }
}

/// Rolling frame-rate counter
pub struct FpsCounter<T: TimeSource = SystemTime> {
    source: T,
    /// Ring buffer of recent frame times for averaging
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    last_frame: Option<Duration>,
    last_refresh: Duration,
    /// Metrics are recomputed at most this often
    refresh_interval: Duration,
    metrics: FrameMetrics,
}

impl FpsCounter<SystemTime> {
    pub fn new() -> Self {
        Self::with_source(SystemTime::new())
    }
}

impl Default for FpsCounter<SystemTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> FpsCounter<T> {
    /// Counter reading `source`; keeps ~2 seconds of history at 60fps
    pub fn with_source(source: T) -> Self {
        let now = source.now();
        Self {
            source,
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
            last_frame: None,
            last_refresh: now,
            refresh_interval: Duration::from_millis(100),
            metrics: FrameMetrics::default(),
        }
    }

    /// Records one frame
    pub fn update(&mut self) {
        let now = self.source.now();

        if let Some(last) = self.last_frame.replace(now) {
            if self.frame_times.len() >= self.max_samples {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back(now.saturating_sub(last));
        }

        if now.saturating_sub(self.last_refresh) >= self.refresh_interval {
            self.refresh_metrics();
            self.last_refresh = now;
        }
    }

    fn refresh_metrics(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total: Duration = self.frame_times.iter().sum();
        let avg_ms = total.as_secs_f32() * 1000.0 / self.frame_times.len() as f32;

        self.metrics.frame_time_ms = avg_ms;
        self.metrics.fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };

        if let (Some(min), Some(max)) = (self.frame_times.iter().min(), self.frame_times.iter().max())
        {
            self.metrics.min_frame_time_ms = min.as_secs_f32() * 1000.0;
            self.metrics.max_frame_time_ms = max.as_secs_f32() * 1000.0;
        }
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    /// Frame times in milliseconds, oldest first
    pub fn frame_time_history(&self) -> Vec<f32> {
        self.frame_times
            .iter()
            .map(|duration| duration.as_secs_f32() * 1000.0)
            .collect()
    }

    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.metrics = FrameMetrics::default();
        self.last_frame = None;
        self.last_refresh = self.source.now();
    }
}

/// Draws a compact readout in the top-left corner
pub fn render_overlay(ui: &imgui::Ui, metrics: &FrameMetrics) {
    ui.window("FPS")
        .size([110.0, 52.0], imgui::Condition::Always)
        .position([8.0, 8.0], imgui::Condition::Always)
        .no_decoration()
        .no_inputs()
        .bg_alpha(0.35)
        .build(|| {
            ui.text(format!("{:.0} FPS", metrics.fps));
            ui.text(format!("{:.1}ms", metrics.frame_time_ms));
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::clock::ManualTime;

    #[test]
    fn test_steady_frames_give_expected_rate() {
        let time = ManualTime::new();
        let mut counter = FpsCounter::with_source(time.clone());

        counter.update();
        for _ in 0..30 {
            time.advance(Duration::from_millis(20));
            counter.update();
        }

        let metrics = counter.metrics();
        assert!((metrics.fps - 50.0).abs() < 0.01);
        assert!((metrics.frame_time_ms - 20.0).abs() < 0.01);
        assert_eq!(metrics.min_frame_time_ms, metrics.max_frame_time_ms);
    }

    #[test]
    fn test_metrics_refresh_is_throttled() {
        let time = ManualTime::new();
        let mut counter = FpsCounter::with_source(time.clone());

        counter.update();
        time.advance(Duration::from_millis(10));
        counter.update();

        // Less than one refresh interval has passed
        assert_eq!(counter.metrics().fps, 0.0);
        assert_eq!(counter.frame_time_history().len(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let time = ManualTime::new();
        let mut counter = FpsCounter::with_source(time.clone());

        for _ in 0..500 {
            time.advance(Duration::from_millis(16));
            counter.update();
        }
        assert_eq!(counter.frame_time_history().len(), 120);

        counter.reset();
        assert!(counter.frame_time_history().is_empty());
        assert_eq!(*counter.metrics(), FrameMetrics::default());
    }
}
