use crate::models::Signal;
use crate::window::WindowMetrics;

pub const MAX_CHANGE_RATE: f64 = 100.0;

/// Percentage change from `baseline` to `current`, bounded to `[-100, 100]`.
///
/// A zero baseline has no meaningful ratio: any move away from it counts as the
/// maximal change in that direction.
pub fn change_rate(baseline: f64, current: f64) -> f64 {
    if baseline == 0.0 {
        return if current > 0.0 {
            MAX_CHANGE_RATE
        } else if current < 0.0 {
            -MAX_CHANGE_RATE
        } else {
            0.0
        };
    }

    let rate = (current - baseline) / baseline.abs() * 100.0;
    rate.clamp(-MAX_CHANGE_RATE, MAX_CHANGE_RATE)
}

/// Change rates of the four signals between two windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalTrends {
    pub progress: f64,
    pub frequency: f64,
    pub sentiment: f64,
    pub quality: f64,
}

impl SignalTrends {
    pub fn between(baseline: &WindowMetrics, current: &WindowMetrics) -> Self {
        Self {
            progress: change_rate(baseline.avg_progress_score, current.avg_progress_score),
            frequency: change_rate(
                baseline.record_count as f64,
                current.record_count as f64,
            ),
            sentiment: change_rate(baseline.avg_sentiment_score, current.avg_sentiment_score),
            quality: change_rate(baseline.avg_quality_score, current.avg_quality_score),
        }
    }

    pub fn rate(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Progress => self.progress,
            Signal::Frequency => self.frequency,
            Signal::Sentiment => self.sentiment,
            Signal::Quality => self.quality,
        }
    }
}
