//! Splits a client's records into the baseline and current windows and averages
//! each signal per window.

use chrono::{NaiveDate, TimeDelta};
use thiserror::Error;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::models::ProgressRecord;

const NEUTRAL_PROGRESS: f64 = 3.0;
const NEUTRAL_SENTIMENT: f64 = 0.0;
const NEUTRAL_QUALITY: f64 = 3.0;

/// Half-open date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Two adjacent windows of equal length. `current` ends with the evaluation date
/// (inclusive) and `baseline` covers the days right before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationWindows {
    pub baseline: TimeWindow,
    pub current: TimeWindow,
}

impl EvaluationWindows {
    pub fn anchored(evaluation_date: NaiveDate, length_days: i64) -> Result<Self> {
        let out_of_range = || {
            EngineError::InvalidConfiguration(format!(
                "a {length_days}-day window ending on {evaluation_date} is outside the supported calendar"
            ))
        };
        if length_days < 1 {
            return Err(EngineError::InvalidConfiguration(format!(
                "window_length_days must be at least 1, got {length_days}"
            )));
        }

        let length = TimeDelta::try_days(length_days).ok_or_else(out_of_range)?;
        let end = evaluation_date.succ_opt().ok_or_else(out_of_range)?;
        let split = end.checked_sub_signed(length).ok_or_else(out_of_range)?;
        let start = split.checked_sub_signed(length).ok_or_else(out_of_range)?;

        Ok(Self {
            baseline: TimeWindow { start, end: split },
            current: TimeWindow { start: split, end },
        })
    }
}

/// Why a record was left out of the averages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordIssue {
    #[error("progress score {0} outside 0.0..=5.0")]
    ProgressOutOfRange(f64),
    #[error("sentiment score {0} outside -1.0..=1.0")]
    SentimentOutOfRange(f64),
    #[error("quality score {0} outside 1..=5")]
    QualityOutOfRange(i32),
}

pub fn inspect(record: &ProgressRecord) -> std::result::Result<(), RecordIssue> {
    if !record.progress_score.is_finite() || !(0.0..=5.0).contains(&record.progress_score) {
        return Err(RecordIssue::ProgressOutOfRange(record.progress_score));
    }
    if let Some(sentiment) = record.sentiment_score {
        if !sentiment.is_finite() || !(-1.0..=1.0).contains(&sentiment) {
            return Err(RecordIssue::SentimentOutOfRange(sentiment));
        }
    }
    if let Some(quality) = record.quality_score {
        if !(1..=5).contains(&quality) {
            return Err(RecordIssue::QualityOutOfRange(quality));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMetrics {
    pub avg_progress_score: f64,
    pub avg_sentiment_score: f64,
    pub avg_quality_score: f64,
    pub record_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    Sufficient {
        baseline: WindowMetrics,
        current: WindowMetrics,
    },
    /// No usable record in the current window.
    InsufficientData,
}

#[derive(Debug, Default)]
struct Accumulator {
    progress_total: f64,
    sentiment_total: f64,
    sentiment_count: usize,
    quality_total: f64,
    quality_count: usize,
    record_count: usize,
}

impl Accumulator {
    fn add(&mut self, record: &ProgressRecord) {
        self.record_count += 1;
        self.progress_total += record.progress_score;
        if let Some(sentiment) = record.sentiment_score {
            self.sentiment_total += sentiment;
            self.sentiment_count += 1;
        }
        if let Some(quality) = record.quality_score {
            self.quality_total += f64::from(quality);
            self.quality_count += 1;
        }
    }

    fn progress(&self) -> Option<f64> {
        mean(self.progress_total, self.record_count)
    }

    fn sentiment(&self) -> Option<f64> {
        mean(self.sentiment_total, self.sentiment_count)
    }

    fn quality(&self) -> Option<f64> {
        mean(self.quality_total, self.quality_count)
    }
}

fn mean(total: f64, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

/// A signal missing from one window copies the other window's value so its trend
/// reads as flat. Missing from both, it takes the neutral value.
fn resolve(own: Option<f64>, other: Option<f64>, neutral: f64) -> f64 {
    own.or(other).unwrap_or(neutral)
}

/// Averages one client's records per window. Records are summed in the order
/// given, so callers wanting reproducible floats pass them in a stable order.
pub fn aggregate<'a, I>(records: I, windows: &EvaluationWindows) -> Aggregation
where
    I: IntoIterator<Item = &'a ProgressRecord>,
{
    let mut baseline = Accumulator::default();
    let mut current = Accumulator::default();

    for record in records {
        let target = if windows.current.contains(record.assessment_date) {
            &mut current
        } else if windows.baseline.contains(record.assessment_date) {
            &mut baseline
        } else {
            continue;
        };

        if let Err(issue) = inspect(record) {
            warn!(
                client_id = %record.client_id,
                assessment_date = %record.assessment_date,
                %issue,
                "excluding malformed progress record"
            );
            continue;
        }
        target.add(record);
    }

    if current.record_count == 0 {
        return Aggregation::InsufficientData;
    }

    let current_metrics = WindowMetrics {
        avg_progress_score: resolve(current.progress(), baseline.progress(), NEUTRAL_PROGRESS),
        avg_sentiment_score: resolve(
            current.sentiment(),
            baseline.sentiment(),
            NEUTRAL_SENTIMENT,
        ),
        avg_quality_score: resolve(current.quality(), baseline.quality(), NEUTRAL_QUALITY),
        record_count: current.record_count,
    };

    // A client with no history is compared against itself.
    let baseline_metrics = if baseline.record_count == 0 {
        current_metrics
    } else {
        WindowMetrics {
            avg_progress_score: resolve(
                baseline.progress(),
                current.progress(),
                NEUTRAL_PROGRESS,
            ),
            avg_sentiment_score: resolve(
                baseline.sentiment(),
                current.sentiment(),
                NEUTRAL_SENTIMENT,
            ),
            avg_quality_score: resolve(baseline.quality(), current.quality(), NEUTRAL_QUALITY),
            record_count: baseline.record_count,
        }
    };

    Aggregation::Sufficient {
        baseline: baseline_metrics,
        current: current_metrics,
    }
}
