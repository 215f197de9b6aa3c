//! Composite churn risk score and its classification.
//!
//! Only declines add risk. An improving signal contributes nothing and does not
//! offset a decline elsewhere.

use crate::config::{RiskThresholds, SignalWeights};
use crate::models::{RiskColor, RiskLevel, Signal};
use crate::trend::SignalTrends;

pub fn risk_contribution(rate: f64) -> f64 {
    (-rate).max(0.0)
}

/// Weighted sum of contributions, rounded to the nearest integer in `0..=100`.
pub fn churn_risk_score(trends: &SignalTrends, weights: &SignalWeights) -> u8 {
    let raw: f64 = Signal::ALL
        .iter()
        .map(|signal| weights.weight(*signal) * risk_contribution(trends.rate(*signal)))
        .sum();
    raw.round().clamp(0.0, 100.0) as u8
}

/// The signal with the largest contribution; earlier signals win ties.
/// `None` when nothing declined.
pub fn worst_signal(trends: &SignalTrends) -> Option<Signal> {
    let mut worst: Option<(Signal, f64)> = None;
    for signal in Signal::ALL {
        let contribution = risk_contribution(trends.rate(signal));
        if contribution <= 0.0 {
            continue;
        }
        let replaces = match worst {
            Some((_, best)) => contribution > best,
            None => true,
        };
        if replaces {
            worst = Some((signal, contribution));
        }
    }
    worst.map(|(signal, _)| signal)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub level: RiskLevel,
    pub color: RiskColor,
    pub alert_message: String,
}

pub fn classify(
    client_name: &str,
    score: u8,
    trends: &SignalTrends,
    thresholds: &RiskThresholds,
) -> Classification {
    let level = thresholds.level_for(score);
    Classification {
        level,
        color: level.color(),
        alert_message: alert_message(client_name, level, trends),
    }
}

pub fn alert_message(client_name: &str, level: RiskLevel, trends: &SignalTrends) -> String {
    match worst_signal(trends) {
        Some(signal) => format!(
            "{client_name}: {signal} declined {:.0}% — risk level {level}.",
            trends.rate(signal).abs()
        ),
        None => format!("{client_name}: no signal declined — risk level {level}."),
    }
}
