//! Runs the per-client pipeline across the roster and ranks the results.

use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{Client, ProgressRecord, RiskAssessment, RiskLevel, RosterSummary, SignalMetrics};
use crate::recommend::recommend;
use crate::risk::{churn_risk_score, classify};
use crate::trend::SignalTrends;
use crate::window::{aggregate, Aggregation, EvaluationWindows};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvaluation {
    Assessed(RiskAssessment),
    /// No usable record in the current window; the client is left out of the roster.
    InsufficientData,
}

/// Scores a single client against the records given. Records belonging to other
/// clients are ignored.
pub fn evaluate_client(
    client: &Client,
    records: &[ProgressRecord],
    evaluation_date: NaiveDate,
    config: &EngineConfig,
) -> Result<ClientEvaluation> {
    config.validate()?;
    let windows = EvaluationWindows::anchored(evaluation_date, config.window_length_days)?;
    let own: Vec<&ProgressRecord> = records
        .iter()
        .filter(|record| record.client_id == client.client_id)
        .collect();
    Ok(assess(client, own, &windows, config))
}

/// Scores every client in parallel, then ranks by score (highest first) with
/// ties broken by client code.
pub fn evaluate_roster(
    clients: &[Client],
    records: &[ProgressRecord],
    evaluation_date: NaiveDate,
    config: &EngineConfig,
) -> Result<RosterSummary> {
    config.validate()?;
    let windows = EvaluationWindows::anchored(evaluation_date, config.window_length_days)?;

    let mut by_client: HashMap<Uuid, Vec<&ProgressRecord>> = HashMap::new();
    for record in records {
        by_client.entry(record.client_id).or_default().push(record);
    }

    let evaluations: Vec<ClientEvaluation> = clients
        .par_iter()
        .map(|client| {
            let own = by_client
                .get(&client.client_id)
                .cloned()
                .unwrap_or_default();
            assess(client, own, &windows, config)
        })
        .collect();

    let mut predictions: Vec<RiskAssessment> = evaluations
        .into_iter()
        .filter_map(|evaluation| match evaluation {
            ClientEvaluation::Assessed(assessment) => Some(assessment),
            ClientEvaluation::InsufficientData => None,
        })
        .collect();
    rank(&mut predictions);

    let summary = summarize(predictions);
    info!(
        %evaluation_date,
        window_length_days = config.window_length_days,
        registered = clients.len(),
        evaluated = summary.total_clients,
        high = summary.high_risk_count,
        medium = summary.medium_risk_count,
        low = summary.low_risk_count,
        "roster evaluated"
    );
    Ok(summary)
}

fn assess(
    client: &Client,
    mut records: Vec<&ProgressRecord>,
    windows: &EvaluationWindows,
    config: &EngineConfig,
) -> ClientEvaluation {
    // Stable sort keeps float summation order reproducible.
    records.sort_by_key(|record| record.assessment_date);

    let (baseline, current) = match aggregate(records, windows) {
        Aggregation::Sufficient { baseline, current } => (baseline, current),
        Aggregation::InsufficientData => {
            info!(
                client_code = %client.client_code,
                "no records in current window; client excluded"
            );
            return ClientEvaluation::InsufficientData;
        }
    };

    let trends = SignalTrends::between(&baseline, &current);
    let score = churn_risk_score(&trends, &config.weights);
    let classification = classify(&client.full_name, score, &trends, &config.risk_thresholds);
    let recommended_actions = recommend(
        &trends,
        &config.weights,
        config.recommendation_trigger_threshold,
    );

    debug!(
        client_code = %client.client_code,
        score,
        level = %classification.level,
        "client scored"
    );

    ClientEvaluation::Assessed(RiskAssessment {
        client_id: client.client_id,
        client_name: client.full_name.clone(),
        client_code: client.client_code.clone(),
        churn_risk_score: score,
        risk_level: classification.level,
        risk_color: classification.color,
        alert_message: classification.alert_message,
        recommended_actions,
        metrics: SignalMetrics {
            avg_progress_score: round_to(current.avg_progress_score, 2),
            progress_change_rate: round_to(trends.progress, 1),
            record_count: current.record_count,
            record_frequency_rate: round_to(trends.frequency, 1),
            avg_sentiment_score: round_to(current.avg_sentiment_score, 2),
            sentiment_change_rate: round_to(trends.sentiment, 1),
            avg_quality_score: round_to(current.avg_quality_score, 2),
            quality_change_rate: round_to(trends.quality, 1),
        },
    })
}

fn rank(predictions: &mut [RiskAssessment]) {
    predictions.sort_by(|a, b| {
        b.churn_risk_score
            .cmp(&a.churn_risk_score)
            .then_with(|| a.client_code.cmp(&b.client_code))
            .then_with(|| a.client_id.cmp(&b.client_id))
    });
}

fn summarize(predictions: Vec<RiskAssessment>) -> RosterSummary {
    let count = |level: RiskLevel| {
        predictions
            .iter()
            .filter(|prediction| prediction.risk_level == level)
            .count()
    };

    RosterSummary {
        total_clients: predictions.len(),
        high_risk_count: count(RiskLevel::High),
        medium_risk_count: count(RiskLevel::Medium),
        low_risk_count: count(RiskLevel::Low),
        predictions,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // Avoid emitting "-0.0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
