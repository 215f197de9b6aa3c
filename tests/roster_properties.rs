use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use uuid::Uuid;

use engagement_risk::config::SignalWeights;
use engagement_risk::models::{RiskColor, Signal};
use engagement_risk::recommend::{action_for, recommend};
use engagement_risk::risk::{churn_risk_score, classify};
use engagement_risk::trend::SignalTrends;
use engagement_risk::{
    evaluate_client, evaluate_roster, Client, ClientEvaluation, EngineConfig, ProgressRecord,
    RiskLevel,
};

fn evaluation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
}

fn client(code: &str, name: &str) -> Client {
    Client {
        client_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, code.as_bytes()),
        client_code: code.to_string(),
        full_name: name.to_string(),
    }
}

/// A record `days_ago` days before the evaluation date with flat sentiment and quality.
fn record(client: &Client, days_ago: i64, progress: f64) -> ProgressRecord {
    ProgressRecord {
        client_id: client.client_id,
        staff_id: None,
        assessment_date: evaluation_date() - Duration::days(days_ago),
        progress_score: progress,
        sentiment_score: Some(0.5),
        quality_score: Some(4),
        notes: String::new(),
    }
}

#[test]
fn steep_progress_decline_alone_stays_low() {
    let avery = client("C-001", "Avery Lee");
    let mut records: Vec<ProgressRecord> = [35, 40, 45, 50, 55]
        .iter()
        .map(|days| record(&avery, *days, 4.0))
        .collect();
    records.extend([3, 10, 20].iter().map(|days| record(&avery, *days, 2.0)));

    let summary = evaluate_roster(
        &[avery.clone()],
        &records,
        evaluation_date(),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(summary.total_clients, 1);
    let assessment = &summary.predictions[0];
    assert_eq!(assessment.metrics.progress_change_rate, -50.0);
    assert_eq!(assessment.metrics.record_frequency_rate, -40.0);
    assert_eq!(assessment.metrics.sentiment_change_rate, 0.0);
    assert_eq!(assessment.metrics.quality_change_rate, 0.0);
    assert_eq!(assessment.metrics.record_count, 3);
    assert_eq!(assessment.metrics.avg_progress_score, 2.0);
    assert_eq!(assessment.churn_risk_score, 27);
    assert_eq!(assessment.risk_level, RiskLevel::Low);
    assert_eq!(assessment.risk_color, RiskColor::Green);
    assert_eq!(
        assessment.alert_message,
        "Avery Lee: progress score declined 50% — risk level 低."
    );
    assert_eq!(
        assessment.recommended_actions,
        vec![
            action_for(Signal::Progress).to_string(),
            action_for(Signal::Frequency).to_string(),
        ]
    );
}

#[test]
fn client_without_current_records_is_excluded() {
    let avery = client("C-001", "Avery Lee");
    let jules = client("C-002", "Jules Moreno");
    let records = vec![
        record(&avery, 5, 3.0),
        record(&jules, 40, 4.0),
        record(&jules, 45, 4.0),
    ];

    let summary = evaluate_roster(
        &[avery, jules.clone()],
        &records,
        evaluation_date(),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(summary.total_clients, 1);
    assert!(summary
        .predictions
        .iter()
        .all(|p| p.client_code != jules.client_code));
    assert_eq!(
        summary.high_risk_count + summary.medium_risk_count + summary.low_risk_count,
        1
    );
}

#[test]
fn total_decline_is_maximal_risk_with_every_action() {
    let trends = SignalTrends {
        progress: -100.0,
        frequency: -100.0,
        sentiment: -100.0,
        quality: -100.0,
    };
    let weights = SignalWeights::default();
    let score = churn_risk_score(&trends, &weights);
    assert_eq!(score, 100);

    let classification = classify("Kiara Patel", score, &trends, &Default::default());
    assert_eq!(classification.level, RiskLevel::High);
    assert_eq!(classification.level.label(), "高");

    let actions = recommend(&trends, &weights, 10.0);
    assert_eq!(
        actions,
        Signal::ALL
            .iter()
            .map(|signal| action_for(*signal).to_string())
            .collect::<Vec<_>>()
    );
}

#[test]
fn sharp_decline_across_signals_is_high() {
    let kiara = client("C-003", "Kiara Patel");
    let mut records = Vec::new();
    for days in [31, 34, 37, 40, 43, 46, 49, 52, 55, 58] {
        let mut r = record(&kiara, days, 5.0);
        r.sentiment_score = Some(0.8);
        r.quality_score = Some(5);
        records.push(r);
    }
    let mut latest = record(&kiara, 2, 1.0);
    latest.sentiment_score = Some(-0.4);
    latest.quality_score = Some(1);
    records.push(latest);

    let summary = evaluate_roster(
        &[kiara],
        &records,
        evaluation_date(),
        &EngineConfig::default(),
    )
    .unwrap();

    // progress -80, frequency -90, sentiment -100, quality -80
    let assessment = &summary.predictions[0];
    assert_eq!(assessment.churn_risk_score, 87);
    assert_eq!(assessment.risk_level, RiskLevel::High);
    assert_eq!(summary.high_risk_count, 1);
    assert_eq!(
        assessment.alert_message,
        "Kiara Patel: sentiment score declined 100% — risk level 高."
    );
    assert_eq!(assessment.recommended_actions.len(), 4);
    assert_eq!(
        assessment.recommended_actions[0],
        action_for(Signal::Sentiment)
    );
}

#[test]
fn new_client_gets_flat_trends() {
    let newcomer = client("C-010", "Riley Chen");
    let records = vec![record(&newcomer, 1, 0.0), record(&newcomer, 8, 0.0)];

    match evaluate_client(
        &newcomer,
        &records,
        evaluation_date(),
        &EngineConfig::default(),
    )
    .unwrap()
    {
        ClientEvaluation::Assessed(assessment) => {
            assert_eq!(assessment.churn_risk_score, 0);
            assert_eq!(assessment.metrics.progress_change_rate, 0.0);
            assert_eq!(assessment.metrics.record_frequency_rate, 0.0);
            assert_eq!(assessment.metrics.sentiment_change_rate, 0.0);
            assert_eq!(assessment.metrics.quality_change_rate, 0.0);
            assert!(assessment.recommended_actions.is_empty());
        }
        other => panic!("expected an assessment, got {other:?}"),
    }
}

#[test]
fn equal_scores_rank_by_client_code() {
    let clients = vec![
        client("C-300", "Third"),
        client("C-100", "First"),
        client("C-200", "Second"),
    ];
    let records: Vec<ProgressRecord> = clients.iter().map(|c| record(c, 4, 3.0)).collect();

    let summary = evaluate_roster(
        &clients,
        &records,
        evaluation_date(),
        &EngineConfig::default(),
    )
    .unwrap();
    let codes: Vec<&str> = summary
        .predictions
        .iter()
        .map(|p| p.client_code.as_str())
        .collect();
    assert_eq!(codes, vec!["C-100", "C-200", "C-300"]);
}

#[test]
fn window_length_changes_the_comparison() {
    let avery = client("C-001", "Avery Lee");
    let records = vec![record(&avery, 10, 4.0), record(&avery, 3, 2.0)];

    let thirty = evaluate_roster(
        &[avery.clone()],
        &records,
        evaluation_date(),
        &EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(thirty.predictions[0].metrics.progress_change_rate, 0.0);

    let weekly = evaluate_roster(
        &[avery],
        &records,
        evaluation_date(),
        &EngineConfig::default().with_window_length(7),
    )
    .unwrap();
    assert_eq!(weekly.predictions[0].metrics.progress_change_rate, -50.0);
}

fn arb_records(clients: Vec<Client>) -> impl Strategy<Value = (Vec<Client>, Vec<ProgressRecord>)> {
    let count = clients.len();
    prop::collection::vec(
        (
            0..count,
            0i64..75,
            0.0f64..=5.0,
            prop::option::of(-1.0f64..=1.0),
            prop::option::of(1i32..=5),
        ),
        0..60,
    )
    .prop_map(move |rows| {
        let records = rows
            .into_iter()
            .map(|(index, days_ago, progress, sentiment, quality)| ProgressRecord {
                client_id: clients[index].client_id,
                staff_id: None,
                assessment_date: evaluation_date() - Duration::days(days_ago),
                progress_score: progress,
                sentiment_score: sentiment,
                quality_score: quality,
                notes: String::new(),
            })
            .collect();
        (clients.clone(), records)
    })
}

fn roster() -> Vec<Client> {
    vec![
        client("C-001", "Avery Lee"),
        client("C-002", "Jules Moreno"),
        client("C-003", "Kiara Patel"),
        client("C-004", "Riley Chen"),
    ]
}

proptest! {
    #[test]
    fn scores_are_bounded_and_counts_consistent((clients, records) in arb_records(roster())) {
        let summary = evaluate_roster(&clients, &records, evaluation_date(), &EngineConfig::default()).unwrap();

        prop_assert!(summary.predictions.iter().all(|p| p.churn_risk_score <= 100));
        prop_assert_eq!(
            summary.high_risk_count + summary.medium_risk_count + summary.low_risk_count,
            summary.total_clients
        );
        prop_assert_eq!(summary.total_clients, summary.predictions.len());
        for pair in summary.predictions.windows(2) {
            prop_assert!(
                pair[0].churn_risk_score > pair[1].churn_risk_score
                    || (pair[0].churn_risk_score == pair[1].churn_risk_score
                        && pair[0].client_code <= pair[1].client_code)
            );
        }
    }

    #[test]
    fn repeated_runs_are_identical((clients, records) in arb_records(roster())) {
        let config = EngineConfig::default();
        let first = evaluate_roster(&clients, &records, evaluation_date(), &config).unwrap();
        let second = evaluate_roster(&clients, &records, evaluation_date(), &config).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        prop_assert_eq!(first, second);
    }

    #[test]
    fn lower_current_progress_never_lowers_risk(
        baseline in 0.0f64..=5.0,
        current in 0.0f64..=5.0,
        drop in 0.0f64..=5.0,
        baseline_visits in 1usize..6,
        current_visits in 1usize..6,
    ) {
        let avery = client("C-001", "Avery Lee");
        let lowered = (current - drop).max(0.0);
        let build = |current_progress: f64| {
            let mut records: Vec<ProgressRecord> = (0..baseline_visits)
                .map(|i| record(&avery, 35 + i as i64, baseline))
                .collect();
            records.extend((0..current_visits).map(|i| record(&avery, 2 + i as i64, current_progress)));
            records
        };
        let score = |records: &[ProgressRecord]| {
            match evaluate_client(&avery, records, evaluation_date(), &EngineConfig::default()).unwrap() {
                ClientEvaluation::Assessed(assessment) => assessment.churn_risk_score,
                ClientEvaluation::InsufficientData => unreachable!("current window has records"),
            }
        };

        prop_assert!(score(build(lowered).as_slice()) >= score(build(current).as_slice()));
    }
}
