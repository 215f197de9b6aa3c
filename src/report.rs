use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::RosterSummary;

pub fn to_json(summary: &RosterSummary) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn build_report(
    summary: &RosterSummary,
    evaluation_date: NaiveDate,
    window_length_days: i64,
    limit: usize,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Client Engagement Risk Report");
    let _ = writeln!(
        output,
        "Evaluated on {} comparing the last {} days against the {} days before.",
        evaluation_date, window_length_days, window_length_days
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");
    let _ = writeln!(output, "| Level | Clients |");
    let _ = writeln!(output, "|---|---|");
    let _ = writeln!(output, "| 高 (high) | {} |", summary.high_risk_count);
    let _ = writeln!(output, "| 中 (medium) | {} |", summary.medium_risk_count);
    let _ = writeln!(output, "| 低 (low) | {} |", summary.low_risk_count);
    let _ = writeln!(output, "| Total evaluated | {} |", summary.total_clients);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Projected departures: {}",
        summary.projected_departures()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Clients");

    if summary.predictions.is_empty() {
        let _ = writeln!(output, "No clients with records in the current window.");
        return output;
    }

    for prediction in summary.predictions.iter().take(limit) {
        let _ = writeln!(
            output,
            "- {} ({}) score {} [{}]",
            prediction.client_name,
            prediction.client_code,
            prediction.churn_risk_score,
            prediction.risk_level
        );
        let _ = writeln!(output, "  - {}", prediction.alert_message);
        let metrics = &prediction.metrics;
        let _ = writeln!(
            output,
            "  - progress {:.2} ({:+.1}%), records {} ({:+.1}%), sentiment {:.2} ({:+.1}%), quality {:.2} ({:+.1}%)",
            metrics.avg_progress_score,
            metrics.progress_change_rate,
            metrics.record_count,
            metrics.record_frequency_rate,
            metrics.avg_sentiment_score,
            metrics.sentiment_change_rate,
            metrics.avg_quality_score,
            metrics.quality_change_rate
        );
        for action in prediction.recommended_actions.iter() {
            let _ = writeln!(output, "  - Action: {}", action);
        }
    }

    output
}
