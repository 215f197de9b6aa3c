use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registry entry for one client. Read-only reference data for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub client_id: Uuid,
    pub client_code: String,
    pub full_name: String,
}

/// One periodic assessment written by staff.
///
/// Sentiment and quality are filled in after the note has been analysed, so
/// either may still be missing when a run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub client_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub assessment_date: NaiveDate,
    /// 0.0 to 5.0
    pub progress_score: f64,
    /// -1.0 to 1.0
    pub sentiment_score: Option<f64>,
    /// 1 to 5
    pub quality_score: Option<i32>,
    pub notes: String,
}

/// The four tracked signals, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    Progress,
    Frequency,
    Sentiment,
    Quality,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::Progress,
        Signal::Frequency,
        Signal::Sentiment,
        Signal::Quality,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Signal::Progress => "progress score",
            Signal::Frequency => "record frequency",
            Signal::Sentiment => "sentiment score",
            Signal::Quality => "record quality",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "高")]
    High,
    #[serde(rename = "中")]
    Medium,
    #[serde(rename = "低")]
    Low,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::High => "高",
            RiskLevel::Medium => "中",
            RiskLevel::Low => "低",
        }
    }

    pub fn color(self) -> RiskColor {
        match self {
            RiskLevel::High => RiskColor::Red,
            RiskLevel::Medium => RiskColor::Orange,
            RiskLevel::Low => RiskColor::Green,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Red,
    Orange,
    Green,
}

/// Current-window averages and their change rates against the baseline window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMetrics {
    pub avg_progress_score: f64,
    pub progress_change_rate: f64,
    pub record_count: usize,
    pub record_frequency_rate: f64,
    pub avg_sentiment_score: f64,
    pub sentiment_change_rate: f64,
    pub avg_quality_score: f64,
    pub quality_change_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub client_id: Uuid,
    pub client_name: String,
    pub client_code: String,
    pub churn_risk_score: u8,
    pub risk_level: RiskLevel,
    pub risk_color: RiskColor,
    pub alert_message: String,
    pub recommended_actions: Vec<String>,
    pub metrics: SignalMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSummary {
    pub total_clients: usize,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub predictions: Vec<RiskAssessment>,
}

impl RosterSummary {
    /// Expected departures over the coming period: 80% of high-risk clients
    /// plus 30% of medium-risk clients, rounded down.
    pub fn projected_departures(&self) -> usize {
        (self.high_risk_count * 8 + self.medium_risk_count * 3) / 10
    }
}
