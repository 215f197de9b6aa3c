//! Client engagement risk scoring.
//!
//! Each client's progress assessments are split into a baseline and a current
//! window. The four signal trends between them combine into a churn risk score,
//! a risk level with an alert, and a list of recommended interventions.
//! [`roster::evaluate_roster`] runs this across every client and ranks the results.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod recommend;
pub mod report;
pub mod risk;
pub mod roster;
pub mod source;
pub mod telemetry;
pub mod trend;
pub mod window;

pub use config::EngineConfig;
pub use error::EngineError;
pub use models::{Client, ProgressRecord, RiskAssessment, RiskLevel, RosterSummary};
pub use roster::{evaluate_client, evaluate_roster, ClientEvaluation};
