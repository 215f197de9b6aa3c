use crate::config::SignalWeights;
use crate::models::Signal;
use crate::risk::risk_contribution;
use crate::trend::SignalTrends;

pub fn action_for(signal: Signal) -> &'static str {
    match signal {
        Signal::Progress => {
            "Progress scores are declining. Review the individual support plan with the care team."
        }
        Signal::Frequency => {
            "Assessments are being recorded less often. Confirm attendance and restore a regular recording schedule."
        }
        Signal::Sentiment => {
            "Sentiment in progress notes is declining. Arrange a meeting with the client and their guardian."
        }
        Signal::Quality => {
            "Record quality is declining. Keep progress notes specific and objective."
        }
    }
}

/// Actions for every signal whose contribution exceeds `trigger`, strongest
/// decline first. Equal contributions order by weight, then signal priority.
///
/// Small declines spread over several signals can raise the score without
/// triggering any action, so a Medium or High client may get an empty list.
pub fn recommend(trends: &SignalTrends, weights: &SignalWeights, trigger: f64) -> Vec<String> {
    let mut triggered: Vec<(Signal, f64)> = Signal::ALL
        .iter()
        .map(|signal| (*signal, risk_contribution(trends.rate(*signal))))
        .filter(|(_, contribution)| *contribution > trigger)
        .collect();

    triggered.sort_by(|(a, a_contribution), (b, b_contribution)| {
        b_contribution
            .total_cmp(a_contribution)
            .then_with(|| weights.weight(*b).total_cmp(&weights.weight(*a)))
            .then_with(|| a.cmp(b))
    });

    triggered
        .into_iter()
        .map(|(signal, _)| action_for(signal).to_string())
        .collect()
}
