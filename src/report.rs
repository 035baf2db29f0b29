//! Plain-text rendering of session state for an operator's terminal.

use std::fmt::Write;

use crate::aggregate::{GlobalStatistics, IntervalStatistics};
use crate::client::{Confidence, ModelDescriptor};
use crate::session::{PredictionView, SessionState};

pub const NO_DATA: &str = "No prediction data available. Please generate predictions.";

pub fn render_state(
    state: &SessionState,
    model: Option<&ModelDescriptor>,
    interval_minutes: u64,
) -> String {
    match state {
        SessionState::Idle => format!("{}\n", NO_DATA),
        SessionState::Pending => "Predicting...\n".to_string(),
        SessionState::Succeeded(view) => render_view(view, model, interval_minutes),
        SessionState::Failed(msg) => render_failure(msg),
    }
}

pub fn render_failure(msg: &str) -> String {
    format!("Error: {}\n", msg)
}

pub fn render_model(model: &ModelDescriptor) -> String {
    let mut out = String::new();
    let status = if model.is_loaded { "Ready" } else { "Not Loaded" };
    let _ = writeln!(out, "Model Information [{}]", status);
    let _ = writeln!(out, "  Model Name:        {}", model.name);
    let _ = writeln!(out, "  Description:       {}", model.description);
    let _ = writeln!(out, "  Routes:            {}", model.parameters.route_count);
    let _ = writeln!(out, "  History Steps:     {}", model.parameters.history_window);
    let _ = writeln!(out, "  Prediction Steps:  {}", model.parameters.prediction_horizon);
    let _ = writeln!(out, "  Batch Size:        {}", model.parameters.batch_size);
    out
}

pub fn render_view(
    view: &PredictionView,
    model: Option<&ModelDescriptor>,
    interval_minutes: u64,
) -> String {
    let mut out = String::new();
    if let Some(scenario) = &view.scenario {
        let _ = writeln!(out, "Simulation Scenario: {}", scenario);
    }
    if let Some(confidence) = &view.confidence {
        out.push_str(&render_confidence(confidence));
    }
    if view.aggregate.series.is_empty() {
        let _ = writeln!(out, "{}", NO_DATA);
        return out;
    }

    let a = &view.assessment;
    let horizon = (view.interval_count() as u64).saturating_mul(interval_minutes);
    let routes = model.map(|m| m.parameters.route_count);
    let _ = writeln!(out);
    let _ = writeln!(out, "Expected Traffic: {} ({})", a.condition.label(), a.condition.color());
    let _ = writeln!(out, "{}", a.explanation(horizon, routes));
    let _ = writeln!(out, "{}", a.advice());
    let _ = writeln!(out);
    out.push_str(&render_summary(&view.aggregate.summary));
    let _ = writeln!(out);
    out.push_str(&render_series(&view.aggregate.series));
    out
}

fn render_confidence(c: &Confidence) -> String {
    let marker = if c.is_high() { "+" } else { "~" };
    format!(
        "Model Confidence: {} {}% ({})\n  {}\n",
        marker, c.score, c.level, c.explanation
    )
}

pub fn render_summary(s: &GlobalStatistics) -> String {
    format!(
        "Average Flow: {:.2}  Median Flow: {:.2}  Min Flow: {:.2}  Max Flow: {:.2}\n",
        s.mean, s.median, s.minimum, s.maximum
    )
}

pub fn render_series(series: &[IntervalStatistics]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:>9} {:>9} {:>9} {:>8}", "step", "avg", "min", "max", "samples");
    for s in series {
        let _ = writeln!(
            out,
            "{:<6} {:>9.2} {:>9.2} {:>9.2} {:>8}",
            s.label, s.average, s.minimum, s.maximum, s.sample_count
        );
    }
    out
}
