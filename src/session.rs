//! Presentation-side session: one explicit state value driven by events.
//!
//! Each trigger spawns one request task that reports back over a channel.
//! Completions are applied in arrival order, so overlapping triggers
//! resolve last-write-wins.

use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::aggregate::{aggregate, Aggregate};
use crate::client::{Confidence, Forecast, ForecastSource, ModelDescriptor, RequestFailure};
use crate::condition::Assessment;
use crate::logging::{log, log_transition, obj, v_num, v_str, Domain, Level};

/// Everything derived from one successful forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionView {
    pub scenario: Option<String>,
    pub confidence: Option<Confidence>,
    pub aggregate: Aggregate,
    pub assessment: Assessment,
}

impl PredictionView {
    pub fn from_forecast(forecast: Forecast) -> Self {
        let aggregate = aggregate(&forecast.predictions);
        let assessment = Assessment::from_summary(&aggregate.summary);
        Self {
            scenario: forecast.scenario,
            confidence: forecast.confidence,
            aggregate,
            assessment,
        }
    }

    pub fn interval_count(&self) -> usize {
        self.aggregate.series.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Pending,
    Succeeded(Box<PredictionView>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Requested,
    Completed(Result<Forecast, RequestFailure>),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Pending => "pending",
            SessionState::Succeeded(_) => "succeeded",
            SessionState::Failed(_) => "failed",
        }
    }

    /// Pure transition. A new request always clears the previous outcome;
    /// a completion always replaces whatever is current.
    pub fn apply(self, event: SessionEvent) -> SessionState {
        match event {
            SessionEvent::Requested => SessionState::Pending,
            SessionEvent::Completed(Ok(forecast)) => {
                SessionState::Succeeded(Box::new(PredictionView::from_forecast(forecast)))
            }
            SessionEvent::Completed(Err(failure)) => SessionState::Failed(failure.to_string()),
        }
    }

    pub fn view(&self) -> Option<&PredictionView> {
        match self {
            SessionState::Succeeded(view) => Some(view.as_ref()),
            _ => None,
        }
    }
}

pub struct Session<S> {
    source: Arc<S>,
    state: SessionState,
    model: Option<ModelDescriptor>,
    in_flight: usize,
    tx: UnboundedSender<SessionEvent>,
    rx: UnboundedReceiver<SessionEvent>,
}

impl<S: ForecastSource + 'static> Session<S> {
    pub fn new(source: Arc<S>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            source,
            state: SessionState::Idle,
            model: None,
            in_flight: 0,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn model(&self) -> Option<&ModelDescriptor> {
        self.model.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Fetch model metadata once. Failure is logged and otherwise ignored.
    pub async fn load_model_info(&mut self) -> Option<&ModelDescriptor> {
        match self.source.model_info().await {
            Ok(info) => {
                log(
                    Level::Info,
                    Domain::Session,
                    "model_info",
                    obj(&[
                        ("model", v_str(&info.name)),
                        ("loaded", json!(info.is_loaded)),
                        ("routes", json!(info.parameters.route_count)),
                        ("horizon", json!(info.parameters.prediction_horizon)),
                    ]),
                );
                self.model = Some(info);
            }
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Session,
                    "model_info_failed",
                    obj(&[("msg", v_str(&err.to_string()))]),
                );
            }
        }
        self.model.as_ref()
    }

    /// Issue one forecast request. Must be called from within a tokio runtime.
    pub fn trigger(&mut self) {
        self.dispatch(SessionEvent::Requested);
        self.in_flight += 1;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = source.request_forecast().await;
            let _ = tx.send(SessionEvent::Completed(outcome));
        });
    }

    /// Wait for the next request to complete and apply it. Returns at once
    /// when nothing is in flight.
    pub async fn next_completion(&mut self) -> &SessionState {
        if self.in_flight > 0 {
            if let Some(event) = self.rx.recv().await {
                self.in_flight -= 1;
                self.dispatch(event);
            }
        }
        &self.state
    }

    /// Trigger and wait for that request.
    pub async fn run_once(&mut self) -> &SessionState {
        self.trigger();
        self.next_completion().await
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let from = self.state.name();
        let prev = std::mem::replace(&mut self.state, SessionState::Idle);
        self.state = prev.apply(event);
        log_transition(from, self.state.name());

        match &self.state {
            SessionState::Succeeded(view) => log(
                Level::Info,
                Domain::Classify,
                "assessed",
                obj(&[
                    ("condition", v_str(view.assessment.condition.label())),
                    ("mean", v_num(view.assessment.mean)),
                    ("samples", json!(view.aggregate.sample_count)),
                    ("intervals", json!(view.interval_count())),
                ]),
            ),
            SessionState::Failed(msg) => log(
                Level::Warn,
                Domain::Session,
                "request_failed",
                obj(&[("msg", v_str(msg))]),
            ),
            SessionState::Idle | SessionState::Pending => {}
        }
    }
}
