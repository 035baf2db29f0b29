//! Traffic condition classification.

use serde::Serialize;

use crate::aggregate::GlobalStatistics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficCondition {
    VeryLight,
    Light,
    Moderate,
    Heavy,
    VeryHeavy,
}

impl TrafficCondition {
    pub const ALL: [TrafficCondition; 5] = [
        TrafficCondition::VeryLight,
        TrafficCondition::Light,
        TrafficCondition::Moderate,
        TrafficCondition::Heavy,
        TrafficCondition::VeryHeavy,
    ];

    /// Classify a global mean flow. Lower bounds are inclusive, upper
    /// bounds exclusive. NaN falls into the class of 0.
    pub fn classify(mean: f64) -> Self {
        let mean = if mean.is_nan() { 0.0 } else { mean };
        if mean < -1.0 {
            TrafficCondition::VeryLight
        } else if mean < 0.0 {
            TrafficCondition::Light
        } else if mean < 0.5 {
            TrafficCondition::Moderate
        } else if mean < 1.0 {
            TrafficCondition::Heavy
        } else {
            TrafficCondition::VeryHeavy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrafficCondition::VeryLight => "Very Light",
            TrafficCondition::Light => "Light",
            TrafficCondition::Moderate => "Moderate",
            TrafficCondition::Heavy => "Heavy",
            TrafficCondition::VeryHeavy => "Very Heavy",
        }
    }

    /// Display color as a hex RGB string.
    pub fn color(&self) -> &'static str {
        match self {
            TrafficCondition::VeryLight => "#48bb78",
            TrafficCondition::Light => "#38a169",
            TrafficCondition::Moderate => "#ed8936",
            TrafficCondition::Heavy => "#f56565",
            TrafficCondition::VeryHeavy => "#e53e3e",
        }
    }

    pub fn is_favorable(&self) -> bool {
        matches!(self, TrafficCondition::VeryLight | TrafficCondition::Light)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    FavorableToTravel,
    ConsiderAlternatives,
}

impl Recommendation {
    pub fn for_condition(condition: TrafficCondition) -> Self {
        if condition.is_favorable() {
            Recommendation::FavorableToTravel
        } else {
            Recommendation::ConsiderAlternatives
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::FavorableToTravel => "it's a great time to travel!",
            Recommendation::ConsiderAlternatives => {
                "you might want to consider alternative times or routes."
            }
        }
    }
}

/// Classified view of a forecast summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub condition: TrafficCondition,
    pub recommendation: Recommendation,
    pub mean: f64,
}

impl Assessment {
    pub fn from_summary(summary: &GlobalStatistics) -> Self {
        let condition = TrafficCondition::classify(summary.mean);
        Self {
            condition,
            recommendation: Recommendation::for_condition(condition),
            mean: summary.mean,
        }
    }

    /// Plain-language sentence for an operator. `routes` is `None` when
    /// the route count is unknown.
    pub fn explanation(&self, horizon_minutes: u64, routes: Option<u32>) -> String {
        let scope = match routes {
            Some(n) => format!("{} major routes", n),
            None => "all monitored routes".to_string(),
        };
        format!(
            "Over the next {} minutes, traffic across {} is expected to be {}.",
            horizon_minutes,
            scope,
            self.condition.label().to_lowercase()
        )
    }

    pub fn advice(&self) -> String {
        format!("Current conditions suggest {}", self.recommendation.message())
    }
}
