//! Per-interval series and global statistics over a raw forecast.
//!
//! Every function here is pure and total. Empty input of any kind falls
//! through to zero-valued statistics; no infinities and no NaN ever leave
//! this module.

use serde::Serialize;

use crate::forecast::RawForecast;
use crate::logging::{log, obj, v_num, Domain, Level, ProfileScope};
use serde_json::json;

/// Running min/max/sum over one interval's samples.
#[derive(Debug, Clone, Default)]
pub struct IntervalAccumulator {
    sum: f64,
    // Incremental mean, used when `sum` leaves the finite range.
    mean: f64,
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl IntervalAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sample: f64) {
        self.sum += sample;
        self.count += 1;
        self.mean = step_mean(self.mean, sample, self.count);
        self.min = Some(self.min.map_or(sample, |m| m.min(sample)));
        self.max = Some(self.max.map_or(sample, |m| m.max(sample)));
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else if self.sum.is_finite() {
            self.sum / self.count as f64
        } else {
            self.mean
        }
    }

    /// Close the interval. Missing extremes become 0.
    pub fn finish(&self, position: usize) -> IntervalStatistics {
        IntervalStatistics {
            label: interval_label(position),
            minimum: self.min.unwrap_or(0.0),
            maximum: self.max.unwrap_or(0.0),
            average: self.average(),
            sample_count: self.count,
        }
    }
}

/// Fold one more sample into a mean over `k` samples. Each term is scaled
/// by `1/k` before adding, so finite inputs never overflow.
fn step_mean(mean: f64, sample: f64, k: usize) -> f64 {
    let k = k as f64;
    mean + (sample / k - mean / k)
}

fn running_mean(samples: &[f64]) -> f64 {
    samples
        .iter()
        .enumerate()
        .fold(0.0, |m, (i, &x)| step_mean(m, x, i + 1))
}

/// "T+1" for the first interval, "T+2" for the second, and so on.
pub fn interval_label(position: usize) -> String {
    format!("T+{}", position + 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalStatistics {
    pub label: String,
    pub minimum: f64,
    pub maximum: f64,
    pub average: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GlobalStatistics {
    pub mean: f64,
    pub median: f64,
    pub minimum: f64,
    pub maximum: f64,
}

impl GlobalStatistics {
    /// Statistics over a pooled, unordered sample set. The median is the
    /// element at `floor(n / 2)` of the sorted samples.
    pub fn from_samples(samples: &[f64]) -> Self {
        let total: f64 = samples.iter().sum();
        Self::from_pool(samples.to_vec(), total)
    }

    fn from_pool(mut pool: Vec<f64>, total: f64) -> Self {
        if pool.is_empty() {
            return Self::default();
        }
        let n = pool.len();
        let mean = if total.is_finite() {
            total / n as f64
        } else {
            running_mean(&pool)
        };
        pool.sort_by(|a, b| a.total_cmp(b));
        Self {
            mean,
            median: pool[n / 2],
            minimum: pool[0],
            maximum: pool[n - 1],
        }
    }
}

/// Output of [`aggregate`]: the chart series and the headline summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Aggregate {
    pub series: Vec<IntervalStatistics>,
    pub summary: GlobalStatistics,
    pub sample_count: usize,
}

pub fn aggregate(raw: &RawForecast) -> Aggregate {
    let _scope = ProfileScope::start("aggregate", &[("intervals", json!(raw.len()))]);

    let mut series = Vec::with_capacity(raw.len());
    let mut pool = Vec::new();
    let mut total = 0.0;

    for (position, interval) in raw.intervals().iter().enumerate() {
        let samples = interval.interval_samples();
        let mut acc = IntervalAccumulator::new();
        for &s in &samples {
            acc.update(s);
        }
        total += acc.sum();
        series.push(acc.finish(position));
        pool.extend(samples);
    }

    let sample_count = pool.len();
    let summary = GlobalStatistics::from_pool(pool, total);
    let empty_intervals = series.iter().filter(|s| s.sample_count == 0).count();

    log(
        Level::Debug,
        Domain::Aggregate,
        "aggregated",
        obj(&[
            ("intervals", json!(series.len())),
            ("empty_intervals", json!(empty_intervals)),
            ("samples", json!(sample_count)),
            ("mean", v_num(summary.mean)),
            ("median", v_num(summary.median)),
        ]),
    );

    Aggregate {
        series,
        summary,
        sample_count,
    }
}
