//! Tolerant decoding of the nested forecast tensor.
//!
//! The prediction service emits `predictions[interval][route]` where each
//! route entry is either a bare number or a list of channel values. Nothing
//! about that shape is guaranteed, so the payload is decoded into a small
//! tagged union and samples are pulled out with total functions that skip
//! whatever does not look numeric.

use serde::Deserialize;
use serde_json::Value;

/// Leaf value of the forecast tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
    /// JSON objects carry no usable value; their contents are not kept.
    Object,
}

impl Scalar {
    /// Parse a leaf into a sample. Strings go through a float-prefix parse,
    /// so `"0.75"` and `"0.75 veh"` both yield 0.75. Non-finite results are
    /// rejected along with everything that is not a number or a string.
    pub fn parse_sample(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => finite(*n),
            Scalar::Text(s) => parse_float_prefix(s),
            Scalar::Bool(_) | Scalar::Null | Scalar::Object => None,
        }
    }
}

/// One node of the decoded forecast: a scalar or a sequence of nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<Node>),
}

impl Node {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Node::Sequence(items.iter().map(Node::from_value).collect()),
            Value::Number(n) => match n.as_f64() {
                Some(f) => Node::Scalar(Scalar::Number(f)),
                None => Node::Scalar(Scalar::Null),
            },
            Value::String(s) => Node::Scalar(Scalar::Text(s.clone())),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(*b)),
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Object(_) => Node::Scalar(Scalar::Object),
        }
    }

    /// Samples of one interval. An interval that is not a sequence has none.
    pub fn interval_samples(&self) -> Vec<f64> {
        match self {
            Node::Sequence(routes) => routes.iter().flat_map(|r| r.route_samples()).collect(),
            Node::Scalar(_) => Vec::new(),
        }
    }

    /// Samples of one route entry. Channel lists are read one level deep;
    /// a bare route value must already be a JSON number.
    fn route_samples(&self) -> Vec<f64> {
        match self {
            Node::Sequence(channels) => channels.iter().filter_map(Node::leaf_sample).collect(),
            Node::Scalar(Scalar::Number(n)) => finite(*n).into_iter().collect(),
            Node::Scalar(_) => Vec::new(),
        }
    }

    // Third nesting level and below is discarded.
    fn leaf_sample(&self) -> Option<f64> {
        match self {
            Node::Scalar(s) => s.parse_sample(),
            Node::Sequence(_) => None,
        }
    }
}

/// Raw forecast as returned by the prediction service, one node per interval.
///
/// Deserializes from any JSON value; a top level that is not an array
/// decodes to a forecast with no intervals.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub struct RawForecast {
    intervals: Vec<Node>,
}

impl RawForecast {
    pub fn new(intervals: Vec<Node>) -> Self {
        Self { intervals }
    }

    pub fn intervals(&self) -> &[Node] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl From<Value> for RawForecast {
    fn from(value: Value) -> Self {
        RawForecast::from(&value)
    }
}

impl From<&Value> for RawForecast {
    fn from(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::new(items.iter().map(Node::from_value).collect()),
            _ => Self::default(),
        }
    }
}

fn finite(n: f64) -> Option<f64> {
    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

/// Parse the longest leading decimal literal of `s`, after leading
/// whitespace. Returns `None` when no digits are found or the value is
/// not finite.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    t[..end].parse::<f64>().ok().and_then(finite)
}
