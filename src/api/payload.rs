//! Boundary types for backend payloads.
//!
//! Everything the backend sends is untyped JSON. It is coerced here, once,
//! into [`FetchBody`] and [`RawMetricRow`]; nothing past this module looks at
//! `serde_json::Value`.

use log::debug;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// A single measurement cell as delivered by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Empty,
}

impl MetricValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(MetricValue::Empty),
            Value::Number(n) => Some(MetricValue::Number(n.as_f64().unwrap_or(0.0))),
            Value::String(s) => Some(MetricValue::Text(s.clone())),
            Value::Bool(b) => Some(MetricValue::Text(b.to_string())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Numeric reading of the cell. Anything that does not parse is `0`.
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Number(n) if n.is_finite() => *n,
            MetricValue::Text(s) => s
                .trim()
                .trim_end_matches('%')
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

impl Display for MetricValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => write!(f, "{}", s),
            MetricValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Text(s.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(s: String) -> Self {
        MetricValue::Text(s)
    }
}

impl From<f64> for MetricValue {
    fn from(n: f64) -> Self {
        MetricValue::Number(n)
    }
}

/// Backend-shaped metric record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMetricRow {
    pub kpi: String,
    /// Year the row belongs to, present on monthly trend rows.
    pub year: Option<String>,
    /// Measurement fields in payload order.
    pub values: Vec<(String, MetricValue)>,
    /// Expandable sub-rows.
    pub drill_down: Vec<RawMetricRow>,
}

impl RawMetricRow {
    pub fn new(kpi: impl Into<String>) -> Self {
        Self {
            kpi: kpi.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.values.push((name.into(), value.into()));
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_drill_down(mut self, rows: Vec<RawMetricRow>) -> Self {
        self.drill_down = rows;
        self
    }

    pub fn value(&self, name: &str) -> Option<&MetricValue> {
        self.values
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    fn from_json(value: &Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            debug!("Skipping non-object metric row: {}", value);
            return None;
        };

        let mut row = RawMetricRow::default();
        for (name, field) in fields {
            match name.as_str() {
                "kpi" => row.kpi = json_text(field),
                "year" => row.year = Some(json_text(field)).filter(|y| !y.is_empty()),
                "drillDown" => row.drill_down = rows_from_json(field),
                _ => {
                    if let Some(value) = MetricValue::from_json(field) {
                        row.values.push((name.clone(), value));
                    }
                }
            }
        }
        Some(row)
    }
}

/// "Last refreshed" stamp reported by the non-functional metrics endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRefresh {
    pub date: String,
    pub time: Option<String>,
}

impl Display for LastRefresh {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.time {
            Some(time) => write!(f, "{} {}", self.date, time),
            None => write!(f, "{}", self.date),
        }
    }
}

/// Coerced response of one fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchBody {
    pub rows: Vec<RawMetricRow>,
    pub last_refresh: Option<LastRefresh>,
}

impl FetchBody {
    pub fn from_rows(rows: Vec<RawMetricRow>) -> Self {
        Self {
            rows,
            last_refresh: None,
        }
    }

    /// Coerces a response envelope. Tolerates `null`, a missing `body`, an
    /// array body and an object body; never fails.
    pub fn from_json(envelope: &Value) -> Self {
        match envelope {
            Value::Object(fields) => match fields.get("body") {
                Some(body) => Self::from_body(body),
                None => Self::default(),
            },
            Value::Array(_) => Self::from_body(envelope),
            _ => Self::default(),
        }
    }

    fn from_body(body: &Value) -> Self {
        match body {
            Value::Array(_) => Self::from_rows(rows_from_json(body)),
            Value::Object(fields) => Self {
                rows: ["metrics", "data", "rows"]
                    .iter()
                    .find_map(|name| fields.get(*name))
                    .map(rows_from_json)
                    .unwrap_or_default(),
                last_refresh: last_refresh_from(fields),
            },
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn last_refresh_from(fields: &Map<String, Value>) -> Option<LastRefresh> {
    let date = fields
        .get("lastRefreshDate")
        .map(json_text)
        .filter(|d| !d.is_empty())?;
    let time = fields
        .get("lastUpdatedTime")
        .map(json_text)
        .filter(|t| !t.is_empty());
    Some(LastRefresh { date, time })
}

fn rows_from_json(value: &Value) -> Vec<RawMetricRow> {
    match value {
        Value::Array(items) => items.iter().filter_map(RawMetricRow::from_json).collect(),
        _ => Vec::new(),
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Ordered query parameters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RequestParams(Vec<(String, String)>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Sets `name`, replacing an existing value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(pair) => pair.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.0
    }
}
