//! Core data types for parsed protocol responses.

use std::fmt;

/// A stat value, tagged as integer or float at parse time so downstream
/// code never re-parses the textual form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Int(u64),
    Float(f64),
}

impl StatValue {
    /// Parse a decimal stat value. Text with a `.` becomes a float,
    /// everything else an integer. The protocol only emits non-negative
    /// decimals.
    pub fn parse(text: &str) -> Option<Self> {
        if text.contains('.') {
            text.parse::<f64>().ok().map(StatValue::Float)
        } else {
            text.parse::<u64>().ok().map(StatValue::Int)
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            StatValue::Int(v) => *v as f64,
            StatValue::Float(v) => *v,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Int(v) => write!(f, "{v}"),
            // Whole-number floats keep a fractional digit so the text
            // stays float-shaped ("50.0", not "50").
            StatValue::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{v:.1}"),
            StatValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Ordered stat-name → value mapping, as returned by one `stats`
/// response. Keys are unique within one response; `insert` replaces an
/// existing entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStats(Vec<(String, StatValue)>);

impl RawStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&StatValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: StatValue) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<StatValue> {
        let pos = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, StatValue)> for RawStats {
    fn from_iter<I: IntoIterator<Item = (String, StatValue)>>(iter: I) -> Self {
        let mut stats = RawStats::new();
        for (name, value) in iter {
            stats.insert(name, value);
        }
        stats
    }
}

/// One key listed by `stats cachedump`: name, stored size, expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDetail {
    pub key: String,
    pub size: u64,
    pub expires: u64,
}
