use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Free-form report data (environment blocks, attachments, retry extras)
// ============================================================================

/// Arbitrarily nested value taken verbatim from a report file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<ReportValue>),
    Map(BTreeMap<String, ReportValue>),
}

impl ReportValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ReportValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ReportValue>> {
        match self {
            ReportValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&ReportValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, ReportValue::List(_) | ReportValue::Map(_))
    }
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Null => f.write_str("-"),
            ReportValue::Bool(b) => write!(f, "{}", b),
            ReportValue::Number(n) => write!(f, "{}", n),
            ReportValue::String(s) => f.write_str(s),
            ReportValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            ReportValue::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}
