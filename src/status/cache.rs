use std::collections::HashMap;

use sha1::{Digest, Sha1};

use crate::model::report_model::{TestRecord, TestStatus};
use crate::status::resolver::effective_status;

/// Fingerprint of the fields that take part in classification.
///
/// Two records with the same fingerprint always resolve to the same
/// effective status; descriptive fields (name, duration, steps...) are
/// not part of it.
pub fn classification_fingerprint(test: &TestRecord) -> String {
    let mut hasher = Sha1::new();
    hasher.update(test.status.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(test.outcome.map(|o| o.as_str()).unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(test.final_status.map(|s| s.as_str()).unwrap_or("").as_bytes());
    for attempt in &test.retry_history {
        hasher.update(b"|");
        hasher.update(attempt.status.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Memoised effective-status lookups keyed by classification fingerprint.
#[derive(Debug, Default)]
pub struct StatusCache {
    entries: HashMap<String, TestStatus>,
    hits: usize,
    misses: usize,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, test: &TestRecord) -> TestStatus {
        let key = classification_fingerprint(test);
        if let Some(status) = self.entries.get(&key) {
            self.hits += 1;
            return *status;
        }
        self.misses += 1;
        let status = effective_status(test);
        self.entries.insert(key, status);
        status
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
