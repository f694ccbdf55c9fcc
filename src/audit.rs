//! Round audit log for post-hoc analysis.
//!
//! Records screening metadata about each simulated round, enabling
//! reproducibility analysis and defense-comparison studies.

use serde::{Deserialize, Serialize};

/// Metadata for a single simulated round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundAuditEntry {
    /// Round number (1-indexed; round 0 has no screening).
    pub round: u64,
    /// Number of clients generated.
    pub n_clients: usize,
    /// Number of clients rejected by the pipeline.
    pub n_rejected: usize,
    /// Rejected clients that were malicious.
    pub n_malicious_rejected: usize,
    /// Labels of the defenses that screened this round.
    pub defenses: Vec<String>,
}

/// Append-only audit log of simulated rounds.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<RoundAuditEntry>,
}

impl AuditLog {
    /// Create a new, empty audit log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry to the log.
    pub fn push(&mut self, entry: RoundAuditEntry) {
        self.entries.push(entry);
    }

    /// Get all entries.
    pub fn entries(&self) -> &[RoundAuditEntry] {
        &self.entries
    }

    /// Number of recorded rounds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serialize the audit log to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
