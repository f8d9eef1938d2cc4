//! Analysis status of a document

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where a document is in its analysis lifecycle.
///
/// ```text
/// draft --begin--> submitted --success--> completed --commit--> approved | reviewed
///                  submitted --failure--> failed --begin--> submitted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Uploaded, never analysed
    Draft,
    /// An analysis run is in flight
    Submitted,
    /// The last run finished and its result is stored
    Completed,
    /// The last run failed; a new run may be started
    Failed,
    /// A reviewer accepted the analysis
    Approved,
    /// A reviewer looked at the analysis and did not approve it
    Reviewed,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 6] = [
        DocumentStatus::Draft,
        DocumentStatus::Submitted,
        DocumentStatus::Completed,
        DocumentStatus::Failed,
        DocumentStatus::Approved,
        DocumentStatus::Reviewed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Submitted => "submitted",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Reviewed => "reviewed",
        }
    }

    /// True while an analysis run holds the document.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, DocumentStatus::Submitted)
    }

    /// True once a reviewer has committed a decision.
    pub fn is_decided(&self) -> bool {
        matches!(self, DocumentStatus::Approved | DocumentStatus::Reviewed)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown document status '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in DocumentStatus::ALL {
            assert_eq!(status.as_str().parse::<DocumentStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("pending".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&DocumentStatus::Submitted).unwrap();
        assert_eq!(json, "\"submitted\"");
    }

    #[test]
    fn only_submitted_is_in_flight() {
        let in_flight: Vec<_> = DocumentStatus::ALL
            .iter()
            .filter(|s| s.is_in_flight())
            .collect();
        assert_eq!(in_flight, vec![&DocumentStatus::Submitted]);
    }

    #[test]
    fn only_committed_reviews_are_decided() {
        let decided: Vec<_> = DocumentStatus::ALL
            .iter()
            .filter(|s| s.is_decided())
            .collect();
        assert_eq!(
            decided,
            vec![&DocumentStatus::Approved, &DocumentStatus::Reviewed]
        );
    }
}
