//! History records for completed and failed jobs.

use serde::{Deserialize, Serialize};

use crate::media::MediaKind;

/// Write-once audit record created at the terminal state of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub media_id: i64,
    pub media_kind: MediaKind,
    pub encoding_agent: String,
    pub status: String,
}

impl HistoryItem {
    pub fn new(
        media_id: i64,
        media_kind: MediaKind,
        encoding_agent: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            media_id,
            media_kind,
            encoding_agent: encoding_agent.into(),
            status: status.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let item = HistoryItem::new(42, MediaKind::Movie, "encoder-1", "Completed");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["mediaId"], 42);
        assert_eq!(json["mediaKind"], "movie");
        assert_eq!(json["encodingAgent"], "encoder-1");
        assert_eq!(json["status"], "Completed");
    }
}
