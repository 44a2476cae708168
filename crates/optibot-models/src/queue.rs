//! Queue items: unclaimed units of encoding work.

use serde::{Deserialize, Serialize};

use crate::media::MediaKind;

/// An unclaimed unit of work handed out by the queue service. Created by an
/// upstream system; deleted by the agent once ownership has been transferred
/// to a durable [`crate::WorkItem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: i64,
    pub media_kind: MediaKind,
    pub media_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_format() {
        let json = r#"{"id": 3, "mediaKind": "movie", "mediaId": 42}"#;
        let item: QueueItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, 3);
        assert_eq!(item.media_kind, MediaKind::Movie);
        assert_eq!(item.media_id, 42);
    }
}
