use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Asks the server whether content with this hash is already stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub file_hash: String,
    pub file_name: String,
    pub file_size: u64,
}

/// Asks the server to assemble the final file from uploaded chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub file_hash: String,
    pub file_name: String,
    pub size: u64,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Existence-check answer. `uploaded == true` means no bytes need to be sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub uploaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Merge acknowledgement.
///
/// Servers vary in what they return here; only the HTTP status is significant,
/// so every field is optional and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_request_field_names() {
        let req = CheckRequest {
            file_hash: "ab12".into(),
            file_name: "movie.mp4".into(),
            file_size: 5_000_000,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["fileHash"], "ab12");
        assert_eq!(json["fileName"], "movie.mp4");
        assert_eq!(json["fileSize"], 5_000_000);
    }

    #[test]
    fn merge_request_field_names() {
        let req = MergeRequest {
            file_hash: "ab12".into(),
            file_name: "movie.mp4".into(),
            size: 10,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"fileHash":"ab12","fileName":"movie.mp4","size":10}"#);
    }

    #[test]
    fn check_response_without_message() {
        let resp: CheckResponse = serde_json::from_str(r#"{"uploaded":false}"#).unwrap();
        assert!(!resp.uploaded);
        assert!(resp.message.is_none());
    }

    #[test]
    fn check_response_with_message() {
        let resp: CheckResponse =
            serde_json::from_str(r#"{"uploaded":true,"message":"file exists"}"#).unwrap();
        assert!(resp.uploaded);
        assert_eq!(resp.message.as_deref(), Some("file exists"));
    }

    #[test]
    fn merge_response_ignores_unknown_fields() {
        let resp: MergeResponse =
            serde_json::from_str(r#"{"code":0,"message":"merged","extra":[1,2]}"#).unwrap();
        assert_eq!(resp.message.as_deref(), Some("merged"));
        assert!(resp.url.is_none());
    }
}
