use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `StatusReply::status` value meaning the content is already stored
pub const STATUS_STORED: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetStatus,
    UploadBlock,
    Merge,
    Stop,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::GetStatus => "file/getStatus",
            Endpoint::UploadBlock => "file/uploadBlock",
            Endpoint::Merge => "file/merge",
            Endpoint::Stop => "file/stop",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    FormUrlEncoded,
    FormData,
    Json,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded;charset=UTF-8",
            ContentType::FormData => "multipart/form-data;charset=UTF-8",
            ContentType::Json => "application/json;charset=UTF-8",
        }
    }
}

/// Per-request hints for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestOptions {
    pub content_type: ContentType,
}

impl RequestOptions {
    /// Binary body, used for chunk uploads.
    pub fn multipart() -> Self {
        Self {
            content_type: ContentType::FormData,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "fileHashCode")]
    pub file_hash: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    pub status: i32,
    /// Final file id when stored, otherwise the newly allocated transfer id.
    #[serde(rename = "fileId")]
    pub file_id: String,
}

impl StatusReply {
    pub fn is_stored(&self) -> bool {
        self.status == STATUS_STORED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkUpload {
    #[serde(rename = "transferId")]
    pub transfer_id: String,
    #[serde(rename = "fileHashCode")]
    pub file_hash: String,
    /// 1-based
    #[serde(rename = "blockNum")]
    pub block_num: u32,
    #[serde(rename = "blockHashCode")]
    pub block_hash: String,
    /// Sent as the multipart file part, never as a form field.
    #[serde(skip)]
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    #[serde(rename = "transferId")]
    pub transfer_id: String,
    #[serde(rename = "fileHashCode")]
    pub file_hash: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortRequest {
    #[serde(rename = "transferId")]
    pub transfer_id: String,
    #[serde(rename = "fileHashCode")]
    pub file_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let upload = ChunkUpload {
            transfer_id: "t-1".into(),
            file_hash: "abc".into(),
            block_num: 3,
            block_hash: "def".into(),
            data: Bytes::from_static(b"payload"),
        };
        let json = serde_json::to_value(&upload).unwrap();
        assert_eq!(json["transferId"], "t-1");
        assert_eq!(json["fileHashCode"], "abc");
        assert_eq!(json["blockNum"], 3);
        assert_eq!(json["blockHashCode"], "def");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_status_reply_parsing() {
        let stored: StatusReply = serde_json::from_str(r#"{"status":1,"fileId":"f-9"}"#).unwrap();
        assert!(stored.is_stored());

        let fresh: StatusReply = serde_json::from_str(r#"{"status":0,"fileId":"t-2"}"#).unwrap();
        assert!(!fresh.is_stored());
        assert_eq!(fresh.file_id, "t-2");
    }

    #[test]
    fn test_options() {
        assert_eq!(RequestOptions::default().content_type, ContentType::FormUrlEncoded);
        assert_eq!(
            RequestOptions::multipart().content_type.mime(),
            "multipart/form-data;charset=UTF-8"
        );
        assert_eq!(Endpoint::UploadBlock.to_string(), "file/uploadBlock");
    }
}
