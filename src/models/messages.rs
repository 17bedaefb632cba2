//! Protobuf message types stored through the cache
//!
//! These are hand-written prost messages rather than generated code; the
//! wire format is plain proto3. `SignPackage` also serializes to camelCase
//! JSON because it is handed to browser clients as-is.

use serde::Serialize;

/// Signature payload consumed by the WeChat JS-SDK `wx.config` call.
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPackage {
    /// Public application id
    #[prost(string, tag = "1")]
    pub app_id: String,
    /// Random nonce mixed into the signature
    #[prost(string, tag = "2")]
    pub nonce_str: String,
    /// Unix timestamp (seconds) at signing time
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
    /// The exact URL the signature covers
    #[prost(string, tag = "4")]
    pub url: String,
    /// Lowercase hex SHA-1 over the canonical signing string
    #[prost(string, tag = "5")]
    pub signature: String,
}

/// Page listing for one remote media resource.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PageList {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<PageItem>,
}

/// One page (part) of a multi-part media resource.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PageItem {
    /// Remote content id, also the attachment cache key
    #[prost(uint32, tag = "1")]
    pub id: u32,
    /// 1-based position within the resource
    #[prost(uint32, tag = "2")]
    pub index: u32,
    #[prost(string, tag = "3")]
    pub title: String,
    #[prost(uint32, tag = "4")]
    pub duration_secs: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_sign_package_wire_roundtrip() {
        let package = SignPackage {
            app_id: "wx0123456789abcdef".to_string(),
            nonce_str: "abcXYZ".to_string(),
            timestamp: 1414587457,
            url: "https://example.com/video?id=1".to_string(),
            signature: "0f9de62fce790f9a083d5c99e95740ceb90c27ed".to_string(),
        };

        let bytes = package.encode_to_vec();
        let decoded = SignPackage::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, package);
    }

    #[test]
    fn test_sign_package_serializes_camel_case() {
        let package = SignPackage {
            app_id: "wx123".to_string(),
            nonce_str: "nonce".to_string(),
            timestamp: 1,
            url: "u".to_string(),
            signature: "s".to_string(),
        };

        let json = serde_json::to_string(&package).unwrap();
        assert!(json.contains("\"appId\""));
        assert!(json.contains("\"nonceStr\""));
        assert!(json.contains("\"timestamp\""));
        assert!(json.contains("\"signature\""));
        assert!(!json.contains("app_id"));
    }

    #[test]
    fn test_page_list_wire_roundtrip() {
        let list = PageList {
            items: vec![
                PageItem {
                    id: 170001,
                    index: 1,
                    title: "Opening".to_string(),
                    duration_secs: 312,
                },
                PageItem {
                    id: 170002,
                    index: 2,
                    title: "Part two".to_string(),
                    duration_secs: 1048,
                },
            ],
        };

        let bytes = list.encode_to_vec();
        let decoded = PageList::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, list);
    }

    #[test]
    fn test_default_messages_encode_empty() {
        // An all-default message has no wire presence, which the cache
        // treats as an unavailable value
        assert!(PageList::default().encode_to_vec().is_empty());
        assert!(SignPackage::default().encode_to_vec().is_empty());
    }
}
