//! API response type definitions.

use serde::Deserialize;
use serde_json::Value;

/// OAuth client-credentials exchange response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Paginated listing envelope shared by the friends and gallery endpoints.
#[derive(Debug, Deserialize)]
pub struct PageResponse<T> {
    pub results: Vec<T>,
    pub has_more: bool,
    #[serde(default)]
    pub next_offset: Option<u64>,
}

/// Entry of the followed-creators listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FriendEntry {
    pub user: UserInfo,
}

/// Minimal user record.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub username: String,
}

/// A gallery item.
#[derive(Debug, Clone, Deserialize)]
pub struct Deviation {
    #[serde(rename = "deviationid")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub premium_content: Option<Value>,
    #[serde(default)]
    pub premium_folder_data: Option<Value>,
    #[serde(default)]
    pub is_downloadable: Option<bool>,
    #[serde(default)]
    pub content: Option<DeviationContent>,
}

/// Downloadable content reference of a gallery item.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviationContent {
    #[serde(default)]
    pub src: Option<String>,
}

impl Deviation {
    /// Title used in sidecars and the ledger.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("untitled")
    }

    /// Canonical page URL, empty when the listing omitted it.
    pub fn page_url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    /// Direct asset URL if the item carries a fetchable one.
    pub fn content_src(&self) -> Option<&str> {
        self.content
            .as_ref()
            .and_then(|c| c.src.as_deref())
            .filter(|src| !src.is_empty())
    }

    /// Whether the item is premium/locked or lacks a fetchable asset.
    pub fn is_restricted(&self) -> bool {
        is_truthy(self.premium_content.as_ref())
            || is_truthy(self.premium_folder_data.as_ref())
            || self.is_downloadable == Some(false)
            || self.content_src().is_none()
    }
}

/// JSON truthiness: null, false, 0, "" and empty containers are false.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Deviation metadata response.
#[derive(Debug, Deserialize)]
pub struct MetadataResponse {
    #[serde(default)]
    pub metadata: Vec<DeviationMetadata>,
}

/// Metadata for one deviation.
#[derive(Debug, Deserialize)]
pub struct DeviationMetadata {
    #[serde(default)]
    pub deviationid: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Tag entry.
#[derive(Debug, Deserialize)]
pub struct Tag {
    pub tag_name: String,
}

impl MetadataResponse {
    /// Tag names of the entry for `id`, falling back to the first entry.
    pub fn tags_for(&self, id: &str) -> Vec<String> {
        self.metadata
            .iter()
            .find(|m| m.deviationid.as_deref() == Some(id))
            .or_else(|| self.metadata.first())
            .map(|m| m.tags.iter().map(|t| t.tag_name.clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Deviation {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_free_item_is_not_restricted() {
        let item = parse(
            r#"{"deviationid":"d1","title":"Sunset","premium_content":false,
                "content":{"src":"http://x/img"}}"#,
        );
        assert!(!item.is_restricted());
        assert_eq!(item.content_src(), Some("http://x/img"));
        assert_eq!(item.display_title(), "Sunset");
    }

    #[test]
    fn test_restriction_markers() {
        assert!(parse(r#"{"deviationid":"a","premium_content":true,"content":{"src":"s"}}"#)
            .is_restricted());
        assert!(parse(
            r#"{"deviationid":"b","premium_folder_data":{"type":"paid"},"content":{"src":"s"}}"#
        )
        .is_restricted());
        assert!(parse(r#"{"deviationid":"c","is_downloadable":false,"content":{"src":"s"}}"#)
            .is_restricted());
        assert!(parse(r#"{"deviationid":"d"}"#).is_restricted());
        assert!(parse(r#"{"deviationid":"e","content":{}}"#).is_restricted());
        assert!(parse(r#"{"deviationid":"f","content":{"src":""}}"#).is_restricted());
    }

    #[test]
    fn test_empty_folder_data_is_not_a_marker() {
        let item = parse(
            r#"{"deviationid":"g","premium_folder_data":null,"is_downloadable":true,
                "content":{"src":"s"}}"#,
        );
        assert!(!item.is_restricted());
    }

    #[test]
    fn test_missing_identity_is_rejected() {
        let result: std::result::Result<Deviation, _> =
            serde_json::from_str(r#"{"title":"no id"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_page_requires_continuation_flag() {
        let result: std::result::Result<PageResponse<FriendEntry>, _> =
            serde_json::from_str(r#"{"results":[]}"#);
        assert!(result.is_err());

        let page: PageResponse<FriendEntry> = serde_json::from_str(
            r#"{"results":[{"user":{"username":"alice"}}],"has_more":true,"next_offset":24}"#,
        )
        .unwrap();
        assert_eq!(page.results[0].user.username, "alice");
        assert_eq!(page.next_offset, Some(24));
    }

    #[test]
    fn test_metadata_tags() {
        let meta: MetadataResponse = serde_json::from_str(
            r#"{"metadata":[{"deviationid":"d1","tags":[{"tag_name":"landscape"},{"tag_name":"sky"}]}]}"#,
        )
        .unwrap();
        assert_eq!(meta.tags_for("d1"), vec!["landscape", "sky"]);

        let empty: MetadataResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.tags_for("d1").is_empty());
    }
}
