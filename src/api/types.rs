//! Wire types for the DocChat backend API
//!
//! These mirror the JSON bodies the backend sends and accepts. Fields the
//! backend may omit or send as `null` are modelled as `Option` or use
//! [`null_as_default`] so a sparse payload still deserializes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Deserialize `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Opaque, server-assigned chat session identifier.
///
/// The backend returns ids as strings (`"42"`) on some routes and numbers
/// (`42`) on others; both decode into the same value and the id is always
/// re-serialized as a string.
///
/// # Examples
///
/// ```
/// use docchat::api::types::SessionId;
///
/// let a: SessionId = serde_json::from_str("42").unwrap();
/// let b: SessionId = serde_json::from_str("\"42\"").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text as used in URL paths.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => SessionId(s),
            RawId::Int(n) => SessionId(n.to_string()),
            RawId::Unsigned(n) => SessionId(n.to_string()),
        })
    }
}

/// A reference to a source document supporting an answer.
///
/// `page` is zero-based on the wire; use [`Citation::display_page`] for the
/// number shown to people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Source path or label recorded at ingestion time
    #[serde(default)]
    pub source: Option<String>,
    /// Zero-based page number, when the loader recorded one
    #[serde(default)]
    pub page: Option<u32>,
    /// Snippet of the retrieved chunk
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Original file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// File extension, e.g. `.pdf`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl Citation {
    /// One-based page number for display.
    pub fn display_page(&self) -> Option<u32> {
        self.page.map(|p| p.saturating_add(1))
    }

    /// Best available human label: file name, then source, then a fallback.
    pub fn label(&self) -> &str {
        self.filename
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.source.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("unknown source")
    }
}

/// One persisted query/answer pair from `GET /chat/history/{id}`.
///
/// `query` and `answer` stay optional so that a malformed entry can be
/// rendered as unavailable instead of failing the whole history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub citations: Vec<Citation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

/// Body of `GET /chat/history/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistory {
    pub id: SessionId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<HistoryEntry>,
}

/// Body of `POST /chat/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewChatResponse {
    pub id: SessionId,
}

/// Body sent to `POST /chat/{id}/message`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<&'a str>,
}

/// Body of `POST /chat/{id}/message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
}

/// Element of `GET /chat/all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: SessionId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(default)]
    pub message_count: u64,
}

/// Body sent to `PATCH /chat/{id}/title`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateTitleRequest<'a> {
    pub title: &'a str,
}

// ---------------------------------------------------------------------------
// Auth and users
// ---------------------------------------------------------------------------

/// Body of `POST /auth/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// A user account as returned by `/auth/me` and `/admin/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Body sent to `POST /admin/users`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
    pub is_active: bool,
}

/// Body sent to `PUT /admin/users/{id}`; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

impl UserUpdate {
    /// Returns `true` when no field would be changed.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Body of `GET /admin/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_documents: u64,
    /// Bytes
    #[serde(default)]
    pub total_storage: u64,
}

impl DashboardStats {
    /// Storage in megabytes with two decimals, e.g. `"1.50 MB"`.
    pub fn storage_mb(&self) -> String {
        format!("{:.2} MB", self.total_storage as f64 / (1024.0 * 1024.0))
    }
}

// ---------------------------------------------------------------------------
// File system
// ---------------------------------------------------------------------------

/// Kind of entry in a folder listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    /// Path segment used by the delete routes (`files` / `folders`).
    pub fn route_segment(self) -> &'static str {
        match self {
            ItemKind::File => "files",
            ItemKind::Folder => "folders",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::File => f.write_str("file"),
            ItemKind::Folder => f.write_str("folder"),
        }
    }
}

/// Element of `GET /files/browse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSystemItem {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub file_type: Option<String>,
}

/// Body of `GET /files/folders/{id}` and `POST /files/folders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

/// Body sent to `POST /files/folders`.
#[derive(Debug, Clone, Serialize)]
pub struct FolderCreate<'a> {
    pub name: &'a str,
    pub parent_id: Option<i64>,
}

/// Body of `POST /files/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

/// Body and name of a downloaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_id_accepts_string_and_number() {
        let from_num: SessionId = serde_json::from_value(json!(42)).unwrap();
        let from_str: SessionId = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(from_num, from_str);
        assert_eq!(serde_json::to_value(&from_num).unwrap(), json!("42"));
    }

    #[test]
    fn test_citation_display_page_is_one_based() {
        let c: Citation =
            serde_json::from_value(json!({"source": "doc.pdf", "page": 2, "content": "x"}))
                .unwrap();
        assert_eq!(c.display_page(), Some(3));
        assert_eq!(c.label(), "doc.pdf");
    }

    #[test]
    fn test_citation_tolerates_nulls() {
        let c: Citation =
            serde_json::from_value(json!({"source": null, "page": null, "content": null}))
                .unwrap();
        assert_eq!(c.display_page(), None);
        assert_eq!(c.content, "");
        assert_eq!(c.label(), "unknown source");
    }

    #[test]
    fn test_citation_label_prefers_filename() {
        let c: Citation = serde_json::from_value(json!({
            "filename": "handbook.pdf",
            "source": "uploads/3/handbook.pdf",
            "page": 0,
            "content": "intro"
        }))
        .unwrap();
        assert_eq!(c.label(), "handbook.pdf");
    }

    #[test]
    fn test_history_entry_missing_fields() {
        let entry: HistoryEntry =
            serde_json::from_value(json!({"answer": "only answer", "citations": null})).unwrap();
        assert!(entry.query.is_none());
        assert_eq!(entry.answer.as_deref(), Some("only answer"));
        assert!(entry.citations.is_empty());
        assert_eq!(entry.created_at, "");
    }

    #[test]
    fn test_message_request_omits_missing_collection() {
        let body = MessageRequest {
            message: "hi",
            collection_name: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"message": "hi"}));
    }

    #[test]
    fn test_dashboard_stats_camel_case() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "totalUsers": 3,
            "totalDocuments": 12,
            "totalStorage": 1572864
        }))
        .unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.storage_mb(), "1.50 MB");
    }

    #[test]
    fn test_user_update_skips_unset_fields() {
        let update = UserUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"is_active": false})
        );
        assert!(UserUpdate::default().is_empty());
    }

    #[test]
    fn test_file_system_item_kind() {
        let item: FileSystemItem = serde_json::from_value(json!({
            "id": 7,
            "name": "reports",
            "type": "folder",
            "created_at": "2024-05-01T10:00:00",
            "updated_at": "2024-05-01T10:00:00",
            "parent_id": null
        }))
        .unwrap();
        assert_eq!(item.kind, ItemKind::Folder);
        assert_eq!(item.kind.route_segment(), "folders");
        assert!(item.size.is_none());
    }
}
