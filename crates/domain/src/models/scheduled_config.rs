//! Scheduled configuration entry domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::{Page, PageRequest, PaginationError};
use shared::validation::{validate_config_key, MAX_KEY_LENGTH};
use validator::{Validate, ValidationError};

use super::sort::EntrySort;

/// Brings a key into its canonical, case-insensitive form.
///
/// Applied at every write and read boundary so that keys differing only in
/// case never become separate logical keys.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// Key checks applied to the stored form as well as the raw input, since
/// lowercasing may lengthen a key.
fn validate_key(key: &str) -> Result<(), ValidationError> {
    validate_config_key(key)?;
    if normalize_key(key).chars().count() > MAX_KEY_LENGTH as usize {
        let mut err = ValidationError::new("length");
        err.message = Some("Key must be 1-255 characters".into());
        return Err(err);
    }
    Ok(())
}

/// One scheduled revision of a configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledConfigEntry {
    pub id: i64,
    pub key: String,
    /// `None` means the value is explicitly unset.
    pub value: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub author: Option<String>,
    pub comment: Option<String>,
}

impl ScheduledConfigEntry {
    /// Whether the revision has taken effect at `reference_time`.
    pub fn is_effective_at(&self, reference_time: DateTime<Utc>) -> bool {
        self.valid_from <= reference_time
    }
}

/// A normalized, stamped entry ready to be appended to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduledConfigEntry {
    pub key: String,
    pub value: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub author: Option<String>,
    pub comment: Option<String>,
}

impl NewScheduledConfigEntry {
    /// Attaches a store-assigned id.
    pub fn into_entry(self, id: i64) -> ScheduledConfigEntry {
        ScheduledConfigEntry {
            id,
            key: self.key,
            value: self.value,
            valid_from: self.valid_from,
            created: self.created,
            author: self.author,
            comment: self.comment,
        }
    }
}

/// Request payload for creating a scheduled entry.
///
/// `id` and `created` are accepted on the wire so that they can be rejected
/// and ignored respectively.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduledConfigRequest {
    #[serde(default)]
    pub id: Option<i64>,

    #[validate(length(min = 1, max = 255, message = "Key must be 1-255 characters"))]
    #[validate(custom(function = "validate_key"))]
    pub key: String,

    #[serde(default)]
    pub value: Option<String>,

    pub valid_from: DateTime<Utc>,

    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    #[validate(length(max = 255, message = "Author must be at most 255 characters"))]
    #[serde(default)]
    pub author: Option<String>,

    #[validate(length(max = 1024, message = "Comment must be at most 1024 characters"))]
    #[serde(default)]
    pub comment: Option<String>,
}

impl CreateScheduledConfigRequest {
    /// Minimal request for `key` effective from `valid_from`.
    pub fn new(key: impl Into<String>, value: Option<String>, valid_from: DateTime<Utc>) -> Self {
        Self {
            id: None,
            key: key.into(),
            value,
            valid_from,
            created: None,
            author: None,
            comment: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Value in effect for a key at a reference time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentValue {
    pub key: String,
    pub reference_time: DateTime<Utc>,
    pub entry: Option<ScheduledConfigEntry>,
}

impl CurrentValue {
    /// Absent both when nothing is in effect and when the effective entry is unset.
    pub fn value(&self) -> Option<&str> {
        self.entry.as_ref().and_then(|e| e.value.as_deref())
    }
}

/// Prior revisions of a key as seen from `before`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHistory {
    pub key: String,
    pub before: DateTime<Utc>,
    /// Newest first.
    pub entries: Vec<ScheduledConfigEntry>,
}

/// Superseded entries as of a reference time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutdatedEntries {
    pub reference_time: DateTime<Utc>,
    pub entries: Vec<ScheduledConfigEntry>,
}

/// Outcome of one obsolescence scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub reference_time: DateTime<Utc>,
    pub obsolete_ids: Vec<i64>,
}

impl CleanupReport {
    pub fn count(&self) -> usize {
        self.obsolete_ids.len()
    }
}

impl From<&OutdatedEntries> for CleanupReport {
    fn from(outdated: &OutdatedEntries) -> Self {
        Self {
            reference_time: outdated.reference_time,
            obsolete_ids: outdated.entries.iter().map(|e| e.id).collect(),
        }
    }
}

/// Response payload for a value lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigQueryResponse {
    pub reference_time: DateTime<Utc>,
    pub key: String,
    pub value: Option<String>,
}

impl From<CurrentValue> for ConfigQueryResponse {
    fn from(current: CurrentValue) -> Self {
        let value = current.value().map(str::to_string);
        Self {
            reference_time: current.reference_time,
            key: current.key,
            value,
        }
    }
}

/// Response payload for a stored entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledConfigResponse {
    pub id: i64,
    pub key: String,
    pub value: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl From<ScheduledConfigEntry> for ScheduledConfigResponse {
    fn from(e: ScheduledConfigEntry) -> Self {
        Self {
            id: e.id,
            key: e.key,
            value: e.value,
            valid_from: e.valid_from,
            created: e.created,
            author: e.author,
            comment: e.comment,
        }
    }
}

/// A prior revision as shown in a key's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledConfigPast {
    pub value: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl From<ScheduledConfigEntry> for ScheduledConfigPast {
    fn from(e: ScheduledConfigEntry) -> Self {
        Self {
            value: e.value,
            valid_from: e.valid_from,
            created: e.created,
            author: e.author,
            comment: e.comment,
        }
    }
}

/// Query parameters for listing the latest entry of every key.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListLatestQuery {
    pub page_index: Option<u32>,
    pub page_size: Option<u32>,
    /// Comma separated `field[:asc|desc]` list, e.g. `key,validFrom:desc`.
    pub sort: Option<String>,
}

impl ListLatestQuery {
    /// Page request with `default_page_size` filled in when absent.
    pub fn page_request(
        &self,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Result<PageRequest, PaginationError> {
        PageRequest::new(
            self.page_index.unwrap_or(0),
            self.page_size.unwrap_or(default_page_size),
            max_page_size,
        )
    }

    /// Requested sort order, or key then `validFrom` ascending.
    pub fn entry_sort(&self) -> Result<EntrySort, String> {
        match self.sort.as_deref() {
            Some(sort) => sort.parse(),
            None => Ok(EntrySort::default()),
        }
    }
}

/// Pagination info for a page of entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page_index: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

/// Response for the latest-per-key listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLatestResponse {
    pub data: Vec<ScheduledConfigResponse>,
    pub pagination: PaginationInfo,
}

impl From<Page<ScheduledConfigEntry>> for ListLatestResponse {
    fn from(page: Page<ScheduledConfigEntry>) -> Self {
        let page = page.map(ScheduledConfigResponse::from);
        let pagination = PaginationInfo {
            page_index: page.page_index,
            page_size: page.page_size,
            total_elements: page.total_elements,
            total_pages: page.total_pages(),
        };
        Self {
            data: page.items,
            pagination,
        }
    }
}

/// Query parameters for a key's history.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Only revisions created strictly before this instant; defaults to now.
    pub before: Option<DateTime<Utc>>,
}

/// Response for a key's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub key: String,
    pub before: DateTime<Utc>,
    pub history: Vec<ScheduledConfigPast>,
}

impl From<KeyHistory> for HistoryResponse {
    fn from(history: KeyHistory) -> Self {
        Self {
            key: history.key,
            before: history.before,
            history: history.entries.into_iter().map(Into::into).collect(),
        }
    }
}

/// Query parameters for the obsolescence query.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OutdatedQuery {
    /// Reference time; defaults to now.
    pub at: Option<DateTime<Utc>>,
}

/// Response for the obsolescence query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutdatedResponse {
    pub reference_time: DateTime<Utc>,
    pub count: usize,
    pub entries: Vec<ScheduledConfigResponse>,
}

impl From<OutdatedEntries> for OutdatedResponse {
    fn from(outdated: OutdatedEntries) -> Self {
        Self {
            reference_time: outdated.reference_time,
            count: outdated.entries.len(),
            entries: outdated.entries.into_iter().map(Into::into).collect(),
        }
    }
}
