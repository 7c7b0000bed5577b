//! Scan status types returned by the service.
//!
//! This module defines the numeric virus status codes, their canonical
//! labels, the `FileStatus` record for a single job and the
//! `PaginatedFiles` envelope returned by the recent-statuses listing.

use crate::core::error::{WebAvError, WebAvResult};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical labels indexed by status code.
pub const VIRUS_STATUS_LABELS: [&str; 5] = ["Pending", "Passed", "Virus", "Unable", "Skipped"];

/// Returns the canonical label for a numeric status code.
///
/// # Errors
///
/// Returns `InvalidArgument` for any code outside `0..=4`.
///
/// ```rust
/// use webav::core::get_status_label;
///
/// assert_eq!(get_status_label(2).unwrap(), "Virus");
/// assert!(get_status_label(5).is_err());
/// ```
pub fn get_status_label(code: i64) -> WebAvResult<&'static str> {
    usize::try_from(code)
        .ok()
        .and_then(|index| VIRUS_STATUS_LABELS.get(index).copied())
        .ok_or_else(|| WebAvError::invalid_argument(format!("invalid status: {code}")))
}

/// The scan state of a file.
///
/// Serialized as its integer code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VirusStatus {
    /// Scanning has not finished yet.
    Pending = 0,
    /// No threats were found.
    Passed = 1,
    /// A virus was detected.
    Virus = 2,
    /// The file could not be scanned.
    Unable = 3,
    /// Scanning was skipped.
    Skipped = 4,
}

impl VirusStatus {
    /// Returns the integer code used on the wire.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Returns the canonical label for this status.
    pub fn label(self) -> &'static str {
        VIRUS_STATUS_LABELS[self as usize]
    }

    /// Returns `true` for every status other than `Pending`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<i64> for VirusStatus {
    type Error = WebAvError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Passed),
            2 => Ok(Self::Virus),
            3 => Ok(Self::Unable),
            4 => Ok(Self::Skipped),
            other => Err(WebAvError::invalid_argument(format!("invalid status: {other}"))),
        }
    }
}

impl From<VirusStatus> for i64 {
    fn from(status: VirusStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for VirusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of a single scan job.
///
/// `virus_status_label` always mirrors `virus_status`: records built with
/// [`FileStatus::new`] derive it, and decoding rejects a response where the
/// two disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireFileStatus")]
pub struct FileStatus {
    /// Opaque job identifier.
    pub id: String,

    /// Current scan state.
    pub virus_status: VirusStatus,

    /// Canonical label of `virus_status`.
    pub virus_status_label: String,

    /// When the job was created, if the service sent a readable timestamp.
    pub created_at: Option<DateTime<Utc>>,

    /// When the job was last updated, if the service sent a readable timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl FileStatus {
    /// Creates a status record without timestamps, deriving the label from
    /// the status.
    pub fn new(id: impl Into<String>, virus_status: VirusStatus) -> Self {
        Self {
            id: id.into(),
            virus_status,
            virus_status_label: virus_status.label().to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets the creation and update timestamps.
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }

    /// Returns `true` while the job is still being scanned.
    pub fn is_pending(&self) -> bool {
        !self.virus_status.is_terminal()
    }

    /// Returns `true` once scanning has concluded.
    pub fn is_terminal(&self) -> bool {
        self.virus_status.is_terminal()
    }

    /// Returns `true` if the file passed the scan.
    pub fn is_clean(&self) -> bool {
        self.virus_status == VirusStatus::Passed
    }

    /// Returns `true` if a virus was detected.
    pub fn is_infected(&self) -> bool {
        self.virus_status == VirusStatus::Virus
    }
}

#[derive(Deserialize)]
struct WireFileStatus {
    id: String,
    virus_status: VirusStatus,
    #[serde(default)]
    virus_status_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

/// Formats accepted for zone-less timestamps, read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses RFC 3339 or a zone-less `YYYY-MM-DD HH:MM:SS` timestamp.
///
/// Timestamps are informational, so `null` or an unreadable value becomes
/// `None` instead of failing the whole record.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(text)) = raw else {
        return Ok(None);
    };
    Ok(parse_timestamp(text.trim()))
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

impl TryFrom<WireFileStatus> for FileStatus {
    type Error = WebAvError;

    fn try_from(wire: WireFileStatus) -> Result<Self, Self::Error> {
        let canonical = wire.virus_status.label();
        if let Some(label) = &wire.virus_status_label {
            if label != canonical {
                return Err(WebAvError::decode(format!(
                    "status label '{label}' does not match status code {} ('{canonical}')",
                    wire.virus_status.code()
                )));
            }
        }

        Ok(Self {
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            ..Self::new(wire.id, wire.virus_status)
        })
    }
}

/// One page of recently scanned files.
///
/// Decoding rejects a page holding more than `per_page` records, or one whose
/// `current_page` lies outside `1..=last_page` while records exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WirePaginatedFiles")]
pub struct PaginatedFiles {
    /// Records on this page, in service order.
    pub data: Vec<FileStatus>,

    /// 1-based index of this page.
    pub current_page: u32,

    /// Page size requested by the service.
    pub per_page: u32,

    /// Index of the last page.
    pub last_page: u32,

    /// Total number of records across all pages.
    #[serde(default)]
    pub total: u64,

    /// 1-based index of the first record on this page, `None` when empty.
    #[serde(default)]
    pub from: Option<u64>,

    /// 1-based index of the last record on this page, `None` when empty.
    #[serde(default)]
    pub to: Option<u64>,
}

#[derive(Deserialize)]
struct WirePaginatedFiles {
    data: Vec<FileStatus>,
    current_page: u32,
    per_page: u32,
    last_page: u32,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    from: Option<u64>,
    #[serde(default)]
    to: Option<u64>,
}

impl TryFrom<WirePaginatedFiles> for PaginatedFiles {
    type Error = WebAvError;

    fn try_from(wire: WirePaginatedFiles) -> Result<Self, Self::Error> {
        if wire.data.len() as u64 > u64::from(wire.per_page) {
            return Err(WebAvError::decode(format!(
                "page holds {} records but per_page is {}",
                wire.data.len(),
                wire.per_page
            )));
        }
        if wire.total > 0 && !(1..=wire.last_page).contains(&wire.current_page) {
            return Err(WebAvError::decode(format!(
                "current_page {} is outside 1..={}",
                wire.current_page, wire.last_page
            )));
        }

        Ok(Self {
            data: wire.data,
            current_page: wire.current_page,
            per_page: wire.per_page,
            last_page: wire.last_page,
            total: wire.total,
            from: wire.from,
            to: wire.to,
        })
    }
}

impl PaginatedFiles {
    /// Returns `true` if this page holds no records.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if pages after this one exist.
    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Returns the number of the following page, if any.
    pub fn next_page(&self) -> Option<u32> {
        self.has_more_pages().then(|| self.current_page + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_labels() {
        let expected = ["Pending", "Passed", "Virus", "Unable", "Skipped"];
        for (code, label) in expected.iter().enumerate() {
            assert_eq!(get_status_label(code as i64).unwrap(), *label);
        }
    }

    #[test]
    fn test_status_label_out_of_range() {
        for code in [-1, 5, 42, i64::MAX, i64::MIN] {
            let err = get_status_label(code).unwrap_err();
            assert!(matches!(err, WebAvError::InvalidArgument { .. }));
            assert!(err.to_string().contains(&code.to_string()));
        }
    }

    #[test]
    fn test_virus_status_codes() {
        assert_eq!(VirusStatus::try_from(0).unwrap(), VirusStatus::Pending);
        assert_eq!(VirusStatus::try_from(4).unwrap(), VirusStatus::Skipped);
        assert!(VirusStatus::try_from(5).is_err());
        assert_eq!(VirusStatus::Virus.code(), 2);
        assert_eq!(VirusStatus::Unable.to_string(), "Unable");
        assert!(!VirusStatus::Pending.is_terminal());
        assert!(VirusStatus::Skipped.is_terminal());
    }

    #[test]
    fn test_file_status_decode() {
        let status: FileStatus = serde_json::from_value(json!({
            "id": "9b2f6c1e-0000-4000-8000-000000000001",
            "virus_status": 1,
            "virus_status_label": "Passed",
            "created_at": "2024-03-01T10:00:00.000000Z",
            "updated_at": "2024-03-01T10:00:05.000000Z"
        }))
        .unwrap();

        assert_eq!(status.virus_status, VirusStatus::Passed);
        assert_eq!(status.virus_status_label, "Passed");
        assert!(status.is_clean());
        assert!(status.is_terminal());
    }

    #[test]
    fn test_file_status_rejects_mismatched_label() {
        let result: Result<FileStatus, _> = serde_json::from_value(json!({
            "id": "abc",
            "virus_status": 0,
            "virus_status_label": "Passed",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_file_status_rejects_unknown_code() {
        let result: Result<FileStatus, _> = serde_json::from_value(json!({
            "id": "abc",
            "virus_status": 9,
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_file_status_label_derived_when_absent() {
        let status: FileStatus = serde_json::from_value(json!({
            "id": "abc",
            "virus_status": 2,
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(status.virus_status_label, "Virus");
        assert!(status.is_infected());
    }

    #[test]
    fn test_file_status_serializes_code_and_label() {
        let now = Utc::now();
        let status = FileStatus::new("abc", VirusStatus::Unable).with_timestamps(now, now);
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["virus_status"], json!(3));
        assert_eq!(value["virus_status_label"], json!("Unable"));
    }

    #[test]
    fn test_empty_page() {
        let page: PaginatedFiles = serde_json::from_value(json!({
            "data": [],
            "last_page": 1,
            "per_page": 1,
            "current_page": 1,
            "total": 0
        }))
        .unwrap();

        assert!(page.is_empty());
        assert_eq!(page.from, None);
        assert_eq!(page.to, None);
        assert!(!page.has_more_pages());
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn test_next_page() {
        let page = PaginatedFiles {
            data: Vec::new(),
            current_page: 2,
            per_page: 15,
            last_page: 4,
            total: 50,
            from: Some(16),
            to: Some(30),
        };
        assert_eq!(page.next_page(), Some(3));
    }
    #[test]
    fn test_file_status_lenient_timestamps() {
        let status: FileStatus = serde_json::from_value(json!({
            "id": "abc",
            "virus_status": 0,
            "created_at": "2024-03-01 10:00:00",
            "updated_at": null
        }))
        .unwrap();

        let expected = NaiveDateTime::parse_from_str("2024-03-01 10:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc();
        assert_eq!(status.created_at, Some(expected));
        assert_eq!(status.updated_at, None);
        assert!(status.is_pending());
    }

    #[test]
    fn test_file_status_unreadable_or_missing_timestamps() {
        let status: FileStatus = serde_json::from_value(json!({
            "id": "abc",
            "virus_status": 1,
            "created_at": "yesterday"
        }))
        .unwrap();
        assert_eq!(status.created_at, None);
        assert_eq!(status.updated_at, None);
    }

    fn page_json(records: usize, per_page: u32, current_page: u32, last_page: u32) -> serde_json::Value {
        let data: Vec<_> = (0..records)
            .map(|i| {
                json!({
                    "id": format!("job-{i}"),
                    "virus_status": 1,
                    "created_at": "2024-03-01T10:00:00Z",
                    "updated_at": "2024-03-01T10:00:00Z"
                })
            })
            .collect();
        json!({
            "data": data,
            "current_page": current_page,
            "per_page": per_page,
            "last_page": last_page,
            "total": records
        })
    }

    #[test]
    fn test_page_rejects_more_records_than_per_page() {
        let result: Result<PaginatedFiles, _> = serde_json::from_value(page_json(2, 1, 1, 2));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("per_page"));
    }

    #[test]
    fn test_page_rejects_current_page_out_of_range() {
        for current_page in [0, 7] {
            let result: Result<PaginatedFiles, _> =
                serde_json::from_value(page_json(1, 15, current_page, 1));
            assert!(result.is_err(), "current_page {current_page} accepted");
        }
    }

    #[test]
    fn test_page_within_bounds() {
        let page: PaginatedFiles = serde_json::from_value(page_json(2, 2, 1, 3)).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.next_page(), Some(2));
    }
}
