//! # Backend Port
//!
//! The engine's only external boundary. A [`ResourceBackend`] performs one remote call per
//! command and answers in the canonical shapes defined here ([`Page`], [`ActionOutcome`]).
//! Envelope variants (`data` vs top-level arrays, `meta` vs `pagination`) are the adapter's
//! problem, never the engine's.
//!
//! Downloaded files leave through the [`DownloadSink`] port.

use crate::command::ListQuery;
use crate::entity::SyncEntity;
use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Paging metadata as reported by the server. Every field is optional because
/// backends disagree on which ones they send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default, alias = "limit", alias = "perPage")]
    pub page_size: Option<u32>,
    #[serde(default, alias = "totalItems", alias = "count")]
    pub total: Option<u64>,
    #[serde(default, alias = "pages")]
    pub total_pages: Option<u32>,
}

/// One page of a `list` result.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, meta: PageMeta) -> Self {
        Self { items, meta }
    }

    /// A page whose total is exactly its own length.
    pub fn complete(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        Self {
            items,
            meta: PageMeta {
                total: Some(total),
                total_pages: Some(1),
                ..PageMeta::default()
            },
        }
    }
}

/// What a successful custom action did.
#[derive(Debug)]
pub enum ActionOutcome<T: SyncEntity> {
    /// Nothing to apply to the list.
    Done,
    /// The server returned the new state of an existing item.
    Upsert(T),
    /// The item left this collection (restored, purged, archived).
    Remove(T::Id),
    /// A computed value (e.g. a preview) to expose as `last_result`.
    Result(T::ActionResult),
    /// A file to hand to the [`DownloadSink`].
    Download(Download),
}

/// A binary payload destined for the user's save prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// File name without extension, e.g. `invoice-2026-0042`.
    pub file_stem: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Download {
    /// File extension chosen from the `Content-Type`; parameters are ignored.
    pub fn extension(&self) -> &'static str {
        let mime = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "text/csv" | "application/csv" => "csv",
            "application/pdf" => "pdf",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
            "application/vnd.ms-excel" => "xls",
            "application/json" => "json",
            "application/zip" => "zip",
            "text/plain" => "txt",
            _ => "bin",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem, self.extension())
    }
}

/// Remote collaborator for one resource.
///
/// Every method maps to exactly one HTTP call. Implementations must not retry.
#[async_trait]
pub trait ResourceBackend<T: SyncEntity>: Send + Sync + 'static {
    async fn list(&self, query: ListQuery) -> Result<Page<T>, TransportError>;

    async fn create(&self, params: T::Create) -> Result<T, TransportError>;

    async fn update(&self, id: T::Id, update: T::Update) -> Result<T, TransportError>;

    async fn delete(&self, id: T::Id) -> Result<(), TransportError>;

    async fn perform(&self, action: T::Action) -> Result<ActionOutcome<T>, TransportError>;
}

/// Where downloaded files go. Stands in for the browser's save mechanism.
#[async_trait]
pub trait DownloadSink: Send + Sync + 'static {
    /// Saves the file and returns where it ended up.
    async fn save(&self, download: Download) -> std::io::Result<PathBuf>;
}

/// Drops every download. Default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

#[async_trait]
impl DownloadSink for DiscardSink {
    async fn save(&self, download: Download) -> std::io::Result<PathBuf> {
        debug!(file = %download.file_name(), bytes = download.bytes.len(), "Download discarded");
        Ok(PathBuf::from(download.file_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download(content_type: &str) -> Download {
        Download {
            file_stem: "export".into(),
            content_type: content_type.into(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_extension_from_content_type() {
        assert_eq!(download("text/csv; charset=utf-8").extension(), "csv");
        assert_eq!(download("application/pdf").extension(), "pdf");
        assert_eq!(
            download("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet").extension(),
            "xlsx"
        );
        assert_eq!(download("").extension(), "bin");
        assert_eq!(download("Application/PDF").file_name(), "export.pdf");
    }

    #[test]
    fn test_page_meta_accepts_aliases() {
        let meta: PageMeta =
            serde_json::from_str(r#"{"page":2,"limit":10,"totalItems":35,"pages":4}"#).unwrap();
        assert_eq!(meta.page, Some(2));
        assert_eq!(meta.page_size, Some(10));
        assert_eq!(meta.total, Some(35));
        assert_eq!(meta.total_pages, Some(4));
    }
}
