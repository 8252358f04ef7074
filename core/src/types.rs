//! Domain types for the Yupdates API.
//!
//! # Design
//! Field names follow the wire format (`item_id`, `canonical_url`) through
//! serde renames, with aliases for the shorter names some deployments emit.
//! Only `item_id`, `title` and `content` are required on a `FeedItem`;
//! serde rejects a missing or mistyped required field, and that rejection
//! surfaces as `ApiError::MalformedResponse`. A body carrying both a name
//! and its alias (`item_id` and `id`, say) is ambiguous and is rejected the
//! same way.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// One item read from a feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    #[serde(rename = "item_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(
        rename = "canonical_url",
        alias = "url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_id: Option<String>,
    #[serde(alias = "created_at", default, skip_serializing_if = "Option::is_none")]
    pub item_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_time_ms: Option<u64>,
    #[serde(default)]
    pub deleted: bool,
}

impl FeedItem {
    pub fn from_json(value: &Value) -> Result<Self, ApiError> {
        Self::deserialize(value).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}

/// One item to add to a feed.
///
/// `url` is omitted from the payload when absent rather than sent as null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputItem {
    pub title: String,
    pub content: String,
    #[serde(
        rename = "canonical_url",
        alias = "url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
}

impl InputItem {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("title".to_string(), Value::String(self.title.clone()));
        obj.insert("content".to_string(), Value::String(self.content.clone()));
        if let Some(url) = &self.url {
            obj.insert("canonical_url".to_string(), Value::String(url.clone()));
        }
        Value::Object(obj)
    }
}

/// Request payload for the write endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct NewItemsBody<'a> {
    pub items: &'a [InputItem],
}

const MAX_ITEM_MILLIS: u64 = 9_999_999_999_999;
const MAX_ITEM_SLOT: u32 = 99_999;

/// A normalized item timestamp: unix milliseconds plus a slot suffix that
/// orders items sharing the same millisecond.
///
/// Displays as `"{millis:013}.{slot:05}"`, so normalized strings sort in
/// time order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemTime {
    millis: u64,
    slot: u32,
}

impl ItemTime {
    pub fn new(millis: u64, slot: u32) -> Result<Self, ApiError> {
        if millis > MAX_ITEM_MILLIS {
            return Err(ApiError::InvalidArgument(
                "item_time timestamp is out of range".to_string(),
            ));
        }
        if slot > MAX_ITEM_SLOT {
            return Err(ApiError::InvalidArgument(
                "item_time suffix is out of range".to_string(),
            ));
        }
        Ok(Self { millis, slot })
    }

    pub fn from_millis(millis: u64) -> Result<Self, ApiError> {
        Self::new(millis, 0)
    }

    /// Accepts `"1661564013555"` or `"1661564013555.00003"`.
    ///
    /// The suffix is an integer slot, not a decimal fraction: `"1234.3"`
    /// is slot 3 and displays as `"0000000001234.00003"`.
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        let s = s.trim();
        let (base, slot) = match s.split_once('.') {
            Some((base, slot)) => (base, slot),
            None => (s, "0"),
        };
        let millis = base
            .parse::<u64>()
            .map_err(|_| ApiError::InvalidArgument(format!("invalid item_time: {s:?}")))?;
        let slot = slot
            .parse::<u32>()
            .map_err(|_| ApiError::InvalidArgument(format!("invalid item_time suffix: {s:?}")))?;
        Self::new(millis, slot)
    }

    pub fn millis(&self) -> u64 {
        self.millis
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }
}

impl fmt::Display for ItemTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:013}.{:05}", self.millis, self.slot)
    }
}

impl FromStr for ItemTime {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parameters for one read of a feed. All optional; an empty value reads
/// the newest page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum number of items in the page (`max_items`).
    pub page_size: Option<u32>,
    /// Continuation cursor returned by the previous page.
    pub cursor: Option<String>,
    pub item_time_after: Option<ItemTime>,
    pub item_time_before: Option<ItemTime>,
}

impl ReadOptions {
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn item_time_after(mut self, time: ItemTime) -> Self {
        self.item_time_after = Some(time);
        self
    }

    pub fn item_time_before(mut self, time: ItemTime) -> Self {
        self.item_time_before = Some(time);
        self
    }
}

/// Where a paginated read stands after a page arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    HasMore,
    Exhausted,
}

/// One page of feed items, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemsPage {
    pub items: Vec<FeedItem>,
    pub cursor: Option<String>,
}

impl ItemsPage {
    pub fn state(&self) -> PageState {
        match self.cursor.as_deref() {
            Some(c) if !c.is_empty() => PageState::HasMore,
            _ => PageState::Exhausted,
        }
    }

    /// Options for the page after this one, or `None` when exhausted.
    pub fn next_options(&self, current: &ReadOptions) -> Option<ReadOptions> {
        match self.state() {
            PageState::HasMore => Some(ReadOptions {
                cursor: self.cursor.clone(),
                ..current.clone()
            }),
            PageState::Exhausted => None,
        }
    }
}
