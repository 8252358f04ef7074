//! One-call functions for scripts.
//!
//! Each function builds a throwaway `YupdatesClient` from the given
//! configuration, or from `YUPDATES_API_TOKEN` / `YUPDATES_API_URL` when none
//! is given, and performs a single operation. Programs making repeated calls
//! should hold a `YupdatesClient` instead.

use serde_json::{Map, Value};

use crate::auth::{Authenticator, Config};
use crate::client::YupdatesClient;
use crate::error::ApiError;
use crate::types::{FeedItem, InputItem, ItemsPage, ReadOptions};

fn client(config: Option<&Config>) -> Result<YupdatesClient, ApiError> {
    let config = match config {
        Some(config) => config.clone(),
        None => Authenticator::new().resolve()?,
    };
    Ok(YupdatesClient::new(config))
}

pub fn ping(config: Option<&Config>) -> Result<Map<String, Value>, ApiError> {
    client(config)?.ping()
}

/// `false` also covers a configuration that cannot be resolved.
pub fn ping_bool(config: Option<&Config>) -> bool {
    match client(config) {
        Ok(client) => client.ping_bool(),
        Err(e) => {
            tracing::error!(error = %e, "issue pinging the API");
            false
        }
    }
}

pub fn read_items(
    feed_id: &str,
    config: Option<&Config>,
    options: &ReadOptions,
) -> Result<Vec<FeedItem>, ApiError> {
    client(config)?.read_items(feed_id, options)
}

pub fn read_page(
    feed_id: &str,
    config: Option<&Config>,
    options: &ReadOptions,
) -> Result<ItemsPage, ApiError> {
    client(config)?.read_page(feed_id, options)
}

pub fn new_items(items: &[InputItem], config: Option<&Config>) -> Result<(), ApiError> {
    client(config)?.new_items(items)
}
