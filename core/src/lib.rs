//! Blocking client for the Yupdates feed API.
//!
//! # Overview
//! Authenticates with an API token, reads items from a feed one page at a
//! time, and writes new items to the feed a write token is bound to. Every
//! failure is an `ApiError` whose variant tells the caller what went wrong:
//! configuration, transport, authorization, a rejected request, a server
//! fault, an unrecognized status, or a malformed body.
//!
//! # Design
//! - `YupdatesClient` holds an immutable `Config`; build it once and reuse it.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`); a `Transport` runs the
//!   round-trip in between. `UreqTransport` is the default.
//! - `translate` is the only place that turns a status code into an error.
//! - The `api` module offers one-call functions for scripts.
//!
//! ```no_run
//! use yupdates_core::{Config, InputItem, ReadOptions, YupdatesClient};
//!
//! # fn main() -> Result<(), yupdates_core::ApiError> {
//! let config = Config::new("token", "https://feeds.example.com/api/v0")?;
//! let client = YupdatesClient::new(config);
//! client.ping()?;
//! client.new_items(&[InputItem::new("a title", "some content")])?;
//! let items = client.read_items("feed-id", &ReadOptions::default())?;
//! # let _ = items;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod translate;
pub mod types;

pub use auth::{Authenticator, Config};
pub use client::YupdatesClient;
pub use endpoints::Endpoints;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport, DEFAULT_TIMEOUT};
pub use types::{FeedItem, InputItem, ItemTime, ItemsPage, PageState, ReadOptions};
