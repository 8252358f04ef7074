//! Request builders, response parsers, and the blocking client.
//!
//! # Design
//! `YupdatesClient` holds a resolved `Config`, endpoint templates and a
//! transport, and never mutates any of them. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`; the executing methods (`ping`,
//! `read_items`, `new_items`, ...) are a `build`, one `Transport::execute`
//! and a `parse`. Callers that run their own I/O can use the halves
//! directly.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::auth::{Authenticator, Config};
use crate::endpoints::Endpoints;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::translate;
use crate::types::{FeedItem, InputItem, ItemsPage, NewItemsBody, PageState, ReadOptions};

/// Blocking client for the Yupdates API.
///
/// Cheap to share by reference across threads when the transport is
/// `Sync`; there is no interior state to lock.
#[derive(Debug, Clone)]
pub struct YupdatesClient<T = UreqTransport> {
    config: Config,
    endpoints: Endpoints,
    transport: T,
    quiet: bool,
}

impl YupdatesClient<UreqTransport> {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Build a client from `YUPDATES_API_TOKEN` and `YUPDATES_API_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(Authenticator::new().resolve()?))
    }
}

impl<T: Transport> YupdatesClient<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            config,
            endpoints: Endpoints::default(),
            transport,
            quiet: false,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Suppress everything but error-level log events from this client.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_ping(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoints.ping_url(self.config.api_url()),
            headers: Authenticator::headers_for(&self.config),
            body: None,
        }
    }

    pub fn build_read_items(
        &self,
        feed_id: &str,
        options: &ReadOptions,
    ) -> Result<HttpRequest, ApiError> {
        if feed_id.trim().is_empty() {
            return Err(ApiError::InvalidArgument("feed_id is empty".to_string()));
        }
        let mut url = self.endpoints.read_items_url(self.config.api_url(), feed_id);

        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(n) = options.page_size {
            query.push(("max_items", n.to_string()));
        }
        if let Some(cursor) = options.cursor.as_deref().filter(|c| !c.is_empty()) {
            query.push(("cursor", cursor.to_string()));
        }
        if let Some(t) = options.item_time_after {
            query.push(("item_time_after", t.to_string()));
        }
        if let Some(t) = options.item_time_before {
            query.push(("item_time_before", t.to_string()));
        }
        if !query.is_empty() {
            let pairs: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }

        Ok(HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Authenticator::headers_for(&self.config),
            body: None,
        })
    }

    pub fn build_new_items(&self, items: &[InputItem]) -> Result<HttpRequest, ApiError> {
        if items.is_empty() {
            return Err(ApiError::InvalidArgument("no items to send".to_string()));
        }
        let body = serde_json::to_string(&NewItemsBody { items })
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut headers = Authenticator::headers_for(&self.config);
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoints.new_items_url(self.config.api_url()),
            headers,
            body: Some(body),
        })
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_ping(&self, response: HttpResponse) -> Result<Map<String, Value>, ApiError> {
        translate::parse_ping(&response)
    }

    pub fn parse_read_items(&self, response: HttpResponse) -> Result<ItemsPage, ApiError> {
        translate::parse_page(&response)
    }

    pub fn parse_new_items(&self, response: HttpResponse) -> Result<(), ApiError> {
        translate::check_status(&response)
    }

    // -----------------------------------------------------------------------
    // Executing calls
    // -----------------------------------------------------------------------

    /// Check connectivity and the token. Returns the server's JSON object.
    pub fn ping(&self) -> Result<Map<String, Value>, ApiError> {
        let response = self.send(self.build_ping())?;
        self.parse_ping(response)
    }

    /// `ping`, reduced to whether it succeeded. Failures are logged.
    pub fn ping_bool(&self) -> bool {
        match self.ping() {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "issue pinging the API");
                false
            }
        }
    }

    /// Read one page of a feed and return its items in server order.
    pub fn read_items(
        &self,
        feed_id: &str,
        options: &ReadOptions,
    ) -> Result<Vec<FeedItem>, ApiError> {
        Ok(self.read_page(feed_id, options)?.items)
    }

    /// Read one page of a feed, keeping the continuation cursor.
    pub fn read_page(&self, feed_id: &str, options: &ReadOptions) -> Result<ItemsPage, ApiError> {
        let response = self.send(self.build_read_items(feed_id, options)?)?;
        let page = self.parse_read_items(response)?;
        if !self.quiet {
            tracing::debug!(
                feed_id,
                items = page.items.len(),
                has_more = page.state() == PageState::HasMore,
                "read page"
            );
        }
        Ok(page)
    }

    /// Follow cursors until the feed is exhausted, one request at a time on
    /// the calling thread.
    pub fn read_all_items(
        &self,
        feed_id: &str,
        options: &ReadOptions,
    ) -> Result<Vec<FeedItem>, ApiError> {
        let mut options = options.clone();
        let mut seen: HashSet<String> = options.cursor.iter().cloned().collect();
        let mut items = Vec::new();
        loop {
            let page = self.read_page(feed_id, &options)?;
            let next = page.next_options(&options);
            items.extend(page.items);
            let Some(next) = next else {
                return Ok(items);
            };
            // A cursor seen before means the server is cycling.
            if let Some(cursor) = &next.cursor {
                if !seen.insert(cursor.clone()) {
                    return Err(ApiError::MalformedResponse(format!(
                        "pagination cursor {cursor:?} repeated"
                    )));
                }
            }
            options = next;
        }
    }

    /// Add items to the feed the token is bound to. The batch is one
    /// request; any failure fails the whole batch.
    pub fn new_items(&self, items: &[InputItem]) -> Result<(), ApiError> {
        let response = self.send(self.build_new_items(items)?)?;
        self.parse_new_items(response)?;
        if !self.quiet {
            tracing::info!(count = items.len(), "added items");
        }
        Ok(())
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method.as_str();
        let url = request.url.clone();
        if !self.quiet {
            tracing::debug!(method, url = %url, "sending request");
        }
        let response = self.transport.execute(request).inspect_err(|e| {
            tracing::error!(method, url = %url, error = %e, "request failed");
        })?;
        if !self.quiet {
            if response.status == 200 {
                tracing::debug!(method, url = %url, status = response.status, "response");
            } else {
                tracing::warn!(method, url = %url, status = response.status, "API error response");
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemTime;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses in order and keeps every request.
    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<HttpResponse>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn reply(self, status: u16, body: &str) -> Self {
            self.responses.borrow_mut().push_back(HttpResponse {
                status,
                body: body.to_string(),
            });
            self
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| ApiError::Transport("no scripted response".to_string()))
        }
    }

    fn config() -> Config {
        Config::new("token", "http://localhost:3000/api/v0/").unwrap()
    }

    fn client() -> YupdatesClient<Scripted> {
        YupdatesClient::with_transport(config(), Scripted::default())
    }

    #[test]
    fn build_ping_produces_correct_request() {
        let req = client().build_ping();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/api/v0/ping/");
        assert_eq!(req.header("x-auth-token"), Some("token"));
        assert_eq!(req.header("authorization"), Some("Bearer token"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_read_items_without_options() {
        let req = client().build_read_items("feed1", &ReadOptions::default()).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/api/v0/feeds/feed1/items/");
    }

    #[test]
    fn build_read_items_with_query() {
        let options = ReadOptions::default()
            .page_size(10)
            .cursor("a+b=")
            .item_time_after(ItemTime::from_millis(5).unwrap());
        let req = client().build_read_items("feed1", &options).unwrap();
        assert_eq!(
            req.url,
            "http://localhost:3000/api/v0/feeds/feed1/items/?max_items=10&cursor=a%2Bb%3D&item_time_after=0000000000005.00000"
        );
    }

    #[test]
    fn build_read_items_rejects_empty_feed_id() {
        let err = client().build_read_items("", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn build_new_items_produces_correct_request() {
        let items = vec![
            InputItem::new("t1", "c1").with_url("https://example.com/1"),
            InputItem::new("t2", "c2"),
        ];
        let req = client().build_new_items(&items).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/api/v0/items/");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"items": [
                {"title": "t1", "content": "c1", "canonical_url": "https://example.com/1"},
                {"title": "t2", "content": "c2"}
            ]})
        );
    }

    #[test]
    fn build_new_items_rejects_empty_batch() {
        let err = client().build_new_items(&[]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn ping_returns_body_unchanged() {
        let c = YupdatesClient::with_transport(
            config(),
            Scripted::default().reply(200, r#"{"message":"pong","n":[1,2]}"#),
        );
        let map = c.ping().unwrap();
        assert_eq!(Value::Object(map), serde_json::json!({"message":"pong","n":[1,2]}));
    }

    #[test]
    fn ping_bool_reports_failure() {
        let c = YupdatesClient::with_transport(config(), Scripted::default().reply(401, ""));
        assert!(!c.ping_bool());
        let c = YupdatesClient::with_transport(config(), Scripted::default().reply(200, "{}"));
        assert!(c.ping_bool());
    }

    #[test]
    fn read_all_items_follows_cursor() {
        let transport = Scripted::default()
            .reply(200, r#"{"items":[{"id":"3","title":"c","content":"c"}],"cursor":"p2"}"#)
            .reply(200, r#"{"items":[{"id":"2","title":"b","content":"b"},{"id":"1","title":"a","content":"a"}]}"#);
        let c = YupdatesClient::with_transport(config(), transport);
        let items = c.read_all_items("f", &ReadOptions::default()).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["3", "2", "1"]);
        let requests = c.transport.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].url.contains("cursor="));
        assert!(requests[1].url.ends_with("?cursor=p2"));
    }

    #[test]
    fn read_all_items_stops_on_repeated_cursor() {
        let page = r#"{"items":[],"cursor":"same"}"#;
        let transport = Scripted::default().reply(200, page).reply(200, page);
        let c = YupdatesClient::with_transport(config(), transport);
        let err = c.read_all_items("f", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn read_all_items_stops_on_cursor_cycle() {
        let transport = Scripted::default()
            .reply(200, r#"{"items":[],"cursor":"A"}"#)
            .reply(200, r#"{"items":[],"cursor":"B"}"#)
            .reply(200, r#"{"items":[],"cursor":"A"}"#)
            .reply(200, r#"{"items":[],"cursor":"B"}"#);
        let c = YupdatesClient::with_transport(config(), transport);
        let err = c.read_all_items("f", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
        assert_eq!(c.transport.requests.borrow().len(), 3);
    }

    #[test]
    fn read_all_items_rejects_return_to_starting_cursor() {
        let transport = Scripted::default().reply(200, r#"{"items":[],"cursor":"start"}"#);
        let c = YupdatesClient::with_transport(config(), transport);
        let err = c
            .read_all_items("f", &ReadOptions::default().cursor("start"))
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn new_items_failure_is_whole_batch() {
        let c = YupdatesClient::with_transport(
            config(),
            Scripted::default().reply(403, r#"{"error":"read-only token"}"#),
        );
        let err = c.new_items(&[InputItem::new("t", "c")]).unwrap_err();
        assert!(matches!(err, ApiError::Authorization { status: 403, .. }));
    }

    #[test]
    fn transport_error_propagates() {
        let c = client();
        let err = c.ping().unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn custom_endpoints_are_used() {
        let c = client().with_endpoints(Endpoints {
            ping: "health".to_string(),
            read_items: "v2/{feed_id}".to_string(),
            new_items: "v2/write".to_string(),
        });
        assert_eq!(c.build_ping().url, "http://localhost:3000/api/v0/health");
        assert_eq!(
            c.build_read_items("x", &ReadOptions::default()).unwrap().url,
            "http://localhost:3000/api/v0/v2/x"
        );
        assert_eq!(
            c.build_new_items(&[InputItem::new("t", "c")]).unwrap().url,
            "http://localhost:3000/api/v0/v2/write"
        );
    }
}
