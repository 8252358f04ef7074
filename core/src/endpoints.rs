//! Endpoint path templates.
//!
//! Paths are relative to the configured base URL. The read template must
//! contain a `{feed_id}` placeholder; the write endpoint has none because
//! the token decides which feed receives the items.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub ping: String,
    pub read_items: String,
    pub new_items: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ping: "ping/".to_string(),
            read_items: "feeds/{feed_id}/items/".to_string(),
            new_items: "items/".to_string(),
        }
    }
}

impl Endpoints {
    pub fn ping_url(&self, base_url: &str) -> String {
        join(base_url, &self.ping)
    }

    pub fn read_items_url(&self, base_url: &str, feed_id: &str) -> String {
        let path = self
            .read_items
            .replace("{feed_id}", &urlencoding::encode(feed_id));
        join(base_url, &path)
    }

    pub fn new_items_url(&self, base_url: &str) -> String {
        join(base_url, &self.new_items)
    }
}

fn join(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
