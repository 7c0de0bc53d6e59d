use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

pub type DynCookieService = Arc<dyn CookieServiceTrait + Send + Sync>;

#[async_trait::async_trait]
pub trait CookieServiceTrait {
    async fn get_cookies(&self, origin: &str) -> Option<String>;

    async fn store_cookies(&self, origin: &str, set_cookie_values: &[String]);
}

/// in-process cookie jar keyed by origin (scheme://host:port)
/// lives for the process lifetime, nothing ever expires or gets evicted
pub struct CookieService {
    jar: RwLock<HashMap<String, String>>,
}

impl CookieService {
    pub fn new() -> Self {
        Self {
            jar: RwLock::new(HashMap::new()),
        }
    }

    /// cookies are scoped to the origin, not the full url
    pub fn extract_origin(url: &str) -> Option<String> {
        let parsed = url::Url::parse(url).ok()?;
        let origin = parsed.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }
}

impl Default for CookieService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CookieServiceTrait for CookieService {
    async fn get_cookies(&self, origin: &str) -> Option<String> {
        self.jar.read().await.get(origin).cloned()
    }

    async fn store_cookies(&self, origin: &str, set_cookie_values: &[String]) {
        // Set-Cookie format: name=value; attr1; attr2...
        // only keep the name=value part, attributes like Path/Max-Age aren't honored here
        let pairs: Vec<&str> = set_cookie_values
            .iter()
            .filter_map(|cookie| {
                let pair = cookie.split(';').next()?.trim();
                pair.contains('=').then_some(pair)
            })
            .filter(|pair| !pair.is_empty())
            .collect();

        // a response without a single valid pair must not wipe what we already have
        if pairs.is_empty() {
            return;
        }

        let cookie_header = pairs.join("; ");
        debug!(
            "storing {} cookie pair(s) for origin {}",
            pairs.len(),
            origin
        );

        // replace, don't merge - the origin's latest response wins wholesale
        self.jar
            .write()
            .await
            .insert(origin.to_string(), cookie_header);
    }
}
