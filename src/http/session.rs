//! HTTP session implementation
//!
//! This module handles every request the panel workflows make:
//! - Building the HTTP client with the configured timeout and user agent
//! - Keeping a per-session cookie jar, with an explicit cookie bundle layered on top
//! - Following redirects by hand so every hop goes through the jar
//! - Classifying transport failures

use crate::config::HttpConfig;
use crate::http::cookies::CookieBundle;
use crate::PanelError;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, COOKIE, LOCATION};
use reqwest::{redirect::Policy, Client, Method, StatusCode};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A fully read response at the end of a redirect chain
#[derive(Debug, Clone)]
pub struct PanelResponse {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code of the final response
    pub status: StatusCode,
    /// Headers of the final response
    pub headers: HeaderMap,
    /// Cookies set by the final response
    pub cookies: CookieBundle,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl PanelResponse {
    /// Returns a cookie set by the server, ignoring empty values
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).filter(|v| !v.is_empty())
    }

    /// Returns a header value if present and valid ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Builds an HTTP client with the panel configuration, storing cookies in `jar`
///
/// Redirects are disabled at the client level; `HttpSession` follows them itself.
///
/// # Example
///
/// ```no_run
/// use easypay_panel::config::HttpConfig;
/// use easypay_panel::http::build_http_client;
/// use reqwest::cookie::Jar;
/// use std::sync::Arc;
///
/// let client = build_http_client(&HttpConfig::default(), Arc::new(Jar::default())).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig, jar: Arc<Jar>) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::none()) // Handle redirects manually
        .cookie_provider(jar)
        .gzip(true)
        .brotli(true);

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    builder.build()
}

/// Request sender for one panel operation
///
/// Each session owns a fresh cookie jar: cookies the panel sets on any response,
/// redirect hops included, are sent on every later request of the same session.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    jar: Arc<Jar>,
    max_redirects: usize,
}

impl HttpSession {
    /// Builds a session with an empty jar from the `[http]` config section
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let jar = Arc::new(Jar::default());
        Ok(Self {
            client: build_http_client(config, Arc::clone(&jar))?,
            jar,
            max_redirects: config.max_redirects,
        })
    }

    /// Sends a GET to `url` with extra `query` pairs and the given cookies
    pub async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        cookies: &CookieBundle,
    ) -> Result<PanelResponse, PanelError> {
        let mut url = Url::parse(url)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        self.send(Method::GET, url, None, cookies).await
    }

    /// Sends a urlencoded form POST to `url` with the given cookies
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        cookies: &CookieBundle,
    ) -> Result<PanelResponse, PanelError> {
        let url = Url::parse(url)?;
        let form = form
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.send(Method::POST, url, Some(form), cookies).await
    }

    /// Returns the jar's value for cookie `name` as it would be sent to `url`
    pub fn stored_cookie(&self, url: &str, name: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let stored = self.jar.cookies(&url)?;
        let stored = stored.to_str().ok()?;
        stored
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(n, v)| *n == name && !v.is_empty())
            .map(|(_, v)| v.to_string())
    }

    /// Builds the `Cookie` header for `url`
    ///
    /// The explicit bundle comes first and wins on name clashes; jar cookies the
    /// bundle does not name are appended in jar order.
    fn cookie_header(&self, url: &Url, explicit: &CookieBundle) -> Option<String> {
        let mut bundle = explicit.clone();
        if let Some(stored) = self.jar.cookies(url) {
            if let Ok(stored) = stored.to_str() {
                for (name, value) in stored.split(';').filter_map(|p| p.trim().split_once('=')) {
                    if bundle.get(name).is_none() {
                        bundle.set(name, value);
                    }
                }
            }
        }
        (!bundle.is_empty()).then(|| bundle.header_value())
    }

    /// Sends a request and follows redirects
    ///
    /// # Redirect Rules
    ///
    /// | Status | Next hop |
    /// |--------|----------|
    /// | 301, 302, 303 | GET, form dropped |
    /// | 307, 308 | same method and form |
    /// | 3xx without Location | treated as final |
    ///
    /// More than `max_redirects` hops, or revisiting a URL, is an error.
    async fn send(
        &self,
        mut method: Method,
        mut url: Url,
        mut form: Option<Vec<(String, String)>>,
        cookies: &CookieBundle,
    ) -> Result<PanelResponse, PanelError> {
        let mut visited = HashSet::new();
        visited.insert(url.clone());

        for _ in 0..=self.max_redirects {
            tracing::trace!("{} {}", method, url);

            // An explicit Cookie header stops reqwest from adding jar cookies itself
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(header) = self.cookie_header(&url, cookies) {
                request = request.header(COOKIE, header);
            }
            if let Some(fields) = &form {
                request = request.form(fields);
            }

            let response = request.send().await.map_err(|source| PanelError::Transport {
                url: url.to_string(),
                source,
            })?;

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            if status.is_redirection() {
                if let Some(location) = location {
                    let next = url.join(&location)?;
                    if !visited.insert(next.clone()) {
                        return Err(PanelError::RedirectLoop {
                            url: next.to_string(),
                        });
                    }

                    if matches!(
                        status,
                        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
                    ) {
                        method = Method::GET;
                        form = None;
                    }

                    tracing::debug!("Redirect {} -> {}", status.as_u16(), next);
                    url = next;
                    continue;
                }
            }

            let mut set_cookies = CookieBundle::new();
            for cookie in response.cookies() {
                set_cookies.set(cookie.name(), cookie.value());
            }

            let headers = response.headers().clone();
            let final_url = response.url().clone();
            let body = response
                .bytes()
                .await
                .map_err(|source| PanelError::Transport {
                    url: final_url.to_string(),
                    source,
                })?
                .to_vec();

            return Ok(PanelResponse {
                url: final_url,
                status,
                headers,
                cookies: set_cookies,
                body,
            });
        }

        Err(PanelError::RedirectLimit {
            url: url.to_string(),
        })
    }
}
