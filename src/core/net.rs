// src/core/net.rs

use reqwest::blocking::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};

use crate::config::consts::USER_AGENT;
use crate::config::SourceOptions;
use crate::{Error, Result};

/// Page source. Paths are site-relative and start with `/`.
pub trait Fetch {
    fn get(&self, path: &str) -> Result<String>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn get(&self, path: &str) -> Result<String> {
        (**self).get(path)
    }
}

/// Blocking HTTP GET against the configured site.
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(source: &SourceOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cred) = &source.credential {
            let mut value = HeaderValue::from_str(cred)
                .map_err(|e| Error::Config(format!("credential is not a valid header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(source.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: source.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            join!(&self.base_url, path)
        } else {
            join!(&self.base_url, "/", path)
        }
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        let t = std::time::Instant::now();

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::Connectivity(format!("GET {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Connectivity(format!("HTTP {status} for {url}")));
        }
        let body = resp.text()?;
        logd!("GET {} -> {} bytes in {:?}", url, body.len(), t.elapsed());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths() {
        let mut src = SourceOptions::default();
        src.base_url = s!("https://example.test/");
        let f = HttpFetcher::new(&src).unwrap();
        assert_eq!(f.url("/live/flight/N1/history/80"), "https://example.test/live/flight/N1/history/80");
        assert_eq!(f.url("a/b"), "https://example.test/a/b");
    }

    #[test]
    fn rejects_unprintable_credential() {
        let mut src = SourceOptions::default();
        src.credential = Some(s!("bad\nvalue"));
        assert!(matches!(HttpFetcher::new(&src), Err(Error::Config(_))));
    }
}
