use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

use super::errors::{CrlError, CrlResult};

/// Source of raw CRL bytes
#[async_trait]
pub trait CrlSource: Send + Sync {
    async fn fetch_crl(&self, url: &str) -> CrlResult<Vec<u8>>;
}

/// Fetches CRLs over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpCrlFetcher {
    client: Client,
    request_timeout: Duration,
}

impl HttpCrlFetcher {
    /// Returns an error if the HTTP client cannot be initialized
    pub fn with_timeout(timeout_secs: u64) -> CrlResult<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    async fn download(&self, url: &str) -> CrlResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(CrlError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl CrlSource for HttpCrlFetcher {
    async fn fetch_crl(&self, url: &str) -> CrlResult<Vec<u8>> {
        info!("Fetching CRL from: {}", url);

        // Covers connect, headers and body
        let body = match timeout(self.request_timeout, self.download(url)).await {
            Ok(result) => result?,
            Err(_) => return Err(CrlError::Timeout(url.to_string())),
        };
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// Derive the delta CRL location by inserting `+` before the final `.crl`
/// of the path, e.g. `.../Contoso.crl` becomes `.../Contoso+.crl`.
pub fn delta_crl_url(base_url: &str) -> CrlResult<String> {
    let mut url =
        Url::parse(base_url).map_err(|e| CrlError::InvalidUrl(format!("{base_url}: {e}")))?;

    let path = url.path();
    let stem_len = path.len().checked_sub(4).filter(|&stem| {
        path.get(stem..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".crl"))
    });
    let Some(stem_len) = stem_len else {
        return Err(CrlError::InvalidUrl(format!(
            "{base_url}: path does not end with .crl"
        )));
    };

    let delta_path = format!("{}+{}", &path[..stem_len], &path[stem_len..]);
    url.set_path(&delta_path);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_crl_url() {
        assert_eq!(
            delta_crl_url("http://pki.contoso.example/CertEnroll/Contoso%20CA.crl").unwrap(),
            "http://pki.contoso.example/CertEnroll/Contoso%20CA+.crl"
        );
    }

    #[test]
    fn test_delta_crl_url_keeps_extension_case_and_query() {
        assert_eq!(
            delta_crl_url("https://pki.contoso.example/root.CRL?v=2").unwrap(),
            "https://pki.contoso.example/root+.CRL?v=2"
        );
    }

    #[tokio::test]
    async fn test_stalled_server_reports_timeout() {
        // Accepts the connection but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/Contoso.crl", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let fetcher = HttpCrlFetcher::with_timeout(1).unwrap();
        let result = fetcher.fetch_crl(&url).await;
        server.abort();

        assert!(
            matches!(result, Err(CrlError::Timeout(ref u)) if *u == url),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn test_delta_crl_url_rejects_other_paths() {
        for url in [
            "http://pki.contoso.example/root.cer",
            "http://pki.contoso.example/",
            "http://pki.contoso.example/crl",
            "not a url",
        ] {
            assert!(
                matches!(delta_crl_url(url), Err(CrlError::InvalidUrl(_))),
                "expected {url} to be rejected"
            );
        }
    }
}
