//! The connection seam between a transfer and the network.
//!
//! A transfer only ever sees a [`Connection`]: a status code, an optional size
//! hint and a stream of body chunks. [`HttpTransport`] produces those from
//! `reqwest`; tests plug in scripted transports instead.

use crate::error::TransferError;
use crate::http::client::{create_http_client, HttpClientConfig};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use tracing::debug;

/// Body of a response, chunk by chunk.
pub type BodyStream = BoxStream<'static, Result<Bytes, TransferError>>;

/// The two supported flavors of HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `http://`
    Plain,
    /// `https://`
    Tls,
}

impl Scheme {
    /// Resolve the scheme from the URL prefix.
    ///
    /// ```rust
    /// use treefetch::http::Scheme;
    ///
    /// assert_eq!(Scheme::from_url("http://h/a").unwrap(), Scheme::Plain);
    /// assert_eq!(Scheme::from_url("HTTPS://h/a").unwrap(), Scheme::Tls);
    /// assert!(Scheme::from_url("ftp://h/a").is_err());
    /// ```
    pub fn from_url(url: &str) -> Result<Self, TransferError> {
        let has_prefix = |prefix: &str| {
            url.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        };

        if has_prefix("http://") {
            Ok(Scheme::Plain)
        } else if has_prefix("https://") {
            Ok(Scheme::Tls)
        } else {
            Err(TransferError::UnsupportedScheme {
                url: url.to_string(),
            })
        }
    }

    /// Protocol name as it appears in URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Plain => "http",
            Scheme::Tls => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opened response.
pub struct Connection {
    /// HTTP status code.
    pub status: u16,
    /// Declared body size. `None` when absent or zero.
    pub content_length: Option<u64>,
    /// Response body.
    pub body: BodyStream,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Whether the status counts as a successful transfer: `[200, 400)`.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Opens connections for transfers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return once the response head is available.
    async fn open(&self, scheme: Scheme, url: &str) -> Result<Connection, TransferError>;
}

/// [`Transport`] backed by `reqwest`.
///
/// Plain requests use a regular client; TLS requests use a client that refuses
/// to be downgraded to plain HTTP.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    plain: ClientWithMiddleware,
    tls: ClientWithMiddleware,
}

impl HttpTransport {
    /// Build both clients from the same configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let tls = create_http_client(HttpClientConfig {
            https_only: true,
            ..config.clone()
        })?;
        let plain = create_http_client(config)?;
        Ok(Self { plain, tls })
    }

    fn client(&self, scheme: Scheme) -> &ClientWithMiddleware {
        match scheme {
            Scheme::Plain => &self.plain,
            Scheme::Tls => &self.tls,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, scheme: Scheme, url: &str) -> Result<Connection, TransferError> {
        debug!("Fetching {} over {}", url, scheme);
        let res = self
            .client(scheme)
            .get(url)
            .send()
            .await
            .map_err(|e| TransferError::connection(url, e))?;

        let status = res.status().as_u16();
        let content_length = res.content_length().filter(|len| *len > 0);
        let owned_url = url.to_string();
        let body = res
            .bytes_stream()
            .map(move |item| item.map_err(|e| TransferError::connection(owned_url.as_str(), e)))
            .boxed();

        Ok(Connection {
            status,
            content_length,
            body,
        })
    }
}
