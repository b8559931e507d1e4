//! HTTP plumbing: client construction and the transport seam.
//!
//! - [`client`] - builds the `reqwest` client with tracing middleware
//! - [`transport`] - the [`Scheme`] variants and the [`Transport`] trait a
//!   transfer opens its connection through
//!
//! # Examples
//!
//! ```rust
//! use treefetch::http::{HttpClientConfig, HttpTransport, Scheme};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let _transport = HttpTransport::new(HttpClientConfig::default())?;
//! assert_eq!(Scheme::from_url("https://example.com/a.png")?, Scheme::Tls);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod transport;

pub use client::{create_http_client, HttpClientConfig};
pub use transport::{BodyStream, Connection, HttpTransport, Scheme, Transport};
