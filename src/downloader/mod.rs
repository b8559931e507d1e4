//! Downloader module containing the batch driver, builder pattern, and configuration.
//!
//! - `downloader` - Core Downloader struct with the batch orchestration logic
//! - `builder` - DownloaderBuilder for flexible configuration using the builder pattern
//! - `config` - Configuration structures and callback types
//! - `summary` - Per-URL outcomes and the batch result
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use treefetch::downloader::DownloaderBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = DownloaderBuilder::new().build();
//! let result = downloader.run(&["https://example.com/a/b.png"]).await?;
//! println!("{} of {} mirrored", result.succeeded(), result.total());
//! # Ok(())
//! # }
//! ```
//!
//! ## Advanced Configuration
//!
//! ```rust
//! use treefetch::downloader::{DownloaderBuilder, Outcome};
//! use std::path::PathBuf;
//!
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("./mirror"))
//!     .concurrent_downloads(5)
//!     .on_complete(|outcome| {
//!         if let Outcome::Failed(failure) = outcome {
//!             eprintln!("{}", failure);
//!         }
//!     })
//!     .build();
//! ```

pub mod builder;
pub mod config;
pub mod downloader;
pub mod summary;

pub use builder::DownloaderBuilder;
pub use config::{DownloaderConfig, TransferCallback};
pub use downloader::Downloader;
pub use summary::{BatchResult, Failure, Outcome};
