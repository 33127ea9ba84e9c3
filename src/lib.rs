//! Presign Uploadr Library
//!
//! Direct-to-storage file uploads through pre-signed PUT URLs.
//!
//! # Features
//!
//! - **Explicit state machine**: `Idle → Uploading → Succeeded | Failed`
//! - **Live progress**: percent complete as the body streams out
//! - **No credentials**: the pre-signed URL is the only authorization
//! - **Streaming**: files are read from disk in chunks, never fully buffered
//!
//! # Example
//!
//! ```no_run
//! use presign_uploadr::{HttpTransport, SelectedFile, UploadSession};
//! use presign_uploadr::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let mut session = UploadSession::new(HttpTransport::new(&config.transport)?);
//!
//!     let controller = session.controller_mut();
//!     controller.set_target("https://my-bucket.s3.amazonaws.com/backup.tar?X-Amz-Signature=...");
//!     controller.select_file(SelectedFile::from_path("backup.tar").await?);
//!     controller.submit();
//!
//!     let snapshot = session
//!         .run_until_settled(std::future::pending(), |s| println!("{}%", s.state.progress))
//!         .await;
//!     println!("{:?}", snapshot.state.phase);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod transport;
pub mod upload;
pub mod view;

// Re-export commonly used types
pub use config::Config;
pub use session::UploadSession;
pub use transport::{HttpTransport, Transport};
pub use upload::{Phase, SelectedFile, Snapshot, UploadController, UploadError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
