//! HTTP client SDK for the TtkIA assistant API.
//!
//! # Example
//!
//! ```no_run
//! use ttkia_client::{CommandOptions, QueryRequest, Result, TtkiaClient};
//!
//! # async fn example() -> Result<()> {
//! let client = TtkiaClient::builder()
//!     .base_url("https://ttkia.example.com/api")
//!     .auth_token("app-token")
//!     .connect()
//!     .await?;
//!
//! if !client.auth().is_authenticated().await {
//!     eprintln!("token rejected");
//! }
//!
//! // Workspace + upload + query
//! let ws = client.conversations().create().await?;
//! let Some(id) = ws.conversation_id else {
//!     return Ok(());
//! };
//! client.files().upload("config.json", Some(&id), None).await?;
//! let answer = client
//!     .chat()
//!     .query(
//!         QueryRequest::new("Revisa la configuración adjunta")
//!             .in_conversation(&id)
//!             .with_style("technical")
//!             .with_sources(Vec::<String>::new()),
//!     )
//!     .await?;
//! println!("{}", answer.response_text);
//!
//! // Quick command with extra context
//! let answer = client
//!     .commands()
//!     .use_command(
//!         "/analizar_logs",
//!         CommandOptions::default().with_context("nginx: connection timeout"),
//!     )
//!     .await?;
//! println!("{:?}", answer.confidence_score());
//!
//! client.conversations().delete(&id).await;
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Auth**: token check, user profile, session summary
//! - **Conversations**: list, show, create, delete, attachments
//! - **Catalog**: sources, prompts, styles
//! - **Files**: multipart upload with MIME detection
//! - **Chat**: queries with source auto-fill
//! - **Commands**: list and run quick commands
//!
//! Listing calls have a `try_*` form returning [`Result`] and a plain form
//! that returns an empty value on failure. Idempotent reads are retried with
//! exponential backoff; mutating calls are sent once.

pub mod api;
pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use api::{
    CommandOptions, compose_command_query, content_type_for, normalize_command_name,
    resolve_command,
};
pub use client::{ClientBuilder, TtkiaClient};
pub use error::{Error, Result};
pub use retry::RetryPolicy;
pub use ttkia_config::{LogHandle, LogLevel, ResolvedProfile};
pub use types::*;
