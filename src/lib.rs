//! Idempotent create-or-update of Kubernetes objects over the REST API.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use kube_apply::{ApplyClient, Resource};
//!
//! let client = ApplyClient::new("https://10.0.0.1:6443", "token")?;
//! let mut cm: Resource = serde_json::from_value(serde_json::json!({
//!     "apiVersion": "v1",
//!     "kind": "ConfigMap",
//!     "metadata": {"namespace": "default", "name": "settings"},
//!     "data": {"key": "value"}
//! }))?;
//! let response = client.apply_object(&mut cm).await?;
//! println!("{}", response.status_code);
//! # Ok(())
//! # }
//! ```

pub mod applier;
pub mod client;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod path;
pub mod resource;

pub use applier::Applier;
pub use client::{ApiResponse, ApplyClient, RequestOptions};
pub use config::Credentials;
pub use errors::ApplyError;
pub use resource::{Metadata, Resource};
