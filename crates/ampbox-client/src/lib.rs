//! Ampbox Client Library
//!
//! Talks to the Ampbox session service:
//! - Session lifecycle: create, resume, list
//! - Live event streaming over Server-Sent Events
//! - Error classification (authentication, unknown session, service errors)

pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod tracing_init;
pub mod types;

pub use client::{EventStream, HttpSessionClient, SessionClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use types::{CreateSessionRequest, EventKind, Session, SessionEvent, SessionStatus};
