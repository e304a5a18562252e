//! lectern-api: chat stream protocol and document server client
//!
//! This crate speaks the study server's wire contract: the line-oriented
//! `data: {json}` chat stream and the document management endpoints.

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::{ChatTransport, DocumentStore, StudyClient};
pub use error::{Error, Result};
pub use stream::{ChatEventStream, EventDecoder, StreamEvent, decode_stream};
pub use types::*;
