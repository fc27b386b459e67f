//! Shared HTTP transport for pixlift.
//!
//! One transport instance is built per scheduler and reused by every upload so
//! connections are pooled. Its configuration is fixed at construction; requests
//! carry all of their own state.

pub mod response;
pub mod transport;

pub use response::{decode_body, RawResponse};
pub use transport::{ReqwestTransport, TransferRequest, UploadTransport};
