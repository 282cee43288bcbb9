//! ChatBackend trait definition.
//!
//! Uses RPITIT for `complete`, and `Pin<Box<dyn Stream>>` for `stream` so the
//! byte stream can be handed to the reducer without naming the client's
//! concrete stream type.

use std::pin::Pin;

use futures_util::Stream;

use opsdesk_types::chat::{ChatChunk, ChatRequest};
use opsdesk_types::error::ExchangeError;

/// Body bytes of a streaming response, in arbitrary-sized pieces.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ExchangeError>> + Send + 'static>>;

/// Port to the conversational AI chat service.
///
/// Implementations live in opsdesk-infra (e.g., `GleanClient`).
pub trait ChatBackend: Send + Sync {
    /// Send a non-streaming request and decode the single response object.
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<ChatChunk, ExchangeError>> + Send;

    /// Send a streaming request. The returned stream yields raw body bytes;
    /// line splitting and decoding happen in the reducer.
    fn stream(&self, request: ChatRequest) -> ByteStream;
}
