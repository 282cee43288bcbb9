//! Lazy, cancellable answer event stream over a streaming chat body.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use opsdesk_types::chat::FinalAnswer;
use opsdesk_types::error::ExchangeError;

use super::backend::ByteStream;
use super::reducer::{ReducerOptions, StreamingAnswerReducer};

/// One observable step of a streaming exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerEvent {
    /// The full answer so far. Replaces the previous partial.
    Partial(String),
    /// Terminal event; nothing follows it.
    Final(FinalAnswer),
}

pub type AnswerEventStream =
    Pin<Box<dyn Stream<Item = Result<AnswerEvent, ExchangeError>> + Send + 'static>>;

/// Wrap a body byte stream into answer events.
///
/// Nothing is read until the returned stream is polled. When `cancel` fires
/// the stream yields `Err(ExchangeError::Cancelled)` and ends without a
/// `Final` event; dropping it releases the underlying body.
pub fn answer_events(
    mut bytes: ByteStream,
    options: ReducerOptions,
    cancel: CancellationToken,
) -> AnswerEventStream {
    Box::pin(async_stream::try_stream! {
        let mut reducer = StreamingAnswerReducer::new(options);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ExchangeError::Cancelled),
                next = bytes.next() => Ok(next),
            };

            let Some(piece) = next? else { break };
            let piece = piece?;
            for snapshot in reducer.feed(&piece) {
                yield AnswerEvent::Partial(snapshot);
            }
        }

        let answer = reducer.finish()?;
        yield AnswerEvent::Final(answer);
    })
}
