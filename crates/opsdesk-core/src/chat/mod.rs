//! Chat exchange abstractions for opsdesk.
//!
//! - `ChatBackend`: RPITIT port to the AI chat service
//! - `extract`: turn selection and text extraction shared by both paths
//! - `reducer`: line buffering and cumulative-chunk folding
//! - `stream`: the lazy, cancellable answer event stream
//! - `assistant`: one assistant instance with its conversation state

pub mod assistant;
pub mod backend;
pub mod extract;
pub mod reducer;
pub mod state;
pub mod stream;
