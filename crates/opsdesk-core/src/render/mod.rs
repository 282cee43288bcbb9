//! Text projections of an answer.
//!
//! - `markdown`: safe HTML for rendered display
//! - `speech`: plain prose for text-to-speech

pub mod markdown;
pub mod speech;

pub use markdown::render_markdown;
pub use speech::to_speech_text;
