//! Span field names shared across crates.
//!
//! Spans declare these fields as `tracing::field::Empty` and fill them in with
//! `Span::record`, so the names must match the literal names in the span
//! declarations.

// --- Chat exchange ---

/// `voice` or `text`.
pub const CHAT_PROFILE: &str = "chat.profile";

/// ERP the question was scoped to, if any.
pub const CHAT_ERP: &str = "chat.erp";

/// How the exchange ended: `answered`, `cancelled`, or `failed`.
pub const CHAT_OUTCOME: &str = "chat.outcome";

/// Answer length in characters.
pub const CHAT_ANSWER_CHARS: &str = "chat.answer_chars";

// --- Relay ---

/// `chat` or `tracker`.
pub const RELAY_UPSTREAM: &str = "relay.upstream";

/// Status code returned by the upstream service.
pub const RELAY_STATUS: &str = "relay.status";

// --- Tickets ---

pub const TICKET_FORM: &str = "ticket.form";

pub const TICKET_KEY: &str = "ticket.key";
