//! Core logic and port traits for opsdesk.
//!
//! This crate defines the "ports" (chat backend, issue tracker) that the
//! infrastructure layer implements, plus everything that is pure text or
//! data shaping: answer extraction, the streaming answer reducer, Markdown
//! rendering, speech projection, ERP topics, and ticket payloads. It depends
//! only on `opsdesk-types` -- never on `opsdesk-infra` or any HTTP crate.

pub mod chat;
pub mod erp;
pub mod render;
pub mod ticket;
