//! AI chat service adapter.

pub mod client;

pub use client::GleanClient;
