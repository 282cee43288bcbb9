//! Issue tracker adapter.

pub mod client;

pub use client::JiraClient;
