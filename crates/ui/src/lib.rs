#![deny(unsafe_code)]

/// Chat window shell.
///
/// This crate provides a single-conversation chat window built with GPUI and gpui-component.
/// Replies come from the assistant backend and the transcript is kept in a local store.
pub mod app;
/// Chat domain, persistence and views.
pub mod chat;
/// Settings persistence.
pub mod settings;
