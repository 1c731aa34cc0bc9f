//! Core logic of the concierge chat widget: transcript state, session
//! lifecycle, persistence, and the voice input adapter.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod speech;
pub mod store;
pub mod transcript;
mod widget;

pub use widget::{
    ChatWidget, MICROPHONE_DENIED_TEXT, SEND_FAILED_TEXT,
    SESSION_INIT_FAILED_TEXT, VISIBILITY_KEY,
};
