//! An abstraction layer for conversational backends.
//!
//! This crate establishes an unified protocol for the chat widget to
//! interact with a hosted generative-language service, so that the
//! widget can switch between real and scripted backends without
//! modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod backend;
mod error;
mod reply;
mod turn;

pub use backend::*;
pub use error::*;
pub use reply::*;
pub use turn::*;
