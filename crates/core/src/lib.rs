//! Perfume Bot Core - Shared domain types.
//!
//! This crate provides the types used across the chatbot components:
//! - `bot` - LINE webhook server, intent resolution and graph queries
//! - `cli` - Catalog import and operator diagnostics
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no graph access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, products, catalog entries, carts and intents

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
