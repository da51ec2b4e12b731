//! Core types for the perfume chatbot.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the webhook server and the operator CLI.

pub mod cart;
pub mod id;
pub mod intent;
pub mod product;
pub mod status;

pub use cart::CartLine;
pub use id::*;
pub use intent::{Intent, IntentParseError, ProductIntent};
pub use product::{CatalogEntry, OUT_OF_STOCK, Product};
pub use status::{NoteKind, ProductStatus};
