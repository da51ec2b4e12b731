//! Business logic services.
//!
//! # Services
//!
//! - `catalog` - Product recommendations and title lookups
//! - `conversation` - Turns webhook events into replies
//! - `replies` - Canned reply texts

pub mod catalog;
pub mod conversation;
pub mod replies;

pub use catalog::CatalogService;
pub use conversation::{Command, ConversationError, ConversationService, Reply, Transcript};
