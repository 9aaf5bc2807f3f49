//! Domain model for the session-scoped taxonomy.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep client input shapes (drafts/patches) separate from stored records.
//!
//! # Invariants
//! - Categories and items never exist outside an owning session.
//! - Item properties are an opaque client payload; the reserved `id` and
//!   `internal_id` keys never round-trip through it.

pub mod category;
pub mod item;
pub mod properties;
pub mod session;
pub mod tree;
