//! `settlebook-auth` — operator authorization boundary.
//!
//! Consulted by the chat transport before it invokes the ledger engine; the
//! engine itself trusts its caller and never checks permissions. Intentionally
//! decoupled from storage and transport.

pub mod admin;
pub mod policy;

pub use admin::{AdminEntry, AdminSet};
pub use policy::AuthorizationPolicy;
