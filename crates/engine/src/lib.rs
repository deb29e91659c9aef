//! `settlebook-engine` — the ledger core's surface.
//!
//! [`LedgerService`] is the explicit context object the (external) chat
//! transport calls into with already-parsed, already-authorized commands.
//! There are no package-level singletons; wire one up per process and pass it
//! around.

pub mod service;

pub use service::LedgerService;
