//! Authorization capability consumed by the transport layer.

use settlebook_core::OperatorId;

/// Decides whether an operator may drive bookkeeping commands.
///
/// Injected into the transport layer as a capability object; there is no
/// environment-variable or database lookup hidden behind it.
pub trait AuthorizationPolicy: Send + Sync {
    fn can_operate(&self, operator_id: OperatorId) -> bool;
}
