use super::errors::OrderError;
use super::value_objects::OrderStatus;

// ============================================================================
// Status Transition Policy
// ============================================================================
//
// `Unrestricted` lets any status move to any other status.
// `Lifecycle` enforces PENDING -> PAID -> DELIVERED with cancellation allowed
// until delivery; DELIVERED and CANCELLED are terminal.
//
// Same-status requests never reach the policy, they are no-ops.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    #[default]
    Unrestricted,
    Lifecycle,
}

impl TransitionPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unrestricted" | "any" => Some(Self::Unrestricted),
            "lifecycle" | "strict" => Some(Self::Lifecycle),
            _ => None,
        }
    }

    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::*;

        match self {
            TransitionPolicy::Unrestricted => true,
            TransitionPolicy::Lifecycle => matches!(
                (from, to),
                (Pending, Paid) | (Pending, Cancelled) | (Paid, Delivered) | (Paid, Cancelled)
            ),
        }
    }

    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition { from, to })
        }
    }
}
