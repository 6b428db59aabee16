// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Order rules and use cases. Storage and the product service are reached
// only through the `OrderRepository` and `ProductValidator` traits.
//
// ============================================================================

pub mod order;
pub mod pagination;
