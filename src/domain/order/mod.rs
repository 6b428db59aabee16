// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (Order, OrderItem, OrderStatus, enriched views)
// - Commands (CreateOrder, ChangeOrderStatus, OrderPagination)
// - Errors (OrderError and its coarse ErrorKind)
// - Transition policy for status changes
// - Service (OrderService, the use-case coordinator)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod transitions;
pub mod service;

pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use transitions::*;
pub use service::*;
