// ============================================================================
// Order Domain - Pizza order lifecycle
// ============================================================================
//
// - Value objects (OrderStatus, Service)
// - Snapshot (Order: typed control fields + passthrough details)
// - Errors (OrderError enum)
//
// No I/O lives here; services in src/services/ drive the transitions.
//
// ============================================================================

pub mod errors;
pub mod snapshot;
pub mod value_objects;

pub use errors::*;
pub use snapshot::*;
pub use value_objects::*;
