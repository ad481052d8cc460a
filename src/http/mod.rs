// ============================================================================
// HTTP Surface
// ============================================================================
//
// One `configure` per service. Handlers translate between HTTP bodies and the
// services; errors render as `{"success": false, "message": ...}` via the
// `ResponseError` impl in `response`.
//
// ============================================================================

pub mod delivery;
pub mod kitchen;
mod response;
pub mod store;

pub use store::Subscription;
