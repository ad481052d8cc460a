// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// The order lifecycle state machine and the order snapshot model.
// This layer has no knowledge of HTTP or of the sidecar runtime.
//
// ============================================================================

pub mod order;
