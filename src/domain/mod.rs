// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums, pure functions and traits that
// define the core concepts of the system.
//
// Rules for this layer:
//   - NO file I/O
//   - NO numerical fitting code
//   - Risk tiers and recommendations are pure functions
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Student records, the feature triple and inference input
pub mod student;

// Probability → risk tier
pub mod risk;

// (indicators, tier) → ordered advice list
pub mod recommendation;

// Error taxonomy shared by every layer
pub mod error;

// Record and model store abstractions
pub mod traits;
