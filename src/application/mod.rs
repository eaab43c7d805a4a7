// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// user-facing goal each (ingest, train, predict, summarise).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - Storage only through the Layer 3 traits, except where a
//     use case is explicitly about the data directory
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// CSV upload → record store
pub mod ingest_use_case;

// The training workflow
pub mod train_use_case;

// Prediction, risk tier and advice for one student
pub mod predict_use_case;

// Class distribution and indicator means
pub mod summary_use_case;
