// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by every other layer:
//
//   table.rs     — a header row plus numeric sample rows, the
//                  in-memory form of every tabular data file
//   direction.rs — forward (structure → spectrum) or reverse
//                  (spectrum → structure) mapping mode
//   error.rs     — the typed error kinds of the system
//   traits.rs    — abstractions the data layer implements
//
// No Burn types and no file I/O live here.

pub mod direction;
pub mod error;
pub mod table;
pub mod traits;
