// Core parsing primitives: the SIMD scanner, the quoted-interior decoder,
// the row collector, and the generic engine the output strategies plug into.

pub mod collector;
pub mod engine;
pub mod scanner;
pub mod unescape;

pub use collector::RowCollector;
pub use engine::{parse, Emitter};
pub use scanner::{Delimiter, DelimiterKind};
