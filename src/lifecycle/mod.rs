//! Blood request lifecycle: the OPEN -> FULFILLED | CANCELLED state machine
//! and per-donor dismissals.

mod actions;
mod dismissals;
pub mod entity;

pub use actions::*;
pub use dismissals::*;
