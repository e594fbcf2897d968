// Keytouch Input Layer
// Pointer events, the key bounds grid, and pointer-to-key routing

mod event;
mod grid;
pub mod router;

pub use event::{TouchEvent, TouchPhase};
pub use grid::KeyGrid;
pub use router::{LockingRouter, PassThrough, Routed, RoutingStrategy, TouchRouter};
