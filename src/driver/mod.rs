//! Device driver abstraction
//!
//! The engine reaches devices only through the `ProtocolDriver` read/write
//! contract. `SimulatedDriver` is an in-memory driver for development.

mod simulated;
mod traits;

pub use simulated::SimulatedDriver;
pub use traits::{CommandRequest, ProtocolDriver};
