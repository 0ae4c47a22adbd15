//! Incumbent bookkeeping shared by the engine and the reference host.

mod incumbent;

pub use incumbent::IncumbentTracker;
