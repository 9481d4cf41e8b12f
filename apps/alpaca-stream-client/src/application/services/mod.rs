//! Application Services
//!
//! - `dispatch`: typed observer registration and in-order fan-out

mod dispatch;

pub use dispatch::EventHub;
