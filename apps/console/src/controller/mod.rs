//! Controller layer: UI events and command dispatch toward the backend worker.

pub mod events;
pub mod orchestration;
