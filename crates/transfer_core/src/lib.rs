//! Simulated transfer engine: form state, the timer-driven run state machine
//! and the in-memory history of finished runs.

pub mod advisor;
pub mod config;
pub mod history;
pub mod orchestrator;
pub mod outcome;
pub mod workspace;

pub use advisor::{DirectionAdvisor, RandomDirectionAdvisor};
pub use config::{load_settings, Settings, SettingsError};
pub use history::HistoryLog;
pub use orchestrator::{RunTimings, TransferOrchestrator};
pub use outcome::{OutcomeSource, WeightedOutcomeSource};
pub use workspace::TransferWorkspace;
