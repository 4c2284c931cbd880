//! Backend commands queued from UI to backend worker.

use shared::domain::{DestinationConfig, SourceConfig, TransferDirection};

#[derive(Debug, Clone)]
pub enum BackendCommand {
    UpdateSource(SourceConfig),
    UpdateDestination(DestinationConfig),
    SetDirection(TransferDirection),
    SuggestDirection,
    StartTransfer,
    RequestHistory,
    Shutdown,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::UpdateSource(_) => "update_source",
            BackendCommand::UpdateDestination(_) => "update_destination",
            BackendCommand::SetDirection(_) => "set_direction",
            BackendCommand::SuggestDirection => "suggest_direction",
            BackendCommand::StartTransfer => "start_transfer",
            BackendCommand::RequestHistory => "request_history",
            BackendCommand::Shutdown => "shutdown",
        }
    }
}
