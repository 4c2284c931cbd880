use serde::{Deserialize, Serialize};

use crate::{
    domain::{HistoryEntry, RunId, TransferDirection, TransferStatus},
    error::{ErrorReport, SIMULATED_FAILURE_MESSAGE},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Destructive,
}

/// Transient toast-style message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Destructive,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn configuration_incomplete() -> Self {
        Self::destructive(
            "Configuration Incomplete",
            "Please ensure MSSQL, BigQuery, and Transfer Direction are configured.",
        )
    }

    pub fn transfer_succeeded() -> Self {
        Self::info(
            "Transfer Successful",
            "Data has been transferred successfully.",
        )
    }

    pub fn transfer_failed(message: Option<&str>) -> Self {
        Self::destructive(
            "Transfer Failed",
            message.unwrap_or(SIMULATED_FAILURE_MESSAGE),
        )
    }

    pub fn direction_suggested(direction: TransferDirection) -> Self {
        Self::info("Direction Suggested", format!("Suggested: {direction}."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TransferEvent {
    StatusChanged {
        run_id: RunId,
        status: TransferStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ProgressUpdated {
        run_id: RunId,
        progress: u8,
    },
    Completed {
        entry: HistoryEntry,
    },
    Rejected {
        error: ErrorReport,
    },
    Notice(Notice),
}

impl TransferEvent {
    pub fn run_id(&self) -> Option<RunId> {
        match self {
            TransferEvent::StatusChanged { run_id, .. }
            | TransferEvent::ProgressUpdated { run_id, .. } => Some(*run_id),
            TransferEvent::Completed { entry } => Some(entry.id),
            TransferEvent::Rejected { .. } | TransferEvent::Notice(_) => None,
        }
    }
}
