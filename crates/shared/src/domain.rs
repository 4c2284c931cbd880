use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(RunId);

/// Connection parameters for the relational side of a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    #[validate(length(min = 1, message = "Database name is required"))]
    pub db_name: String,
    #[validate(length(min = 1, message = "Schema name is required"))]
    pub schema_name: String,
    #[validate(length(min = 1, message = "Table name is required"))]
    pub table_name: String,
    #[validate(
        length(min = 1, message = "Host URL is required"),
        custom(function = "crate::validation::validate_host_url")
    )]
    pub host_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl SourceConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("db_name", &self.db_name),
            ("schema_name", &self.schema_name),
            ("table_name", &self.table_name),
            ("host_url", &self.host_url),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn table_label(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }
}

/// Connection parameters for the warehouse side of a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DestinationConfig {
    #[validate(length(min = 1, message = "Project ID is required"))]
    pub project_id: String,
    #[validate(length(min = 1, message = "Dataset ID is required"))]
    pub dataset_id: String,
    #[validate(length(min = 1, message = "Table ID is required"))]
    pub table_id: String,
    #[validate(custom(function = "crate::validation::validate_auth_json"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_json: Option<String>,
}

impl DestinationConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("project_id", &self.project_id),
            ("dataset_id", &self.dataset_id),
            ("table_id", &self.table_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn table_label(&self) -> String {
        format!("{}.{}", self.dataset_id, self.table_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    SourceToDestination,
    DestinationToSource,
}

impl TransferDirection {
    pub const ALL: [TransferDirection; 2] = [
        TransferDirection::SourceToDestination,
        TransferDirection::DestinationToSource,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TransferDirection::SourceToDestination => "MSSQL to BigQuery",
            TransferDirection::DestinationToSource => "BigQuery to MSSQL",
        }
    }

    /// Returns `(read side, write side)` labels for a run in this direction.
    pub fn endpoint_labels(
        self,
        source: &SourceConfig,
        destination: &DestinationConfig,
    ) -> (String, String) {
        match self {
            TransferDirection::SourceToDestination => {
                (source.table_label(), destination.table_label())
            }
            TransferDirection::DestinationToSource => {
                (destination.table_label(), source.table_label())
            }
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl fmt::Display for UnknownDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown transfer direction '{}' (expected source-to-destination or destination-to-source)",
            self.0
        )
    }
}

impl std::error::Error for UnknownDirection {}

impl FromStr for TransferDirection {
    type Err = UnknownDirection;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "source-to-destination" | "mssql-to-bq" => Ok(TransferDirection::SourceToDestination),
            "destination-to-source" | "bq-to-mssql" => Ok(TransferDirection::DestinationToSource),
            _ => Err(UnknownDirection(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    #[default]
    Idle,
    Pending,
    Transferring,
    Success,
    Error,
}

impl TransferStatus {
    pub fn is_active(self) -> bool {
        matches!(self, TransferStatus::Pending | TransferStatus::Transferring)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Success | TransferStatus::Error)
    }

    pub fn message(self, error: Option<&str>) -> String {
        match self {
            TransferStatus::Idle => "Ready to start transfer.".to_string(),
            TransferStatus::Pending => "Preparing transfer...".to_string(),
            TransferStatus::Transferring => "Transferring data...".to_string(),
            TransferStatus::Success => "Transfer completed successfully!".to_string(),
            TransferStatus::Error => {
                format!("Transfer failed: {}", error.unwrap_or("Unknown error"))
            }
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStatus::Idle => "idle",
            TransferStatus::Pending => "pending",
            TransferStatus::Transferring => "transferring",
            TransferStatus::Success => "success",
            TransferStatus::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    Success,
    Failure,
}

impl TransferOutcome {
    pub fn label(self) -> &'static str {
        match self {
            TransferOutcome::Success => "Success",
            TransferOutcome::Failure => "Failed",
        }
    }

    pub fn terminal_status(self) -> TransferStatus {
        match self {
            TransferOutcome::Success => TransferStatus::Success,
            TransferOutcome::Failure => TransferStatus::Error,
        }
    }
}

/// Audit record of a finished run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: RunId,
    pub source: String,
    pub destination: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: TransferOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub direction: TransferDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    pub source_configured: bool,
    pub destination_configured: bool,
    pub direction_selected: bool,
}

impl Readiness {
    pub fn evaluate(
        source: &SourceConfig,
        destination: &DestinationConfig,
        direction: Option<TransferDirection>,
    ) -> Self {
        Self {
            source_configured: source.is_configured(),
            destination_configured: destination.is_configured(),
            direction_selected: direction.is_some(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.source_configured && self.destination_configured && self.direction_selected
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSnapshot {
    pub status: TransferStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
}

impl TransferSnapshot {
    pub fn status_message(&self) -> String {
        self.status.message(self.error.as_deref())
    }

    /// Whether the start control should accept input for the given readiness.
    pub fn can_start(&self, readiness: &Readiness) -> bool {
        readiness.is_ready() && !self.status.is_active()
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
