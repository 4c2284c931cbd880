use std::sync::Arc;

use anyhow::Result;
use shared::{
    domain::{DestinationConfig, Readiness, RunId, SourceConfig, TransferDirection},
    error::TransferError,
    validation::{validate_destination, validate_source, FieldErrors},
};
use tracing::debug;

use crate::{advisor::DirectionAdvisor, orchestrator::TransferOrchestrator};

/// Form state for one console session: both configurations, the chosen
/// direction and the latest validation reports.
#[derive(Debug, Clone, Default)]
pub struct TransferWorkspace {
    source: SourceConfig,
    destination: DestinationConfig,
    direction: Option<TransferDirection>,
    suggested_direction: Option<TransferDirection>,
    source_errors: FieldErrors,
    destination_errors: FieldErrors,
}

impl TransferWorkspace {
    pub fn new() -> Self {
        let source = SourceConfig::default();
        let destination = DestinationConfig::default();
        Self {
            source_errors: validate_source(&source),
            destination_errors: validate_destination(&destination),
            source,
            destination,
            direction: None,
            suggested_direction: None,
        }
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    pub fn destination(&self) -> &DestinationConfig {
        &self.destination
    }

    pub fn direction(&self) -> Option<TransferDirection> {
        self.direction
    }

    pub fn suggested_direction(&self) -> Option<TransferDirection> {
        self.suggested_direction
    }

    pub fn source_errors(&self) -> &FieldErrors {
        &self.source_errors
    }

    pub fn destination_errors(&self) -> &FieldErrors {
        &self.destination_errors
    }

    /// Replaces the source record wholesale and revalidates it.
    pub fn update_source(&mut self, config: SourceConfig) -> &FieldErrors {
        self.source_errors = validate_source(&config);
        self.source = config;
        debug!(invalid_fields = self.source_errors.len(), "source configuration updated");
        &self.source_errors
    }

    pub fn update_destination(&mut self, config: DestinationConfig) -> &FieldErrors {
        self.destination_errors = validate_destination(&config);
        self.destination = config;
        debug!(
            invalid_fields = self.destination_errors.len(),
            "destination configuration updated"
        );
        &self.destination_errors
    }

    pub fn set_direction(&mut self, direction: TransferDirection) {
        self.direction = Some(direction);
        if self.suggested_direction != Some(direction) {
            self.suggested_direction = None;
        }
    }

    pub fn clear_direction(&mut self) {
        self.direction = None;
        self.suggested_direction = None;
    }

    /// Applies the advisor's pick as if it had been selected by hand.
    pub async fn suggest_direction(
        &mut self,
        advisor: &dyn DirectionAdvisor,
    ) -> Result<TransferDirection> {
        let direction = advisor.suggest(&self.source, &self.destination).await?;
        self.direction = Some(direction);
        self.suggested_direction = Some(direction);
        Ok(direction)
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::evaluate(&self.source, &self.destination, self.direction)
    }

    pub fn is_ready(&self) -> bool {
        self.readiness().is_ready()
    }

    pub async fn start_transfer(
        &self,
        orchestrator: &Arc<TransferOrchestrator>,
    ) -> Result<RunId, TransferError> {
        orchestrator
            .start(&self.source, &self.destination, self.direction)
            .await
    }
}

#[cfg(test)]
#[path = "tests/workspace_tests.rs"]
mod tests;
