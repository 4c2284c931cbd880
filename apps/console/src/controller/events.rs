//! Backend-to-UI events and error modeling for the console controller.

use shared::{
    domain::{HistoryEntry, TransferDirection},
    protocol::TransferEvent,
    validation::FieldErrors,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Source,
    Destination,
}

impl FormKind {
    pub fn title(self) -> &'static str {
        match self {
            FormKind::Source => "MSSQL Configuration",
            FormKind::Destination => "BigQuery Configuration",
        }
    }
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    Info(String),
    FieldErrors {
        form: FormKind,
        errors: FieldErrors,
    },
    DirectionChanged {
        direction: TransferDirection,
        suggested: bool,
    },
    Transfer(TransferEvent),
    History(Vec<HistoryEntry>),
    Error(UiError),
    BackendStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    SuggestDirection,
}

#[derive(Debug, Clone)]
pub struct UiError {
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn new(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
