//! Backend worker: owns the tokio runtime, the form state and the orchestrator.

use std::thread;

use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast::error::RecvError;
use transfer_core::{RandomDirectionAdvisor, Settings, TransferOrchestrator, TransferWorkspace};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{FormKind, UiError, UiErrorContext, UiEvent};

pub fn launch(
    settings: Settings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::new(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                let _ = ui_tx.send(UiEvent::BackendStopped);
                return;
            }
        };

        runtime.block_on(run_backend(settings, cmd_rx, ui_tx.clone()));
        let _ = ui_tx.send(UiEvent::BackendStopped);
    })
}

async fn run_backend(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let orchestrator = TransferOrchestrator::new(&settings);
    // Offset so the advisor and the outcome draw do not share a stream.
    let advisor = RandomDirectionAdvisor::new(settings.seed.map(|seed| seed.wrapping_add(1)));
    let mut workspace = TransferWorkspace::new();

    let mut events = orchestrator.subscribe();
    let forward_tx = ui_tx.clone();
    let forwarder = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    // Blocking send: terminal events must reach the UI.
                    if forward_tx.send(UiEvent::Transfer(event)).is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "ui bridge fell behind transfer events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

    while let Ok(cmd) = cmd_rx.recv() {
        tracing::debug!(command = cmd.name(), "backend command received");
        match cmd {
            BackendCommand::UpdateSource(config) => {
                let errors = workspace.update_source(config).clone();
                let _ = ui_tx.try_send(UiEvent::FieldErrors {
                    form: FormKind::Source,
                    errors,
                });
            }
            BackendCommand::UpdateDestination(config) => {
                let errors = workspace.update_destination(config).clone();
                let _ = ui_tx.try_send(UiEvent::FieldErrors {
                    form: FormKind::Destination,
                    errors,
                });
            }
            BackendCommand::SetDirection(direction) => {
                workspace.set_direction(direction);
                let _ = ui_tx.try_send(UiEvent::DirectionChanged {
                    direction,
                    suggested: false,
                });
            }
            BackendCommand::SuggestDirection => match workspace.suggest_direction(&advisor).await {
                Ok(direction) => {
                    let _ = ui_tx.try_send(UiEvent::DirectionChanged {
                        direction,
                        suggested: true,
                    });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::new(
                        UiErrorContext::SuggestDirection,
                        err.to_string(),
                    )));
                }
            },
            BackendCommand::StartTransfer => {
                // Rejections reach the UI as forwarded events, in order with their notice.
                if let Err(err) = workspace.start_transfer(&orchestrator).await {
                    tracing::debug!(error = %err, "start request rejected");
                }
            }
            BackendCommand::RequestHistory => {
                let _ = ui_tx.send(UiEvent::History(orchestrator.history().await));
            }
            BackendCommand::Shutdown => break,
        }
    }

    orchestrator.cancel().await;
    drop(orchestrator);
    if let Err(err) = forwarder.await {
        tracing::warn!("transfer event forwarder ended abnormally: {err}");
    }
}
