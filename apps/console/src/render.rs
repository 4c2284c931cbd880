//! Plain-text rendering of status, notices, validation and history.

use chrono::{DateTime, Local, Utc};
use shared::{
    domain::{HistoryEntry, TransferOutcome, TransferStatus},
    protocol::{Notice, NoticeLevel},
    validation::FieldErrors,
};

const PROGRESS_BAR_WIDTH: usize = 20;

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%b %-d, %Y, %H:%M:%S")
        .to_string()
}

pub fn progress_line(progress: u8) -> String {
    let progress = progress.min(100);
    let filled = usize::from(progress) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        " ".repeat(PROGRESS_BAR_WIDTH - filled),
        progress
    )
}

/// Banner text up to the first colon, as the status header shows it.
pub fn status_headline(status: TransferStatus, error: Option<&str>) -> String {
    let message = status.message(error);
    match message.split_once(':') {
        Some((head, _)) => head.to_string(),
        None => message,
    }
}

pub fn notice_line(notice: &Notice) -> String {
    let marker = match notice.level {
        NoticeLevel::Info => "i",
        NoticeLevel::Destructive => "!",
    };
    format!("[{marker}] {}: {}", notice.title, notice.description)
}

pub fn field_errors_block(title: &str, errors: &FieldErrors) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    let mut out = format!("{title}:");
    for (field, messages) in errors.iter() {
        if let Some(first) = messages.first() {
            out.push_str(&format!("\n  {field}: {first}"));
        }
    }
    Some(out)
}

pub fn history_table(entries: &[HistoryEntry]) -> String {
    let rows = entries
        .iter()
        .map(|entry| {
            [
                format_timestamp(&entry.timestamp),
                entry.source.clone(),
                "->".to_string(),
                entry.destination.clone(),
                entry.outcome.label().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let header = [
        "Timestamp".to_string(),
        "Source".to_string(),
        String::new(),
        "Destination".to_string(),
        "Status".to_string(),
    ];

    let mut widths = header.iter().map(String::len).collect::<Vec<_>>();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::from("Transfer History\n");
    out.push_str(&format_row(&header, &widths));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        out.push('\n');
        out.push_str(&format_row(row, &widths));
    }

    if entries.is_empty() {
        out.push_str("\nNo transfers recorded yet.");
    } else if entries
        .iter()
        .any(|entry| entry.outcome == TransferOutcome::Failure)
    {
        out.push_str("\nFor failed transfers, check console logs for more details (simulated).");
    }
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let last = cells.len().saturating_sub(1);
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(index, (cell, width))| {
            if index == last {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
