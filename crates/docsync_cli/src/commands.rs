//! Subcommand handlers
//!
//! Each handler returns the text to print so it can be checked without a
//! terminal.

use crate::state::AppState;
use anyhow::bail;
use docsync::{OperationId, QueuedOperation, SyncStatusInfo};
use std::fmt::Write;
use store::SettingsManager;

pub fn status(state: &AppState, online: bool, json: bool) -> anyhow::Result<String> {
    let info = SyncStatusInfo::new(online, &state.queue.operations());
    if json {
        return Ok(serde_json::to_string_pretty(&info)?);
    }

    let mut out = String::new();
    writeln!(out, "{}: {}", info.short_status(), info.status_message)?;
    writeln!(out, "Pending: {}", info.pending_count)?;
    write!(out, "Failed: {}", info.failed_count)?;
    for failed in &info.failed {
        write!(
            out,
            "\n  {} {} ({}): {}",
            failed.id,
            failed.kind,
            failed.name,
            failed.error.as_deref().unwrap_or("unknown error")
        )?;
    }
    Ok(out)
}

fn describe(op: &QueuedOperation) -> String {
    let mut line = format!(
        "{} {:<9} {:<6} {}",
        op.id(),
        op.status().as_str(),
        op.kind().as_str(),
        op.display_name()
    );
    if let Some(error) = op.error() {
        line.push_str(" - ");
        line.push_str(error);
    }
    line
}

pub fn list(state: &AppState, json: bool) -> anyhow::Result<String> {
    let operations = state.queue.operations();
    if json {
        return Ok(serde_json::to_string_pretty(&operations)?);
    }
    if operations.is_empty() {
        return Ok("Queue is empty".to_string());
    }
    Ok(operations.iter().map(describe).collect::<Vec<_>>().join("\n"))
}

pub fn retry(state: &AppState, id: &str) -> anyhow::Result<String> {
    let id = OperationId::from(id);
    if !state.queue.retry(&id) {
        bail!("no queued operation with id {id}");
    }
    Ok(format!("Operation {id} will be retried on the next sync"))
}

pub fn remove(state: &AppState, id: &str) -> anyhow::Result<String> {
    let id = OperationId::from(id);
    if !state.queue.remove(&id) {
        bail!("no queued operation with id {id}");
    }
    Ok(format!("Removed operation {id}"))
}

pub fn clear_succeeded(state: &AppState) -> String {
    let removed = state.queue.clear_succeeded();
    format!("Removed {removed} succeeded operation(s)")
}

pub fn cache(state: &AppState, json: bool) -> anyhow::Result<String> {
    let documents = state.cache.get();
    if json {
        return Ok(serde_json::to_string_pretty(&documents)?);
    }
    if documents.is_empty() {
        return Ok("No cached documents".to_string());
    }

    let mut out = String::new();
    for doc in &documents {
        if !out.is_empty() {
            out.push('\n');
        }
        write!(
            out,
            "#{} {} ({}, {} bytes) by {}, {}",
            doc.id,
            doc.name,
            doc.file_type,
            doc.size,
            doc.author,
            doc.uploaded_at.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(out)
}

pub fn clear_cache(state: &AppState) -> String {
    state.cache.clear();
    "Cleared cached document listing".to_string()
}

#[derive(clap::Args, Debug, Default)]
pub struct ConfigArgs {
    /// Restore every setting to its default
    #[arg(long, conflicts_with_all = ["cleanup_delay_ms", "max_upload_bytes"])]
    pub reset: bool,
    /// Delay before succeeded operations are dropped, in milliseconds
    #[arg(long)]
    pub cleanup_delay_ms: Option<u64>,
    /// Largest document body accepted into the offline queue, in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

pub fn config(
    settings: &mut SettingsManager,
    args: &ConfigArgs,
    json: bool,
) -> anyhow::Result<String> {
    if args.reset {
        settings.reset()?;
    } else if args.cleanup_delay_ms.is_some() || args.max_upload_bytes.is_some() {
        let mut updated = settings.get().clone();
        if let Some(delay) = args.cleanup_delay_ms {
            updated.offline.cleanup_delay_ms = delay;
        }
        if let Some(limit) = args.max_upload_bytes {
            updated.offline.max_upload_bytes = limit;
        }
        settings.update(updated)?;
    }

    let current = serde_json::to_string_pretty(settings.get())?;
    if json {
        return Ok(current);
    }
    Ok(format!(
        "Settings file: {}\n{current}",
        settings.settings_path().display()
    ))
}
