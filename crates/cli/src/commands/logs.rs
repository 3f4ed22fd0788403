//! `parley logs` — Print the interaction log.

use parley_config::AppConfig;
use parley_core::log::LogRecord;
use std::io::Write;
use std::path::Path;

pub async fn run(config_path: &Path, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_at(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let log = parley_log::build_from_config(&config.log)
        .await
        .map_err(|e| format!("Failed to open interaction log: {e}"))?;

    let records = log.read_all().await?;
    let shown = tail(&records, limit);

    let mut out = std::io::stdout();
    writeln!(out, "📜 Interaction Log ({})", config.log.backend)?;
    writeln!(out, "=====================")?;
    if shown.len() < records.len() {
        writeln!(out, "  Showing the last {} of {} records", shown.len(), records.len())?;
    }
    print_records(&mut out, shown)?;
    Ok(())
}

/// The last `limit` records, or all of them.
fn tail(records: &[LogRecord], limit: Option<usize>) -> &[LogRecord] {
    match limit {
        Some(n) if n < records.len() => &records[records.len() - n..],
        _ => records,
    }
}

/// One block per record: id and time, then the user and assistant lines.
pub fn print_records<W: Write>(out: &mut W, records: &[LogRecord]) -> std::io::Result<()> {
    if records.is_empty() {
        writeln!(out, "  No interactions logged yet.")?;
        return Ok(());
    }

    for record in records {
        writeln!(
            out,
            "  #{}  {}",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(out, "    User:      {}", record.user_text)?;
        writeln!(out, "    Assistant: {}", record.assistant_text)?;
    }
    Ok(())
}
