use crate::error::CliError;
use engine_core::progress::DatasetStatus;
use serde::Serialize;

pub async fn write_report<T: Serialize>(report: &T, path: &str) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

pub fn print_report<T: Serialize>(report: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

pub fn print_status_table(status: &DatasetStatus) {
    println!("Status for dataset '{}': {}", status.dataset, status.stage);
    println!(
        "completed {} / failed {} / in flight {}",
        status.completed, status.failed, status.in_flight
    );
    println!("{:-<72}", "");
    println!(
        "{:<12} {:<12} {:>8}  {:<25} {}",
        "Partition", "State", "Attempts", "Updated", "Last error"
    );
    for p in &status.partitions {
        println!(
            "{:<12} {:<12} {:>8}  {:<25} {}",
            p.key,
            p.state,
            p.attempts,
            p.updated_at.format("%Y-%m-%d %H:%M:%S"),
            p.last_error.as_deref().unwrap_or("")
        );
    }
}
