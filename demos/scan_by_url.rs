//! Scan-by-URL example demonstrating the full submission lifecycle.
//!
//! This example shows how to:
//! - Build a client from the environment (`WEBAV_API_KEY`, optional `WEBAV_BASE_URL`)
//! - Submit a public URL for scanning
//! - Query the status once, then wait for the verdict
//! - List recently scanned files
//!
//! Run with: cargo run --example scan_by_url -- https://link.testfile.org/15MB

use webav::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webav=info".into()),
        )
        .init();

    let file_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://link.testfile.org/15MB".to_string());

    let client = WebAv::from_env()?;

    // The file is queued and scanned asynchronously.
    let queued = client.scan_by_url(&file_url).await?;
    println!(
        "Queued {} -> {} ({})",
        queued.id, queued.virus_status_label, queued.virus_status.code()
    );

    let current = client.get_status(&queued.id).await?;
    println!("Current status: {}", current.virus_status_label);

    // Large files may take several minutes.
    match client.wait_for(&queued.id).await {
        Ok(result) => match result.virus_status {
            VirusStatus::Passed => println!("\n✅ File PASSED"),
            VirusStatus::Virus => println!("\n❌ File contains a VIRUS"),
            other => println!("\n⚠️  Scan finished with status: {other}"),
        },
        Err(WebAvError::Timeout { timeout, .. }) => {
            println!("\n⏳ Still pending after {timeout:?}; check back later");
        }
        Err(e) => return Err(e.into()),
    }

    let page = client.get_recent_statuses(None).await?;
    println!(
        "\n=== Recent files (page {}/{}, {} total) ===",
        page.current_page, page.last_page, page.total
    );
    for file in &page.data {
        println!("{}  {:<8} ({})", file.id, file.virus_status_label, file.virus_status.code());
    }

    Ok(())
}
