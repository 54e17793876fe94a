// src/bin/sync.rs
// Triggers a full Firestore import on a running visiboard-backend
use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::{Duration, Instant};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponse {
    project_id: String,
    users_imported: u32,
    placeholder_users: u32,
    notes_imported: u32,
    notes_skipped: u32,
    comments_imported: u32,
    comments_skipped: u32,
    #[serde(default)]
    follows_imported: u32,
    #[serde(default)]
    messages_imported: u32,
    #[serde(default)]
    errors: Vec<String>,
    duration_seconds: u64,
}

struct SyncRunner {
    base_url: String,
    admin_token: String,
    client: Client,
}

impl SyncRunner {
    fn new(base_url: String, admin_token: String) -> Result<Self> {
        // a full import can take minutes on large projects
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_token,
            client,
        })
    }

    async fn check_service_health(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn trigger_sync(&self) -> Result<SyncResponse> {
        let response = self
            .client
            .post(format!("{}/api/admin/sync", self.base_url))
            .header("X-Admin-Token", &self.admin_token)
            .send()
            .await
            .context("Sync request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("HTTP {} - {}", status, body);
        }

        response
            .json::<SyncResponse>()
            .await
            .context("Failed to parse response JSON")
    }

    fn print_summary(&self, stats: &SyncResponse, elapsed: f64) {
        println!("\n{}Firestore import: {}{}", BOLD, stats.project_id, RESET);
        println!("──────────────────────────────────────────────");
        println!("  Users imported:     {}{}{}", GREEN, stats.users_imported, RESET);
        println!("  Placeholder users:  {}", stats.placeholder_users);
        println!("  Notes imported:     {}{}{}", GREEN, stats.notes_imported, RESET);
        println!("  Notes skipped:      {}{}{}", YELLOW, stats.notes_skipped, RESET);
        println!("  Comments imported:  {}{}{}", GREEN, stats.comments_imported, RESET);
        println!("  Comments skipped:   {}{}{}", YELLOW, stats.comments_skipped, RESET);
        println!("  Follows imported:   {}{}{}", GREEN, stats.follows_imported, RESET);
        println!("  Messages imported:  {}{}{}", GREEN, stats.messages_imported, RESET);
        println!(
            "  Duration:           {}s server, {:.1}s total",
            stats.duration_seconds, elapsed
        );
        println!("──────────────────────────────────────────────");

        if !stats.errors.is_empty() {
            println!("{}{} documents failed:{}", YELLOW, stats.errors.len(), RESET);
            for err in &stats.errors {
                println!("  • {}", err);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let admin_token = env::var("ADMIN_TOKEN").context("ADMIN_TOKEN must be set in .env")?;
    let base_url =
        env::var("VISIBOARD_API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

    let runner = SyncRunner::new(base_url, admin_token)?;

    println!("{}Checking service status...{}", CYAN, RESET);
    if !runner.check_service_health().await {
        println!("{}Service unavailable at {}{}", RED, runner.base_url, RESET);
        bail!("visiboard-backend is not reachable");
    }

    println!("{}Starting Firestore import...{}", CYAN, RESET);
    let start = Instant::now();
    let stats = runner.trigger_sync().await?;
    runner.print_summary(&stats, start.elapsed().as_secs_f64());

    Ok(())
}
