//! List the first page of projects visible to a token.
//!
//! Usage: GITLAB_TOKEN=glpat-... cargo run --example fetch_projects

use anyhow::Context;
use gitlab_client::{ApiCache, GitLabClient};
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let token = std::env::var("GITLAB_TOKEN").context("GITLAB_TOKEN is not set")?;

    let mut client = GitLabClient::new(token);
    client.set_cache(Arc::new(Mutex::new(ApiCache::new())));

    let projects = client.read("projects", None).await?;
    for item in projects.as_list().unwrap_or_default() {
        if let Some(project) = item.as_record() {
            println!(
                "#{:<10} {}",
                project.get("id").and_then(|id| id.as_int()).unwrap_or(0),
                project.get_str("path_with_namespace").unwrap_or("?")
            );
        }
    }

    let stats = client.recorder().stats();
    println!("{} call(s), {:?} total", stats.calls, stats.total_duration);
    Ok(())
}
