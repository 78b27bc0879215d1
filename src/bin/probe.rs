//! Connect to a server, and print its task lists and their tasks.
//!
//! The connection is configured with the `TASKDAV_HOST`, `TASKDAV_USERNAME`, `TASKDAV_PASSWORD` and `TASKDAV_ALLOW_HTTP` environment variables.

use std::env;

use taskdav::traits::TaskBackend;
use taskdav::{BackendConfig, Client};

fn env_var(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut config = BackendConfig::new(env_var("TASKDAV_HOST"), env_var("TASKDAV_USERNAME"), env_var("TASKDAV_PASSWORD"));
    config.allow_http = matches!(env_var("TASKDAV_ALLOW_HTTP").to_lowercase().as_str(), "1" | "true" | "yes");

    if let Err(err) = run(config).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(config: BackendConfig) -> Result<(), taskdav::Error> {
    let client = Client::new(config)?;
    println!("Server: {}", client.base_url());

    for list in client.list_calendars().await? {
        let kind = if list.is_subscription() { " (subscription)" } else { "" };
        println!("{}\t{}{}", list.id, list.name, kind);

        for task in client.list_tasks(&list.id).await? {
            let parent = task.parent_id.as_deref().map(|p| format!(" (subtask of {})", p)).unwrap_or_default();
            println!("  [{}] {}\t{}{}", task.status, task.id, task.summary, parent);
        }
    }
    Ok(())
}
