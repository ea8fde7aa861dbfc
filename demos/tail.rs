//! Clones a repository into a throwaway playground, runs its dev command and
//! tails the output until the process exits or Ctrl-C is pressed.
//!
//! ```text
//! RUST_LOG=playvisor=debug cargo run --example tail -- https://github.com/user/repo "npm i && npm run dev"
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use playvisor::{Config, CreateGithub, LogWriter, Playgrounds, StartDev, Subscribe};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(repo_url) = args.next() else {
        bail!("usage: tail <repo-url> [run command]");
    };
    let command = args.next();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let pg = Playgrounds::builder(Config::from_env())
        .with_subscribers(subs)
        .build()
        .await
        .context("opening playground registry")?;

    let created = pg
        .create_github(CreateGithub {
            repo_url,
            run_command: command,
            port: None,
        })
        .await
        .context("creating playground")?;
    let id = created.id.clone();

    let mut feed = pg.subscribe();
    let outcome = pg.start_dev(StartDev::declared(id.clone())).await?;
    tracing::info!(pid = ?outcome.pid, command = %outcome.command, "tailing");

    tokio::select! {
        _ = async {
            while let Some(ev) = feed.recv_for(&id).await {
                if let Some(chunk) = ev.chunk() {
                    print!("{chunk}");
                }
                if ev.is_dev_exit() {
                    break;
                }
            }
        } => {}
        res = playvisor::wait_for_shutdown_signal() => res?,
    }

    pg.delete_playground(&id).await?;
    pg.shutdown().await;
    Ok(())
}
