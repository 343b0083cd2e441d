use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use davfixture_core::{FixtureConfig, FixtureServer, SeedFile, StartOptions};
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui::with_spinner;

/// How long `--wait` gives the server to open its port.
const READY_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run(
    config: FixtureConfig,
    port: Option<u16>,
    seed_paths: &[PathBuf],
    wait: bool,
) -> Result<()> {
    // Load seeds up front so a typo doesn't leave a half-started server
    let seeds = seed_paths
        .iter()
        .map(|path| {
            SeedFile::load(path)
                .with_context(|| format!("Failed to load seed file {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut server = FixtureServer::new(config)?;
    let port = server.start(StartOptions { port }).await?;

    // The server is running from here on; always close it, even on error
    let result = serve(&mut server, port, &seeds, wait).await;

    let status = with_spinner("Stopping fixture server", server.close()).await?;
    println!("{} ({})", "Fixture server stopped".dimmed(), status);

    result
}

async fn serve(
    server: &mut FixtureServer,
    port: u16,
    seeds: &[SeedFile],
    wait: bool,
) -> Result<()> {
    if wait {
        with_spinner(
            format!("Waiting for port {port}"),
            server.wait_until_listening(READY_TIMEOUT),
        )
        .await?;
    }

    for seed in seeds {
        server.seed(seed)?;
        println!("{}", seed.render());
    }
    if !seeds.is_empty() {
        let seeded: usize = seeds.iter().map(SeedFile::event_count).sum();
        println!("{}", format!("Seeded {seeded} event(s)").dimmed());
    }

    println!(
        "\n{} on {}",
        "CalDAV fixture server running".green(),
        format!("http://127.0.0.1:{port}/").bold()
    );
    println!("   config:  {}", server.config_path().display());
    println!("   storage: {}", server.storage_root().display());
    if let Some(pid) = server.pid() {
        println!("   pid:     {pid}");
    }
    println!("\n{}", "Press Ctrl-C to stop".dimmed());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    Ok(())
}
