use anyhow::Result;
use davfixture_core::{FixtureConfig, FixtureServer};

pub fn run(config: FixtureConfig, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.start_port);
    let server = FixtureServer::new(config)?;

    print!("{}", server.render_config(port)?);
    Ok(())
}
