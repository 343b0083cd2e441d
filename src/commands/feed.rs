use std::path::Path;

use anyhow::{Context, Result};
use davfixture_core::SeedFile;
use davfixture_core::ics::render_feed;

pub fn run(seed_path: &Path, identity: Option<&str>) -> Result<()> {
    let seed = SeedFile::load(seed_path)
        .with_context(|| format!("Failed to load seed file {}", seed_path.display()))?;

    if let Some(identity) = identity {
        let events = seed.identities.get(identity).with_context(|| {
            let available: Vec<_> = seed.iter().map(|(id, _)| id).collect();
            format!(
                "Identity '{}' not found. Available: {}",
                identity,
                available.join(", ")
            )
        })?;
        print!("{}", render_feed(identity, events)?);
        return Ok(());
    }

    for (identity, events) in seed.iter() {
        print!("{}", render_feed(identity, events)?);
    }

    Ok(())
}
