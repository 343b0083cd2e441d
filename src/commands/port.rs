use anyhow::Result;
use davfixture_core::port::find_free_port;

pub async fn run(start: u16) -> Result<()> {
    let port = find_free_port(start).await?;
    println!("{port}");
    Ok(())
}
