use crate::{runtime, utils};
use colored::Colorize;

pub async fn handle(service: &str, verbose: bool) -> anyhow::Result<()> {
    println!("{}", format!("Restarting '{}'...", service).yellow());

    let runtime = runtime::connect().await?;
    let restarted = utils::controller(runtime).restart(service, verbose).await?;

    println!(
        "  ✓ {} restarted ({})",
        restarted.container_name.green(),
        restarted.short_id().dimmed()
    );
    Ok(())
}
