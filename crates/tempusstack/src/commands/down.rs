use crate::{runtime, utils};
use colored::Colorize;

pub async fn handle(verbose: bool) -> anyhow::Result<()> {
    println!("{}", "Stopping and removing tempusstack services...".yellow());

    let runtime = runtime::connect().await?;
    let report = utils::controller(runtime).down(verbose).await;
    utils::print_down_report(&report);

    Ok(())
}
