use crate::{runtime, utils};
use colored::Colorize;

pub async fn handle() -> anyhow::Result<()> {
    let runtime = runtime::connect().await?;
    let containers = utils::controller(runtime).status().await?;

    if containers.is_empty() {
        println!("{}", "No tempusstack containers running.".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<16} {:<28} {:<14} {:<10} {}",
            "SERVICE", "NAME", "CONTAINER ID", "STATE", "PORTS"
        )
        .bold()
    );
    println!("{}", "─".repeat(86).dimmed());

    for c in &containers {
        let state = format!("{:<10}", c.state);
        let state = if c.state == "running" {
            state.green()
        } else {
            state.yellow()
        };
        let ports = if c.ports.is_empty() {
            "-".to_string()
        } else {
            c.ports.join(", ")
        };
        println!(
            "{} {:<28} {:<14} {} {}",
            format!("{:<16}", c.service).cyan(),
            c.container_name,
            c.short_id,
            state,
            ports
        );
    }

    Ok(())
}
