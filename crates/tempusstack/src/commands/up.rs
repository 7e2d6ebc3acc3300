use crate::{runtime, utils};
use colored::Colorize;
use std::path::Path;
use tempusstack_orchestrator::{SessionOutcome, ctrl_c_signals};

pub async fn handle(config: Option<&Path>, detached: bool, verbose: bool) -> anyhow::Result<()> {
    let (_, stack) = utils::load_stack_file(config)?;
    utils::print_services(&stack);

    println!();
    println!("{}", "Starting the services...".green());
    let runtime = runtime::connect().await?;
    let controller = utils::controller(runtime);

    // Ctrl+C は全サービスの起動後にだけ受ける（二度目以降は無視される）
    let outcome = controller
        .session(&stack, detached, verbose, ctrl_c_signals(), |started| {
            utils::print_started(started);
            println!();
            if !detached {
                println!(
                    "{}",
                    "Stack is running. Press Ctrl+C to stop and remove it.".bold()
                );
            }
        })
        .await;

    match outcome {
        Ok(SessionOutcome::Detached(_)) => {
            println!("{}", "All services have been started in the background.".green());
            println!("{}", "Use `tempusstack down` to stop and remove them.".dimmed());
        }
        Ok(SessionOutcome::TornDown { report, .. }) => {
            println!();
            println!("{}", "Stopping and removing tempusstack services...".yellow());
            utils::print_down_report(&report);
        }
        Err(e) => {
            eprintln!();
            eprintln!(
                "{}",
                "One or more services failed to start. Managed containers were cleaned up."
                    .red()
                    .bold()
            );
            return Err(e.into());
        }
    }

    Ok(())
}
