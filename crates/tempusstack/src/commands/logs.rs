use crate::{runtime, utils};
use colored::Colorize;
use tempusstack_container::LogOptions;
use tempusstack_orchestrator::{ctrl_c_signals, forward_interrupts};

pub async fn handle(service: &str, follow: bool, tail: usize) -> anyhow::Result<()> {
    let runtime = runtime::connect().await?;
    let controller = utils::controller(runtime);

    if follow {
        // Ctrl+C で転送を止めて正常終了する
        tokio::spawn(forward_interrupts(controller.gate(), ctrl_c_signals()));
    } else {
        eprintln!("{}", format!("=== logs: {} ===", service).bold());
    }

    let options = LogOptions {
        follow,
        tail: Some(tail),
    };
    let mut stdout = tokio::io::stdout();
    controller.logs(service, &options, &mut stdout).await?;

    Ok(())
}
