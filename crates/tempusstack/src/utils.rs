use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempusstack_container::{DockerRuntime, ManagedContainerRef};
use tempusstack_core::{StackSpec, find_stack_file, load_stack};
use tempusstack_orchestrator::{
    DownReport, LifecycleController, OrchestratorSettings, StackOrchestrator,
};

/// スタックファイルを探して読み込む
pub fn load_stack_file(config: Option<&Path>) -> anyhow::Result<(PathBuf, StackSpec)> {
    let path = find_stack_file(config)?;
    let stack = load_stack(&path)?;
    println!("📄 {}", path.display().to_string().cyan());
    Ok((path, stack))
}

pub fn controller(runtime: DockerRuntime) -> LifecycleController {
    let orchestrator = StackOrchestrator::new(Arc::new(runtime), OrchestratorSettings::default());
    LifecycleController::new(orchestrator)
}

pub fn print_services(stack: &StackSpec) {
    println!();
    println!("{}", format!("Services ({}):", stack.len()).bold());
    for service in stack.services() {
        let detail = match service.service_type.as_str() {
            "mock" => service
                .file
                .as_ref()
                .map(|f| f.display().to_string())
                .unwrap_or_default(),
            _ => service.image.clone().unwrap_or_default(),
        };
        let port = service
            .port
            .map(|p| p.to_string())
            .unwrap_or_else(|| "not mapped".to_string());
        println!(
            "  • {} [{}] {} (port: {})",
            service.name.cyan(),
            service.service_type,
            detail.dimmed(),
            port
        );
    }
}

pub fn print_started(started: &[ManagedContainerRef]) {
    println!();
    for container in started {
        println!(
            "  ✓ {} ({})",
            container.service.green(),
            container.short_id().dimmed()
        );
    }
}

pub fn print_down_report(report: &DownReport) {
    if report.nothing_found() {
        println!("{}", "No tempusstack containers found.".yellow());
        return;
    }

    for (container, message) in &report.errors {
        eprintln!("  {} {}: {}", "✗".red(), container, message);
    }

    println!(
        "{}",
        format!(
            "Removed {} of {} tempusstack container(s).",
            report.removed, report.found
        )
        .green()
    );

    if report.stragglers > 0 {
        eprintln!(
            "{}",
            format!(
                "⚠ {} container(s) still present after cleanup. Check `docker ps -a`.",
                report.stragglers
            )
            .yellow()
        );
    }
}
