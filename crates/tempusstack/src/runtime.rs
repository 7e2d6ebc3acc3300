use colored::Colorize;
use tempusstack_container::{ContainerError, DockerRuntime};

/// Docker に接続する（失敗時は対処法を表示）
pub async fn connect() -> anyhow::Result<DockerRuntime> {
    match DockerRuntime::connect().await {
        Ok(runtime) => Ok(runtime),
        Err(e @ ContainerError::DockerConnectionFailed(_)) => {
            eprintln!();
            eprintln!("{}", "✗ Cannot reach the Docker daemon".red().bold());
            eprintln!();
            eprintln!("{}", "Try one of:".yellow());
            eprintln!("  • start Docker Desktop, OrbStack or the docker service");
            eprintln!("  • check that {} works", "docker ps".cyan());
            eprintln!("  • set {} if the socket lives elsewhere", "DOCKER_HOST".cyan());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
