use crate::utils;
use colored::Colorize;
use std::path::Path;

/// スタックファイルを検証する（Docker には接続しない）
pub fn handle(config: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "Validating the stack file...".blue());

    let (_, stack) = utils::load_stack_file(config)?;
    utils::print_services(&stack);

    println!();
    if stack.is_empty() {
        println!("{}", "⚠ The stack has no services.".yellow());
    }
    println!("{}", "✓ Stack file is valid".green().bold());
    Ok(())
}
