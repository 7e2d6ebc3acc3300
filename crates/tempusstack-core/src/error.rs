use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackFileError {
    #[error(
        "stack file not found. searched:\n{}\nhint: pass --config <path> or set TEMPUSSTACK_CONFIG",
        format_list(.searched.iter().map(|p| p.display().to_string()))
    )]
    StackFileNotFound { searched: Vec<PathBuf> },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid or missing 'services' block.")]
    MissingServices,

    /// 静的検証で見つかった問題をすべてまとめたもの
    #[error("Config validation failed:\n{}", format_list(.errors.iter().cloned()))]
    Validation { errors: Vec<String> },
}

fn format_list(items: impl Iterator<Item = String>) -> String {
    items
        .map(|item| format!(" - {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, StackFileError>;
