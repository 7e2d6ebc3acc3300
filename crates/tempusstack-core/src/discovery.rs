//! スタックファイル発見ロジック

use crate::error::{Result, StackFileError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// スタックファイルを直接指定する環境変数
pub const STACK_FILE_ENV: &str = "TEMPUSSTACK_CONFIG";

/// カレントディレクトリで探すファイル名（優先順）
pub const STACK_FILE_CANDIDATES: [&str; 2] = ["tempusstack.yaml", "tempusstack.yml"];

/// スタックファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 明示的な指定 (--config)
/// 2. 環境変数 TEMPUSSTACK_CONFIG
/// 3. カレントディレクトリ: tempusstack.yaml, tempusstack.yml
///
/// 1 と 2 は指定されたファイルが存在しなければその時点でエラーにする。
pub fn find_stack_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return existing(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(STACK_FILE_ENV) {
        debug!(env_path = %env_path, "Using {}", STACK_FILE_ENV);
        return existing(PathBuf::from(env_path));
    }

    let current_dir = std::env::current_dir().map_err(|e| StackFileError::Io {
        path: PathBuf::from("."),
        source: e,
    })?;
    find_stack_file_in(&current_dir)
}

/// 指定ディレクトリからスタックファイルを探す
pub fn find_stack_file_in(dir: &Path) -> Result<PathBuf> {
    let mut searched = Vec::with_capacity(STACK_FILE_CANDIDATES.len());
    for filename in STACK_FILE_CANDIDATES {
        let path = dir.join(filename);
        if path.is_file() {
            debug!(path = %path.display(), "Found stack file");
            return Ok(path);
        }
        searched.push(path);
    }

    Err(StackFileError::StackFileNotFound { searched })
}

fn existing(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(StackFileError::StackFileNotFound {
            searched: vec![path],
        })
    }
}
