//! モデル定義
//!
//! スタックファイルから読み込まれ、オーケストレーション中は読み取り専用として扱われる。

mod service;
mod stack;

pub use service::*;
pub use stack::*;
