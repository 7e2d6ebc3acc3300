//! コンテナログの転送

use crate::error::Result;
use tempusstack_container::LogStream;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 上流が終わるか `cancel` が発火するまでログを書き出し、転送したバイト数を返す
///
/// 書き込みが詰まれば受信も止まり、有界チャネルの向こうの読み取りも止まる。
/// 終了時は受信側を閉じ、出力をフラッシュする。
pub async fn relay_logs<W>(
    stream: &mut LogStream,
    sink: &mut W,
    cancel: &CancellationToken,
) -> Result<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0;

    let outcome: Result<()> = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Log relay cancelled");
                break Ok(());
            }
            chunk = stream.recv() => match chunk {
                Some(Ok(chunk)) => {
                    if let Err(e) = sink.write_all(&chunk.message).await {
                        break Err(e.into());
                    }
                    written += chunk.message.len();
                }
                Some(Err(e)) => break Err(e.into()),
                None => {
                    debug!("Log stream ended");
                    break Ok(());
                }
            }
        }
    };

    stream.close();
    sink.flush().await?;
    outcome.map(|()| written)
}

/// 上流が終わるまで全て受け取り、一度に書き出す
pub async fn write_buffered_logs<W>(stream: &mut LogStream, sink: &mut W) -> Result<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.recv().await {
        buffer.extend_from_slice(&chunk?.message);
    }

    sink.write_all(&buffer).await?;
    sink.flush().await?;
    Ok(buffer.len())
}
