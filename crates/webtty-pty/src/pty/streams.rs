//! Consumer ends of a spawned pty: the output sequence and the exit notification.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};

use super::types::ExitInfo;

/// Output chunks in the order the pty produced them.
///
/// Ends (`None`) once the reader thread hits EOF, which happens after the
/// child and every process sharing its terminal have exited. The queue is
/// bounded: if it is not drained the reader thread blocks and the kernel pty
/// buffer eventually stalls the child.
pub struct PtyOutput {
    pub(super) rx: mpsc::Receiver<Vec<u8>>,
}

impl PtyOutput {
    /// Wait for the next chunk.
    pub async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

/// Resolves exactly once, with the child's exit status.
///
/// Poll it to completion only once; it is meant to sit in a `select!` until
/// it fires.
pub struct PtyExit {
    pub(super) rx: oneshot::Receiver<ExitInfo>,
}

impl Future for PtyExit {
    type Output = ExitInfo;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or_else(|_| ExitInfo::unknown()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn output_preserves_order() {
        let (tx, rx) = mpsc::channel(4);
        let mut output = PtyOutput { rx };
        tx.send(b"one".to_vec()).await.unwrap();
        tx.send(b"two".to_vec()).await.unwrap();
        drop(tx);

        assert_eq!(output.next_chunk().await.unwrap(), b"one");
        assert_eq!(output.next_chunk().await.unwrap(), b"two");
        assert!(output.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn exit_resolves_with_status() {
        let (tx, rx) = oneshot::channel();
        let exit = PtyExit { rx };
        tx.send(ExitInfo {
            code: 7,
            signal: None,
        })
        .unwrap();
        assert_eq!(exit.await.code, 7);
    }

    #[tokio::test]
    async fn exit_without_sender_is_unknown() {
        let (tx, rx) = oneshot::channel::<ExitInfo>();
        drop(tx);
        let exit = PtyExit { rx };
        assert_eq!(exit.await, ExitInfo::unknown());
    }
}
