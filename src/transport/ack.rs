//! Acknowledgment wait bound to a single outstanding write

use futures::ready;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Sleep, sleep};

/// Resolution of an acknowledgment wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckResult {
    /// Notification payload received from the device.
    Acked(Vec<u8>),
    TimedOut,
}

pin_project! {
    /// Future resolving to the first notification or to the deadline, whichever comes first.
    ///
    /// It holds the notification receiver mutably, so only one wait can
    /// exist at a time. A closed channel never acknowledges; the wait then
    /// simply runs to its deadline.
    pub struct AckFuture<'a> {
        notifications: &'a mut mpsc::Receiver<Vec<u8>>,
        #[pin]
        deadline: Sleep,
        closed: bool,
    }
}

impl<'a> AckFuture<'a> {
    pub fn new(notifications: &'a mut mpsc::Receiver<Vec<u8>>, timeout: Duration) -> Self {
        Self { notifications, deadline: sleep(timeout), closed: false }
    }
}

impl Future for AckFuture<'_> {
    type Output = AckResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if !*this.closed {
            match this.notifications.poll_recv(cx) {
                Poll::Ready(Some(data)) => return Poll::Ready(AckResult::Acked(data)),
                Poll::Ready(None) => *this.closed = true,
                Poll::Pending => {}
            }
        }

        ready!(this.deadline.poll(cx));
        Poll::Ready(AckResult::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn resolves_on_notification() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(vec![0x01, 0x02]).await.unwrap();
        let result = AckFuture::new(&mut rx, Duration::from_millis(750)).await;
        assert_eq!(result, AckResult::Acked(vec![0x01, 0x02]));
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_on_deadline() {
        let (_tx, mut rx) = mpsc::channel::<Vec<u8>>(4);
        let start = tokio::time::Instant::now();
        let result = AckFuture::new(&mut rx, Duration::from_millis(750)).await;
        assert_eq!(result, AckResult::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_channel_waits_full_deadline() {
        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(4);
        drop(tx);
        let start = tokio::time::Instant::now();
        let result = AckFuture::new(&mut rx, Duration::from_millis(300)).await;
        assert_eq!(result, AckResult::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn late_notification_within_deadline_wins() {
        let (tx, mut rx) = mpsc::channel(4);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = tx.send(vec![0xAA]).await;
        });
        let result = AckFuture::new(&mut rx, Duration::from_millis(750)).await;
        assert_eq!(result, AckResult::Acked(vec![0xAA]));
    }
}
