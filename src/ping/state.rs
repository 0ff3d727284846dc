use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use futures::ready;
use parking_lot::Mutex;
use tokio::sync::oneshot::{Receiver, Sender, channel, error::RecvError};
use super::exec::Status;
use super::probe::Key;

#[derive(Debug)]
pub struct Echo(pub Instant, pub Status);

#[derive(Default)]
pub struct State(Mutex<HashMap<Key, Sender<Echo>>>);

pub struct Lease<'s> {
    state: &'s State,
    rx:    Receiver<Echo>,
    key:   Key,
}

impl State {
    pub fn insert(&self, key: Key) -> Lease<'_> {
        let (tx, rx) = channel();
        self.0.lock().insert(key, tx);
        Lease::new(self, rx, key)
    }

    pub fn remove(&self, key: &Key) -> Option<Sender<Echo>> {
        self.0.lock().remove(key)
    }

    pub fn reply(&self, key: &Key, echo: Echo) {
        if let Some(tx) = self.remove(key) {
            let _ = tx.send(echo);
        }
    }
}

impl<'s> Lease<'s> {
    fn new(state: &'s State, rx: Receiver<Echo>, key: Key) -> Self {
        Self { state, rx, key }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.state.remove(&self.key);
    }
}

impl Future for Lease<'_> {
    type Output = Result<Echo, RecvError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match ready!(Pin::new(&mut self.rx).poll(cx)) {
            Ok(echo) => Poll::Ready(Ok(echo)),
            Err(e)   => Poll::Ready(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::Duration;
    use tokio::time::timeout;
    use super::*;

    fn key(seq: u16) -> Key {
        Key(Ipv4Addr::LOCALHOST.into(), 1, seq)
    }

    #[tokio::test]
    async fn reply_resolves_matching_lease() {
        let state = State::default();
        let lease = state.insert(key(1));
        let other = state.insert(key(2));

        let now = Instant::now();
        state.reply(&key(1), Echo(now, Status::Success));

        let Echo(when, status) = lease.await.unwrap();
        assert_eq!(when, now);
        assert_eq!(status, Status::Success);

        let pending = timeout(Duration::from_millis(10), other).await;
        assert!(pending.is_err());
    }

    #[test]
    fn dropped_lease_releases_key() {
        let state = State::default();
        drop(state.insert(key(3)));
        assert!(state.remove(&key(3)).is_none());
    }

    #[test]
    fn unmatched_reply_is_ignored() {
        let state = State::default();
        let _lease = state.insert(key(4));
        state.reply(&key(5), Echo(Instant::now(), Status::Success));
        assert!(state.remove(&key(4)).is_some());
    }
}
