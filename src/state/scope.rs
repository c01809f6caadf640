use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::select;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::instrument;

use super::*;

type Deliver<R> = Arc<dyn Fn(ScreenState<R>) + Send + Sync>;

/// Owner of the in-flight requests of one screen.
///
/// Each logical query runs under a key. Launching a key again stops the previous request
/// before the new one starts, so a superseded request never delivers after its replacement.
/// Dropping the scope stops every request.
pub struct Scope<R> {
    deliver: Deliver<R>,
    requests: DashMap<String, Request>,
}

impl<R> fmt::Debug for Scope<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.requests.iter().map(|entry| entry.key().clone()).collect();
        f.debug_struct("Scope").field("requests", &keys).finish()
    }
}

impl<R: Send + 'static> Scope<R> {
    pub fn new(deliver: impl Fn(ScreenState<R>) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
            requests: DashMap::new(),
        }
    }

    /// Deliver every state of `states` under `key`, replacing whatever ran under it.
    ///
    /// # Panics
    ///
    /// When called outside of a tokio runtime.
    #[instrument(skip(self, states))]
    pub async fn launch(&self, key: &str, states: BoxStream<'static, ScreenState<R>>) {
        if let Some((_key, request)) = self.requests.remove(key) {
            tracing::debug!("request `{}` is still running, stopping it", key);
            request.stop().await;
        }

        let request = Request::start(key.to_string(), states, self.deliver.clone());
        self.requests.insert(key.to_string(), request);
    }

    /// Stop the request running under `key`. Returns whether there was one.
    #[instrument(skip(self))]
    pub async fn cancel(&self, key: &str) -> bool {
        match self.requests.remove(key) {
            Some((_key, request)) => {
                request.stop().await;
                true
            }
            None => false,
        }
    }

    /// Wait until the request under `key` has delivered its last state.
    pub async fn join(&self, key: &str) {
        if let Some((_key, request)) = self.requests.remove(key) {
            request.finish().await;
        }
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.requests
            .get(key)
            .is_some_and(|request| !request.handle.is_finished())
    }

    pub async fn cancel_all(&self) {
        let keys: Vec<String> = self.requests.iter().map(|entry| entry.key().clone()).collect();

        for key in keys {
            self.cancel(&key).await;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Message {
    Stop,
}

#[derive(Debug)]
struct Request {
    tx: mpsc::Sender<Message>,
    handle: JoinHandle<()>,
}

impl Request {
    fn start<R: Send + 'static>(
        key: String, mut states: BoxStream<'static, ScreenState<R>>, deliver: Deliver<R>,
    ) -> Self {
        let (tx, mut message) = mpsc::channel(1);

        let handle = tokio::spawn(async move {
            tracing::debug!("start request `{}`", key);

            loop {
                select! {
                    biased;
                    // a closed channel means the scope is gone
                    _ = message.recv() => break,
                    state = states.next() => match state {
                        Some(state) => deliver(state),
                        None => break,
                    },
                }
            }

            tracing::debug!("request `{}` is done", key);
        });

        Self { tx, handle }
    }

    async fn stop(self) {
        let _ = self.tx.send(Message::Stop).await;
        self.finish().await;
    }

    async fn finish(self) {
        if let Err(error) = self.handle.await {
            tracing::warn!(error = ?error, "request task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::stream;

    use super::*;

    fn recording() -> (Scope<u32>, mpsc::UnboundedReceiver<ScreenState<u32>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scope = Scope::new(move |state| {
            let _ = tx.send(state);
        });
        (scope, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ScreenState<u32>>) -> Vec<ScreenState<u32>> {
        let mut states = Vec::new();
        while let Ok(state) = rx.try_recv() {
            states.push(state);
        }
        states
    }

    #[tokio::test]
    async fn delivers_states_in_order() {
        let (scope, mut rx) = recording();
        let states = stream::iter(vec![ScreenState::Loading, ScreenState::Render(1)]).boxed();

        scope.launch("list", states).await;
        scope.join("list").await;

        assert_eq!(drain(&mut rx), vec![ScreenState::Loading, ScreenState::Render(1)]);
    }

    #[tokio::test]
    async fn relaunching_a_key_stops_the_previous_request() {
        let (scope, mut rx) = recording();

        let endless = stream::once(async { ScreenState::Loading })
            .chain(stream::pending())
            .boxed();
        scope.launch("chart", endless).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        scope
            .launch("chart", stream::iter(vec![ScreenState::Render(2)]).boxed())
            .await;
        scope.join("chart").await;

        assert_eq!(drain(&mut rx), vec![ScreenState::Loading, ScreenState::Render(2)]);
    }

    #[tokio::test]
    async fn cancel_stops_delivery() {
        let (scope, mut rx) = recording();
        scope.launch("chart", stream::pending().boxed()).await;

        assert!(scope.is_running("chart"));
        assert!(scope.cancel("chart").await);
        assert!(!scope.is_running("chart"));
        assert!(!scope.cancel("chart").await);
        assert!(drain(&mut rx).is_empty());
    }
}
