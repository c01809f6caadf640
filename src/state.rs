//! Lifecycle of a request as seen by a screen.
//!
//! A query is first lifted into [State] by [with_loading], then [observe] turns it into the
//! [ScreenState] sequence a screen delivers: always `Loading` first, then one `Render` or
//! `Error` per upstream result.

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};

use crate::pipeline::{DomainError, QueryStream};

pub use scope::Scope;

mod scope;

/// Request-scoped state, before it is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum State<T> {
    Loading,
    Success(T),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState<R> {
    Loading,
    Render(R),
    Error(DomainError),
}

impl<R> ScreenState<R> {
    /// Whether this state answers an upstream emission, as opposed to `Loading`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

pub type StateStream<T> = BoxStream<'static, Result<State<T>, DomainError>>;

/// Prefix a query with `Ok(State::Loading)` and wrap each success.
pub fn with_loading<T: Send + 'static>(results: QueryStream<T>) -> StateStream<T> {
    stream::once(future::ready(Ok(State::Loading)))
        .chain(results.map_ok(State::Success))
        .boxed()
}

/// Turn request states into screen states.
///
/// A leading `State::Loading` becomes the first `ScreenState::Loading`. When the source does not
/// start with one, a `Loading` is emitted anyway, so the first state is always `Loading`.
pub fn observe<S, T, R, F>(states: S, mut render: F) -> BoxStream<'static, ScreenState<R>>
where
    S: Stream<Item = Result<State<T>, DomainError>> + Send + 'static,
    F: FnMut(T) -> R + Send + 'static,
    R: Send + 'static,
{
    let rendered = states.enumerate().filter_map(move |(index, state)| {
        let screen = match state {
            Ok(State::Loading) if index == 0 => None,
            Ok(State::Loading) => Some(ScreenState::Loading),
            Ok(State::Success(data)) => Some(ScreenState::Render(render(data))),
            Err(error) => Some(ScreenState::Error(error)),
        };
        future::ready(screen)
    });

    stream::once(future::ready(ScreenState::Loading))
        .chain(rendered)
        .boxed()
}

#[cfg(test)]
mod tests {
    use crate::pipeline::{non_empty, wrap};

    use super::*;

    async fn screen_states<T: Send + 'static>(
        states: Vec<Result<State<T>, DomainError>>,
    ) -> Vec<ScreenState<T>> {
        observe(stream::iter(states), |data| data).collect().await
    }

    #[tokio::test]
    async fn leading_loading_is_forwarded_once() {
        let states = screen_states(vec![Ok(State::Loading), Ok(State::Success(7))]).await;
        assert_eq!(states, vec![ScreenState::Loading, ScreenState::Render(7)]);
    }

    #[tokio::test]
    async fn loading_is_synthesised_when_missing() {
        let states = screen_states(vec![
            Ok(State::Success(1)),
            Err(DomainError::DatabaseEmptyData),
        ])
        .await;

        assert_eq!(
            states,
            vec![
                ScreenState::Loading,
                ScreenState::Render(1),
                ScreenState::Error(DomainError::DatabaseEmptyData),
            ]
        );
    }

    #[tokio::test]
    async fn every_upstream_result_gets_one_terminal_state() {
        let upstream: Vec<Result<State<u8>, DomainError>> = vec![
            Ok(State::Loading),
            Ok(State::Success(1)),
            Err(DomainError::DatabaseEmptyData),
            Ok(State::Success(2)),
        ];
        let results = upstream.len() - 1;

        let states = screen_states(upstream).await;

        assert_eq!(states[0], ScreenState::Loading);
        assert_eq!(states.len(), results + 1);
        assert!(states[1..].iter().all(ScreenState::is_terminal));
    }

    #[tokio::test]
    async fn empty_list_after_loading_is_an_empty_data_error() {
        let source = stream::iter(vec![Ok::<_, String>(Some(Vec::<u32>::new()))]);
        let states: Vec<_> = with_loading(wrap(source, non_empty)).collect().await;

        assert_eq!(
            states,
            vec![Ok(State::Loading), Err(DomainError::DatabaseEmptyData)]
        );
    }
}
