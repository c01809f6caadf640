//! Conversion of raw query streams into streams of domain results.
//!
//! This is the only place where failures of the datasource or of a mapping step turn into a
//! [DomainError]. Upstream code (mappers, aggregation) is pure; downstream code only ever sees
//! `Result<_, DomainError>`.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use futures::future;
use futures::stream::{BoxStream, Stream, StreamExt};
use snafu::Snafu;

/// Stream of domain results handed to the request state machine.
pub type QueryStream<T> = BoxStream<'static, Result<T, DomainError>>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum DomainError {
    /// The query ran but produced nothing usable.
    #[snafu(display("the database holds no data for this query"))]
    DatabaseEmptyData,

    /// Retrieving or transforming the data failed.
    #[snafu(display("failed to load data from the database: {description}"))]
    DatabaseDomainError { description: String },
}

impl DomainError {
    pub fn domain(description: impl Display) -> Self {
        Self::DatabaseDomainError {
            description: description.to_string(),
        }
    }

    pub fn is_empty_data(&self) -> bool {
        matches!(self, Self::DatabaseEmptyData)
    }
}

/// Text of a panic payload, as passed to `panic!`.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "mapping panicked".to_string()
    }
}

/// Run a mapping step, turning a panic into [DomainError::DatabaseDomainError].
///
/// The panic still reaches the process panic hook first; the binary installs one that reports it
/// as a tracing event.
fn guarded<R>(mapping: impl FnOnce() -> R) -> Result<R, DomainError> {
    panic::catch_unwind(AssertUnwindSafe(mapping))
        .map_err(|payload| DomainError::domain(panic_message(payload.as_ref())))
}

/// Forward results until the first [DomainError::DatabaseDomainError], which is the last item.
fn until_failure<R>(
    results: impl Stream<Item = Result<R, DomainError>> + Send + 'static,
) -> QueryStream<R>
where
    R: Send + 'static,
{
    results
        .scan(false, |failed, result| {
            if *failed {
                return future::ready(None);
            }

            if let Err(error @ DomainError::DatabaseDomainError { .. }) = &result {
                tracing::error!(error = %error, "query stream failed, closing it");
                *failed = true;
            }

            future::ready(Some(result))
        })
        .boxed()
}

/// Wrap a stream of optional values into a stream of domain results.
///
/// Every item becomes exactly one result:
/// - an absent value, or one `validate` reports as invalid, is [DomainError::DatabaseEmptyData];
/// - a valid value is `Ok` with what `validate` mapped it to;
/// - a source error, or a panic inside `validate`, is a single [DomainError::DatabaseDomainError]
///   after which the stream ends.
pub fn wrap<S, T, E, R, F>(source: S, mut validate: F) -> QueryStream<R>
where
    S: Stream<Item = Result<Option<T>, E>> + Send + 'static,
    E: Display,
    F: FnMut(T) -> (bool, R) + Send + 'static,
    R: Send + 'static,
{
    let results = source.map(move |item| match item {
        Err(error) => Err(DomainError::domain(error)),
        Ok(None) => Err(DomainError::DatabaseEmptyData),
        Ok(Some(value)) => match guarded(|| validate(value))? {
            (true, mapped) => Ok(mapped),
            (false, _) => Err(DomainError::DatabaseEmptyData),
        },
    });

    until_failure(results)
}

/// Like [wrap] for sources that always carry a value.
pub fn wrap_total<S, T, E, R, F>(source: S, mut map: F) -> QueryStream<R>
where
    S: Stream<Item = Result<T, E>> + Send + 'static,
    E: Display,
    F: FnMut(T) -> R + Send + 'static,
    R: Send + 'static,
{
    let results = source.map(move |item| match item {
        Err(error) => Err(DomainError::domain(error)),
        Ok(value) => guarded(|| map(value)),
    });

    until_failure(results)
}

/// Validator for list results: valid when at least one entry exists.
pub fn non_empty<T>(values: Vec<T>) -> (bool, Vec<T>) {
    (!values.is_empty(), values)
}
