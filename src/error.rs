use std::path::PathBuf;

use covid_tracker::repository::IngestError;
use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApplicationError {
    /// Could not read the configuration from the environment
    ConfigLoad {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("`{filter}` is not a valid log filter"))]
    LogFilter {
        filter: String,
        source: tracing_subscriber::filter::ParseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not read the snapshot file `{}`", path.display()))]
    ReadSnapshot {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("the snapshot file `{}` is not a valid snapshot", path.display()))]
    ParseSnapshot {
        path: PathBuf,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not store the snapshot
    Ingest {
        source: IngestError,
        #[snafu(implicit)]
        location: Location,
    },
}
