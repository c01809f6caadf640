use derive_new::new;
use serde::{Deserialize, Serialize};

pub use hierarchy::*;
pub use place::*;
pub use stats::*;
pub use tracker::*;

mod hierarchy;
mod place;
mod stats;
mod tracker;
