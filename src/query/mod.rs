//! Query modes, the dispatch path, and the service used by the HTTP handlers.

pub mod dispatch;
pub mod mode;
mod service;

pub use dispatch::{DispatchError, dispatch};
pub use mode::{Character, Mode, SYSTEM_INSTRUCTION, UnknownCharacter};
pub use service::{DocumentSummary, QueryApi, QueryRequest, QueryService};
