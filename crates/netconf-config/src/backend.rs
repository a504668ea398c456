//! Selection of the backend that computes responses for RPC operations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Backend used to turn an RPC request into a response document.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionBackend {
    /// Response templates read from the template directory, with a built-in
    /// table of replies for the core operations.
    #[default]
    Template,
    /// Executable `response.sh` scripts resolved per operation and datastore.
    Script,
}

/// Errors encountered while parsing an [`ActionBackend`] from text.
pub type ActionBackendParseError = strum::ParseError;
