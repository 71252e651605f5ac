use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A joke exactly as the upstream service returned it.
///
/// The payload is not interpreted; callers receive whatever JSON the upstream produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Joke(pub Value);
