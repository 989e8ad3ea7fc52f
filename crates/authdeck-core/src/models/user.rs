use serde::{Deserialize, Serialize};

/// An account as the backend describes it.
///
/// Nothing in this crate constructs one yet; the session view carries
/// `Option<User>` so a UI can already render against the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
}
