//! Data models shared between the session layer and its consumers.
//!
//! - `User`: the account shape exposed to the UI
//! - `SignInData`, `SignUpData`: request payloads for the auth endpoints
//! - `SignInResponse`: the token-bearing sign-in reply

pub mod payload;
pub mod user;

pub use payload::{SignInData, SignInResponse, SignUpData};
pub use user::User;
