//! Startup login gate.
//!
//! The service only binds its listener after an operator has entered the
//! configured username and password. Failed attempts back off linearly and
//! the gate locks after the configured number of failures.

pub mod credentials;
pub mod error;
pub mod gate;
pub mod prompt;
pub mod throttle;

pub use credentials::Credentials;
pub use error::LoginError;
pub use gate::run_gate;
pub use prompt::{CredentialPrompt, TerminalPrompt};
pub use throttle::{
    Decision, LoginState, LoginThrottle, ThrottlePolicy, DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS,
};
