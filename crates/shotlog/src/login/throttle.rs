//! Attempt counting and backoff for the startup login.
//!
//! The throttle is a plain value: every transition goes through `&mut self`,
//! so the whole state machine can be driven from tests without a terminal.

use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    pub max_attempts: u32,
    /// Delay per failed attempt; the wait after failure `n` is `n * unit`.
    pub backoff_unit: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    AwaitingCredentials,
    Verifying,
    Granted,
    /// Failed attempt `n`; waiting out the backoff before the next prompt.
    Denied(u32),
    Locked,
}

impl LoginState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoginState::Granted | LoginState::Locked)
    }
}

/// What the caller must do after a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Retry { attempt: u32, delay: Duration },
    Locked { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct LoginThrottle {
    policy: ThrottlePolicy,
    failed: u32,
    state: LoginState,
}

impl LoginThrottle {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            failed: 0,
            state: LoginState::AwaitingCredentials,
        }
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed
    }

    pub fn policy(&self) -> ThrottlePolicy {
        self.policy
    }

    /// Credentials have been entered and are about to be checked.
    pub fn begin(&mut self) {
        if self.state == LoginState::AwaitingCredentials {
            self.state = LoginState::Verifying;
        }
    }

    /// Records the verification result and returns the next step.
    pub fn record(&mut self, granted: bool) -> Decision {
        match self.state {
            LoginState::Granted => return Decision::Granted,
            LoginState::Locked => {
                return Decision::Locked {
                    attempts: self.failed,
                }
            }
            _ => {}
        }

        if granted {
            self.state = LoginState::Granted;
            return Decision::Granted;
        }

        self.failed += 1;
        if self.failed >= self.policy.max_attempts {
            self.state = LoginState::Locked;
            return Decision::Locked {
                attempts: self.failed,
            };
        }

        self.state = LoginState::Denied(self.failed);
        Decision::Retry {
            attempt: self.failed,
            delay: self.policy.backoff_unit * self.failed,
        }
    }

    /// The backoff has elapsed; prompt again.
    pub fn resume(&mut self) {
        if let LoginState::Denied(_) = self.state {
            self.state = LoginState::AwaitingCredentials;
        }
    }
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(ThrottlePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granted_first_try() {
        let mut throttle = LoginThrottle::default();
        throttle.begin();
        assert_eq!(throttle.state(), LoginState::Verifying);
        assert_eq!(throttle.record(true), Decision::Granted);
        assert_eq!(throttle.state(), LoginState::Granted);
        assert_eq!(throttle.failed_attempts(), 0);
    }

    #[test]
    fn test_backoff_grows_linearly() {
        let mut throttle = LoginThrottle::new(ThrottlePolicy {
            max_attempts: 4,
            backoff_unit: Duration::from_secs(2),
        });

        let mut delays = Vec::new();
        for _ in 0..3 {
            throttle.begin();
            match throttle.record(false) {
                Decision::Retry { delay, .. } => delays.push(delay),
                other => panic!("unexpected decision {:?}", other),
            }
            throttle.resume();
        }
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(6)
            ]
        );
    }

    #[test]
    fn test_three_failures_lock() {
        let mut throttle = LoginThrottle::default();

        throttle.begin();
        assert_eq!(
            throttle.record(false),
            Decision::Retry {
                attempt: 1,
                delay: Duration::from_secs(2)
            }
        );
        assert_eq!(throttle.state(), LoginState::Denied(1));
        throttle.resume();
        assert_eq!(throttle.state(), LoginState::AwaitingCredentials);

        throttle.begin();
        assert!(matches!(throttle.record(false), Decision::Retry { attempt: 2, .. }));
        throttle.resume();

        throttle.begin();
        assert_eq!(throttle.record(false), Decision::Locked { attempts: 3 });
        assert_eq!(throttle.state(), LoginState::Locked);
        assert!(throttle.state().is_terminal());
    }

    #[test]
    fn test_locked_is_terminal() {
        let mut throttle = LoginThrottle::new(ThrottlePolicy {
            max_attempts: 1,
            backoff_unit: Duration::from_secs(1),
        });
        throttle.begin();
        assert_eq!(throttle.record(false), Decision::Locked { attempts: 1 });
        // Correct credentials after lockout change nothing.
        throttle.begin();
        assert_eq!(throttle.record(true), Decision::Locked { attempts: 1 });
        assert_eq!(throttle.state(), LoginState::Locked);
    }
}
