use tracing::{info, warn};

use super::credentials::Credentials;
use super::error::LoginError;
use super::prompt::CredentialPrompt;
use super::throttle::{Decision, LoginThrottle};

/// Prompts until the operator logs in or the throttle locks.
///
/// Runs before the listener binds and before any task is spawned, so the
/// blocking prompt does not hold up other work.
pub async fn run_gate(
    prompt: &mut dyn CredentialPrompt,
    credentials: &Credentials,
    throttle: &mut LoginThrottle,
) -> Result<(), LoginError> {
    let max_attempts = throttle.policy().max_attempts;

    loop {
        let (username, password) = prompt.read_credentials().map_err(LoginError::from_prompt)?;

        throttle.begin();
        let granted = credentials.verify(&username, &password);

        match throttle.record(granted) {
            Decision::Granted => {
                info!(username = %username, "Login succeeded");
                prompt.notice("Login success");
                return Ok(());
            }
            Decision::Retry { attempt, delay } => {
                warn!(attempt, max_attempts, "Login failed");
                prompt.notice(&format!("Login failed ({}/{})", attempt, max_attempts));
                prompt.notice(&format!("Wait {}s...", delay.as_secs_f64()));
                tokio::time::sleep(delay).await;
                throttle.resume();
            }
            Decision::Locked { attempts } => {
                warn!(attempts, "Login locked after too many failed attempts");
                prompt.notice(&format!("Login failed ({}/{})", attempts, max_attempts));
                prompt.notice("Too many failed attempts. Exit.");
                return Err(LoginError::Locked { attempts });
            }
        }
    }
}
