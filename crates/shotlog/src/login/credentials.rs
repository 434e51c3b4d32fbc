use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

/// The single operator account allowed to start the service.
pub struct Credentials {
    username: String,
    password_hash: SecretString,
}

impl Credentials {
    /// `password_hash` is a bcrypt hash (`$2a$`, `$2b$` or `$2y$`).
    pub fn new(username: impl Into<String>, password_hash: SecretString) -> Self {
        Self {
            username: username.into(),
            password_hash,
        }
    }

    /// Checks a username/password pair.
    ///
    /// The password is always checked, even when the username is wrong.
    pub fn verify(&self, username: &str, password: &SecretString) -> bool {
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = match bcrypt::verify(
            password.expose_secret().as_bytes(),
            self.password_hash.expose_secret(),
        ) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Configured password hash is not a valid bcrypt hash");
                false
            }
        };
        user_ok && pass_ok
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
