use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Too many failed login attempts ({attempts})")]
    Locked { attempts: u32 },

    #[error("Login cancelled by operator")]
    Cancelled,

    #[error("Failed to read credentials: {0}")]
    Prompt(#[source] std::io::Error),
}

impl LoginError {
    pub(crate) fn from_prompt(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::Interrupted {
            LoginError::Cancelled
        } else {
            LoginError::Prompt(err)
        }
    }
}
