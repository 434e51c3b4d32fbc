//! Interactive credential entry.

use std::io::{self, BufRead, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use secrecy::SecretString;

/// Source of username/password pairs for the login gate.
pub trait CredentialPrompt {
    /// Blocks until the operator has entered a username and password.
    fn read_credentials(&mut self) -> io::Result<(String, SecretString)>;

    /// Shows a status line to the operator.
    fn notice(&mut self, message: &str);
}

/// Reads the username from stdin and the password in raw mode, echoing `*`.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn read_credentials(&mut self) -> io::Result<(String, SecretString)> {
        let mut stdout = io::stdout();
        write!(stdout, "Username: ")?;
        stdout.flush()?;

        let mut username = String::new();
        if io::stdin().lock().read_line(&mut username)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed before a username was entered",
            ));
        }
        let username = username.trim_end_matches(['\r', '\n']).to_string();

        write!(stdout, "Password: ")?;
        stdout.flush()?;
        let password = read_masked(&mut stdout)?;

        Ok((username, password))
    }

    fn notice(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// Restores cooked mode on every exit path.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn read_masked(out: &mut impl Write) -> io::Result<SecretString> {
    let _raw = RawModeGuard::enable()?;
    let mut password = String::new();

    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read()?
        else {
            continue;
        };
        // Windows reports releases too.
        if kind != KeyEventKind::Press {
            continue;
        }

        match code {
            KeyCode::Enter => {
                write!(out, "\r\n")?;
                out.flush()?;
                break;
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                write!(out, "\r\n")?;
                out.flush()?;
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "login cancelled",
                ));
            }
            KeyCode::Backspace => {
                if password.pop().is_some() {
                    write!(out, "\x08 \x08")?;
                }
            }
            KeyCode::Char(c) => {
                password.push(c);
                write!(out, "*")?;
            }
            _ => {}
        }
        out.flush()?;
    }

    Ok(SecretString::from(password))
}
