//! Credential providers for authenticating against Jenkins.

use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};

use base64::Engine;
use tracing::debug;

use crate::{Error, Result};

pub const ENV_PASSWORD: &str = "JENKINS_PASSWORD";
pub const ENV_API_TOKEN: &str = "JENKINS_API_TOKEN";

/// Username and password (or API token) for HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Supplies credentials before any request is made.
pub trait CredentialProvider {
    fn credentials(&self) -> Result<Credentials>;
}

/// Fixed credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials> {
        Ok(self.0.clone())
    }
}

/// Password or API token taken from the environment.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    username: String,
    secret: Option<String>,
}

impl EnvCredentials {
    /// Read `JENKINS_API_TOKEN`, falling back to `JENKINS_PASSWORD`.
    pub fn from_env(username: impl Into<String>) -> Self {
        let secret = [ENV_API_TOKEN, ENV_PASSWORD]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
        Self {
            username: username.into(),
            secret,
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<Credentials> {
        match &self.secret {
            Some(secret) => Ok(Credentials::new(self.username.clone(), secret.clone())),
            None => Err(Error::Credentials(format!(
                "neither {} nor {} is set",
                ENV_API_TOKEN, ENV_PASSWORD
            ))),
        }
    }
}

/// Interactive password prompt on the controlling terminal.
#[derive(Debug, Clone)]
pub struct PromptCredentials {
    username: String,
    prompt: String,
}

impl PromptCredentials {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            prompt: "Password:".to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

impl CredentialProvider for PromptCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Err(Error::Credentials(
                "cannot prompt for a password: stdin is not a terminal".to_string(),
            ));
        }

        let mut stderr = io::stderr();
        write!(stderr, "{} ", self.prompt)?;
        stderr.flush()?;

        let fd = libc::STDIN_FILENO;
        let saved = disable_echo(fd);
        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line);
        if let Some(termios) = saved {
            restore_termios(fd, &termios);
        }
        writeln!(stderr)?;
        read?;

        let password = line.trim_end_matches(['\r', '\n']).to_string();
        if password.is_empty() {
            return Err(Error::Credentials("empty password".to_string()));
        }
        Ok(Credentials::new(self.username.clone(), password))
    }
}

/// Tries each provider in turn and returns the first success.
#[derive(Default)]
pub struct ChainCredentials {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl CredentialProvider for ChainCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.credentials() {
                Ok(credentials) => return Ok(credentials),
                Err(e) => {
                    debug!(error = %e, "credential provider failed");
                    failures.push(e.to_string());
                }
            }
        }
        Err(Error::Credentials(if failures.is_empty() {
            "no credential providers configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}

/// Environment first, then an interactive prompt.
pub fn default_provider(username: &str) -> ChainCredentials {
    ChainCredentials::new()
        .with(EnvCredentials::from_env(username))
        .with(PromptCredentials::new(username))
}

/// Turn off terminal echo, returning the original settings for restoration.
fn disable_echo(fd: i32) -> Option<libc::termios> {
    unsafe {
        let mut orig: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut orig) != 0 {
            return None;
        }

        let mut quiet = orig;
        quiet.c_lflag &= !libc::ECHO;
        quiet.c_lflag |= libc::ECHONL;
        if libc::tcsetattr(fd, libc::TCSANOW, &quiet) != 0 {
            return None;
        }

        Some(orig)
    }
}

/// Restore terminal to original mode
fn restore_termios(fd: i32, termios: &libc::termios) {
    unsafe {
        libc::tcsetattr(fd, libc::TCSANOW, termios);
    }
}
