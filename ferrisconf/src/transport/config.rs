//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::TransportError;

/// Default NETCONF-over-SSH port.
pub const NETCONF_PORT: u16 = 830;

/// SSH connection configuration.
///
/// Host keys presented by the device are accepted without verification and
/// a warning is logged for every connection.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 830).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Timeout for establishing the TCP/SSH connection.
    pub timeout: Duration,

    /// Inactivity timeout for the established connection.
    pub inactivity_timeout: Option<Duration>,
}

impl SshConfig {
    /// Create a config with the default port and timeouts.
    pub fn new(host: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port: NETCONF_PORT,
            username: username.into(),
            auth,
            timeout: Duration::from_secs(5),
            inactivity_timeout: None,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method for SSH connections.
///
/// Exactly one credential form is used per connection. Build it directly,
/// or resolve it from loosely populated settings with [`Credentials`].
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Password authentication.
    Password(SecretString),

    /// Private key held in memory (PEM or OpenSSH format).
    KeyMaterial {
        /// The encoded private key.
        pem: SecretString,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },

    /// Private key read from a file.
    KeyFile {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}

impl AuthMethod {
    /// Short name of the credential form, safe for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthMethod::Password(_) => "password",
            AuthMethod::KeyMaterial { .. } => "key-material",
            AuthMethod::KeyFile { .. } => "key-file",
        }
    }
}

/// Loosely populated credential settings, as they arrive from a provider
/// configuration block.
///
/// Any subset of the fields may be set. [`Credentials::resolve`] picks a
/// single form with the precedence key material, then key file, then
/// password, and never looks at the others.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Password.
    pub password: Option<SecretString>,

    /// Private key contents.
    pub private_key_pem: Option<SecretString>,

    /// Path to a private key file.
    pub private_key_file: Option<PathBuf>,

    /// Passphrase for whichever key form is selected.
    pub passphrase: Option<SecretString>,
}

impl Credentials {
    /// Select the credential form to use.
    pub fn resolve(self) -> Result<AuthMethod, TransportError> {
        let passphrase = self
            .passphrase
            .filter(|p| !p.expose_secret().is_empty());

        if let Some(pem) = self
            .private_key_pem
            .filter(|k| !k.expose_secret().is_empty())
        {
            return Ok(AuthMethod::KeyMaterial { pem, passphrase });
        }

        if let Some(path) = self
            .private_key_file
            .filter(|p| !p.as_os_str().is_empty())
        {
            return Ok(AuthMethod::KeyFile { path, passphrase });
        }

        if let Some(password) = self.password.filter(|p| !p.expose_secret().is_empty()) {
            return Ok(AuthMethod::Password(password));
        }

        Err(TransportError::no_credentials())
    }
}
