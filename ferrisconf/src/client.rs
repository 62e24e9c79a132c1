//! Client construction and per-device workflows.
//!
//! A [`Client`] turns provider-style settings into an [`SshConfig`], dials
//! with bounded retry and runs whole read or configure cycles. Callers that
//! share one device serialize those cycles through a [`DeviceLock`].

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, warn};
use secrecy::SecretString;
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result, TransportError};
use crate::parser::{CommitOutcome, ConfigDump};
use crate::resource;
use crate::session::{Batch, DEFAULT_LOCK_INTERVAL, DEFAULT_LOCK_TIMEOUT, Session};
use crate::transport::{Credentials, NETCONF_PORT, SshConfig, SshTransport, Transport};

/// Default connect timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of connection attempts.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;

/// Default pause between connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Default pause after closing a session.
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_millis(500);

/// Serializes configuration cycles against one device.
///
/// The lock is owned by the caller and passed to every [`Client`]
/// operation; clients never share hidden state.
#[derive(Debug, Default)]
pub struct DeviceLock {
    inner: Mutex<()>,
}

impl DeviceLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of the device.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }
}

/// Provider settings, as read from a configuration file.
///
/// Durations are given in whole seconds or milliseconds as the field name
/// says.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    #[serde(default)]
    pub password: Option<String>,

    /// PEM-encoded private key.
    #[serde(default)]
    pub sshkey_pem: Option<String>,

    /// Path to a private key file.
    #[serde(default)]
    pub sshkey_file: Option<PathBuf>,

    /// Passphrase for the private key.
    #[serde(default)]
    pub keypass: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_lock_interval_ms")]
    pub lock_interval_ms: u64,

    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    #[serde(default = "default_drain_delay_ms")]
    pub drain_delay_ms: u64,
}

fn default_port() -> u16 {
    NETCONF_PORT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_connect_attempts() -> u32 {
    DEFAULT_CONNECT_ATTEMPTS
}

fn default_retry_delay_secs() -> u64 {
    DEFAULT_RETRY_DELAY.as_secs()
}

fn default_lock_interval_ms() -> u64 {
    DEFAULT_LOCK_INTERVAL.as_millis() as u64
}

fn default_lock_timeout_secs() -> u64 {
    DEFAULT_LOCK_TIMEOUT.as_secs()
}

fn default_drain_delay_ms() -> u64 {
    DEFAULT_DRAIN_DELAY.as_millis() as u64
}

/// Builder for constructing a [`Client`].
///
/// # Example
///
/// ```rust,no_run
/// use ferrisconf::ClientBuilder;
///
/// # async fn example() -> Result<(), ferrisconf::Error> {
/// let client = ClientBuilder::new("192.0.2.10")
///     .username("automation")
///     .password("secret")
///     .connect_attempts(5)
///     .build()?;
/// let session = client.open_session().await?;
/// client.close_session(session).await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    credentials: Credentials,
    timeout: Duration,
    inactivity_timeout: Option<Duration>,
    connect_attempts: u32,
    retry_delay: Duration,
    lock_interval: Duration,
    lock_timeout: Duration,
    drain_delay: Duration,
}

impl ClientBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: NETCONF_PORT,
            username: None,
            credentials: Credentials::default(),
            timeout: DEFAULT_TIMEOUT,
            inactivity_timeout: None,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            lock_interval: DEFAULT_LOCK_INTERVAL,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            drain_delay: DEFAULT_DRAIN_DELAY,
        }
    }

    /// Start from provider settings.
    pub fn from_config(config: ClientConfig) -> Self {
        let mut builder = Self::new(config.host)
            .port(config.port)
            .username(config.username)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_attempts(config.connect_attempts)
            .retry_delay(Duration::from_secs(config.retry_delay_secs))
            .lock_policy(
                Duration::from_millis(config.lock_interval_ms),
                Duration::from_secs(config.lock_timeout_secs),
            )
            .drain_delay(Duration::from_millis(config.drain_delay_ms));

        builder.credentials = Credentials {
            password: config.password.map(SecretString::from),
            private_key_pem: config.sshkey_pem.map(SecretString::from),
            private_key_file: config.sshkey_file,
            passphrase: config.keypass.map(SecretString::from),
        };
        builder
    }

    /// Set the NETCONF port (default: 830).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.credentials.password = Some(SecretString::from(password.into()));
        self
    }

    /// Authenticate with a PEM-encoded private key.
    pub fn private_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.credentials.private_key_pem = Some(SecretString::from(pem.into()));
        self
    }

    /// Authenticate with a private key file.
    pub fn private_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials.private_key_file = Some(path.into());
        self
    }

    /// Passphrase for the private key.
    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.credentials.passphrase = Some(SecretString::from(passphrase.into()));
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = Some(timeout);
        self
    }

    /// Number of connection attempts, at least one.
    pub fn connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// How configure cycles wait for the candidate lock.
    pub fn lock_policy(mut self, interval: Duration, timeout: Duration) -> Self {
        self.lock_interval = interval;
        self.lock_timeout = timeout;
        self
    }

    /// Pause after closing a session.
    pub fn drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = delay;
        self
    }

    /// Build the client.
    ///
    /// This resolves credentials but does not connect.
    pub fn build(self) -> Result<Client> {
        let username = self
            .username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::InvalidConfig {
                message: "Username is required".to_string(),
            })?;

        if self.host.is_empty() {
            return Err(Error::InvalidConfig {
                message: "Host is required".to_string(),
            });
        }

        let auth = self.credentials.resolve()?;

        let mut ssh = SshConfig::new(self.host, username, auth);
        ssh.port = self.port;
        ssh.timeout = self.timeout;
        ssh.inactivity_timeout = self.inactivity_timeout;

        Ok(Client {
            ssh,
            connect_attempts: self.connect_attempts.max(1),
            retry_delay: self.retry_delay,
            lock_interval: self.lock_interval,
            lock_timeout: self.lock_timeout,
            drain_delay: self.drain_delay,
        })
    }
}

/// Connection settings for one device.
#[derive(Debug, Clone)]
pub struct Client {
    ssh: SshConfig,
    connect_attempts: u32,
    retry_delay: Duration,
    lock_interval: Duration,
    lock_timeout: Duration,
    drain_delay: Duration,
}

/// Whether a failed connection attempt is worth repeating.
fn is_retryable(error: &Error) -> bool {
    matches!(
        error,
        Error::Transport(
            TransportError::ConnectionFailed { .. }
                | TransportError::Timeout { .. }
                | TransportError::Disconnected
                | TransportError::Io(_)
        )
    )
}

impl Client {
    /// The SSH settings in use.
    pub fn ssh_config(&self) -> &SshConfig {
        &self.ssh
    }

    /// Dial the device, retrying connection-level failures.
    pub async fn connect(&self) -> Result<SshTransport> {
        let mut attempt = 1;
        loop {
            match SshTransport::connect(&self.ssh).await {
                Ok(transport) => return Ok(transport),
                Err(e) if attempt < self.connect_attempts && is_retryable(&e) => {
                    warn!(
                        "Connection attempt {}/{} to {} failed: {}",
                        attempt,
                        self.connect_attempts,
                        self.ssh.socket_addr(),
                        e
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Connect and open a NETCONF session.
    pub async fn open_session(&self) -> Result<Session> {
        let transport = self.connect().await?;
        Session::open(transport).await
    }

    /// Close a session with the configured drain delay.
    pub async fn close_session<T: Transport>(&self, session: Session<T>) -> Result<()> {
        session.close(self.drain_delay).await
    }

    /// Apply `batch` in its own session while holding `lock`.
    pub async fn configure(
        &self,
        lock: &DeviceLock,
        batch: &Batch,
        log: &str,
    ) -> Result<CommitOutcome> {
        let _guard = lock.acquire().await;
        let session = self.open_session().await?;
        self.configure_session(session, batch, log).await
    }

    /// Dump the section at `path` in its own session while holding `lock`.
    pub async fn read(&self, lock: &DeviceLock, path: &str) -> Result<ConfigDump> {
        let _guard = lock.acquire().await;
        let session = self.open_session().await?;
        self.read_session(session, path).await
    }

    async fn configure_session<T: Transport>(
        &self,
        mut session: Session<T>,
        batch: &Batch,
        log: &str,
    ) -> Result<CommitOutcome> {
        let result = session
            .transaction()
            .lock_policy(self.lock_interval, self.lock_timeout)
            .apply(batch, log)
            .await;

        if let Ok(outcome) = &result {
            debug!(
                "Committed {} line(s) on {} with {} warning(s)",
                batch.len(),
                self.ssh.host,
                outcome.warnings.len()
            );
        }
        self.finish(session, result).await
    }

    async fn read_session<T: Transport>(
        &self,
        mut session: Session<T>,
        path: &str,
    ) -> Result<ConfigDump> {
        let result = resource::read_dump(&mut session, path).await;
        self.finish(session, result).await
    }

    /// Close the session; a close failure only surfaces when `result` is Ok.
    async fn finish<T: Transport, R>(&self, session: Session<T>, result: Result<R>) -> Result<R> {
        match (result, self.close_session(session).await) {
            (Ok(_), Err(close)) => Err(close),
            (Err(e), Err(close)) => {
                warn!("Closing session to {} also failed: {}", self.ssh.host, close);
                Err(e)
            }
            (result, Ok(())) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::session::mock::MockTransport;
    use crate::transport::AuthMethod;

    fn client() -> Client {
        ClientBuilder::new("192.0.2.1")
            .username("automation")
            .password("secret")
            .drain_delay(Duration::ZERO)
            .lock_policy(Duration::from_millis(1), Duration::from_millis(20))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = client();
        let ssh = client.ssh_config();
        assert_eq!(ssh.port, NETCONF_PORT);
        assert_eq!(ssh.timeout, DEFAULT_TIMEOUT);
        assert_eq!(ssh.username, "automation");
        assert!(matches!(ssh.auth, AuthMethod::Password(_)));
        assert_eq!(client.connect_attempts, DEFAULT_CONNECT_ATTEMPTS);
    }

    #[test]
    fn test_builder_requires_username() {
        let result = ClientBuilder::new("192.0.2.1").password("secret").build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_builder_requires_credentials() {
        let result = ClientBuilder::new("192.0.2.1").username("automation").build();
        match result {
            Err(e) => assert_eq!(e.to_string(), "Transport error: no credentials available"),
            Ok(_) => panic!("expected missing credentials"),
        }
    }

    #[test]
    fn test_key_takes_precedence_over_password() {
        let client = ClientBuilder::new("192.0.2.1")
            .username("automation")
            .password("secret")
            .private_key_file("/etc/keys/id_ed25519")
            .build()
            .unwrap();
        assert!(matches!(client.ssh_config().auth, AuthMethod::KeyFile { .. }));
    }

    #[test]
    fn test_attempts_at_least_one() {
        let client = ClientBuilder::new("192.0.2.1")
            .username("automation")
            .password("secret")
            .connect_attempts(0)
            .build()
            .unwrap();
        assert_eq!(client.connect_attempts, 1);
    }

    #[test]
    fn test_config_from_json() {
        let config: ClientConfig = serde_json::from_str(
            r#"{
                "host": "fw1.lab.example.net",
                "username": "netconf",
                "sshkey_file": "/home/netconf/.ssh/id_rsa",
                "keypass": "hunter2",
                "lock_timeout_secs": 120
            }"#,
        )
        .unwrap();
        assert_eq!(config.port, 830);
        assert_eq!(config.connect_attempts, DEFAULT_CONNECT_ATTEMPTS);
        assert_eq!(config.drain_delay_ms, 500);

        let client = ClientBuilder::from_config(config).build().unwrap();
        assert_eq!(client.lock_timeout, Duration::from_secs(120));
        assert_eq!(client.lock_interval, DEFAULT_LOCK_INTERVAL);
        match &client.ssh_config().auth {
            AuthMethod::KeyFile { path, passphrase } => {
                assert_eq!(path, &PathBuf::from("/home/netconf/.ssh/id_rsa"));
                assert!(passphrase.is_some());
            }
            other => panic!("expected key file auth, got {}", other.kind()),
        }
    }

    #[test]
    fn test_config_requires_host() {
        let result: std::result::Result<ClientConfig, _> =
            serde_json::from_str(r#"{"username": "netconf"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(
            &TransportError::Timeout {
                host: "192.0.2.10".into(),
                port: 830,
                after: Duration::from_secs(1),
            }
            .into()
        ));
        assert!(is_retryable(&TransportError::Disconnected.into()));
        assert!(!is_retryable(
            &TransportError::AuthenticationFailed {
                user: "automation".into()
            }
            .into()
        ));
        assert!(!is_retryable(&TransportError::Key("bad key".into()).into()));
    }

    #[tokio::test]
    async fn test_configure_session_closes_afterwards() {
        let transport = MockTransport::device().ok().ok().ok().ok().ok();
        let sent = transport.sent();
        let session = Session::open(transport).await.unwrap();

        let mut batch = Batch::new();
        batch.push_set("system host-name lab-vsrx");
        let outcome = client().configure_session(session, &batch, "rename").await.unwrap();

        assert!(outcome.warnings.is_empty());
        assert!(sent.is_closed());
        assert!(sent.last().unwrap().contains("<close-session/>"));
    }

    #[tokio::test]
    async fn test_configure_session_keeps_original_error() {
        // lock refused until the lock timeout, then close
        let mut transport = MockTransport::device();
        for _ in 0..100 {
            transport = transport.error("error", "configuration database locked");
        }
        let sent = transport.sent();
        let session = Session::open(transport).await.unwrap();

        let mut batch = Batch::new();
        batch.push_set("system host-name lab-vsrx");
        let err = client()
            .configure_session(session, &batch, "rename")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Transaction(crate::error::TransactionError::LockTimeout(_))
        ));
        assert!(sent.is_closed());
    }

    #[tokio::test]
    async fn test_read_session() {
        let transport = MockTransport::device()
            .config_dump(&["set host-name lab-vsrx"])
            .ok();
        let session = Session::open(transport).await.unwrap();

        let dump = client().read_session(session, "system").await.unwrap();
        assert_eq!(dump.lines(), ["host-name lab-vsrx"]);
    }

    #[test]
    fn test_device_lock_released_on_drop() {
        let lock = DeviceLock::new();
        tokio_test::block_on(async {
            drop(lock.acquire().await);
            let _again = lock.acquire().await;
        });
    }

    #[tokio::test]
    async fn test_device_lock_serializes_holders() {
        let lock = Arc::new(DeviceLock::new());
        let active = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let lock = lock.clone();
            let active = active.clone();
            handles.push(tokio::spawn(async move {
                let _guard = lock.acquire().await;
                assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
