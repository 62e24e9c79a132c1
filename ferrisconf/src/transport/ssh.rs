//! SSH transport implementation using russh.

use std::sync::Arc;

use log::{debug, trace, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKey, PrivateKeyWithHashAlg, PublicKey, decode_secret_key, load_secret_key};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::Transport;
use super::ciphers;
use super::config::{AuthMethod, SshConfig};
use crate::channel::{END_OF_MESSAGE, FrameBuffer};
use crate::error::{Result, TransportError};

/// Name of the SSH subsystem that carries NETCONF.
const NETCONF_SUBSYSTEM: &str = "netconf";

/// SSH transport bound to the `netconf` subsystem.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Channel running the netconf subsystem.
    channel: Channel<Msg>,

    /// Bytes received but not yet framed into a message.
    buffer: FrameBuffer,

    /// Target host, kept for log context.
    host: String,
}

impl SshTransport {
    /// Connect to the device, authenticate and start the netconf subsystem.
    ///
    /// Key material is decoded before dialing, so a bad key never costs a
    /// connection attempt.
    pub async fn connect(config: &SshConfig) -> Result<Self> {
        let key = load_private_key(&config.auth)?;

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: config.inactivity_timeout,
            preferred: ciphers::preferred(),
            ..Default::default()
        });

        let handler = SshHandler {
            host: config.host.clone(),
        };

        debug!(
            "connecting to {} as {} ({})",
            config.socket_addr(),
            config.username,
            config.auth.kind()
        );

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout {
            host: config.host.clone(),
            port: config.port,
            after: config.timeout,
        })?
        .map_err(|source| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        Self::authenticate(&mut session, config, key).await?;

        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_subsystem(true, NETCONF_SUBSYSTEM)
            .await
            .map_err(TransportError::Ssh)?;

        debug!("{} netconf subsystem started", config.host);

        Ok(Self {
            session,
            channel,
            buffer: FrameBuffer::new(),
            host: config.host.clone(),
        })
    }

    /// Authenticate with the server.
    async fn authenticate(
        session: &mut Handle<SshHandler>,
        config: &SshConfig,
        key: Option<PrivateKey>,
    ) -> Result<()> {
        let success = match (key, &config.auth) {
            (Some(key), _) => {
                // Get the best RSA hash algorithm supported by the server
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
            (None, AuthMethod::Password(password)) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            (None, _) => {
                return Err(TransportError::Key("private key was not loaded".to_string()).into());
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }
}

/// Decode the private key for key-based methods.
///
/// Returns `Ok(None)` for password authentication.
fn load_private_key(auth: &AuthMethod) -> std::result::Result<Option<PrivateKey>, TransportError> {
    match auth {
        AuthMethod::Password(_) => Ok(None),
        AuthMethod::KeyMaterial { pem, passphrase } => decode_secret_key(
            pem.expose_secret(),
            passphrase.as_ref().map(|p| p.expose_secret()),
        )
        .map(Some)
        .map_err(|e| TransportError::Key(format!("failed to parse private key: {}", e))),
        AuthMethod::KeyFile { path, passphrase } => {
            load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                .map(Some)
                .map_err(|e| {
                    TransportError::Key(format!(
                        "failed to load private key {}: {}",
                        path.display(),
                        e
                    ))
                })
        }
    }
}

impl Transport for SshTransport {
    async fn send(&mut self, message: &str) -> Result<()> {
        trace!("{} >>> {} bytes", self.host, message.len());

        let mut framed = Vec::with_capacity(message.len() + END_OF_MESSAGE.len());
        framed.extend_from_slice(message.as_bytes());
        framed.extend_from_slice(END_OF_MESSAGE);

        self.channel
            .data(&framed[..])
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        loop {
            if let Some(message) = self.buffer.next_message() {
                trace!("{} <<< {} bytes", self.host, message.len());
                return Ok(String::from_utf8_lossy(&message).into_owned());
            }

            match self.channel.wait().await {
                Some(ChannelMsg::Data { ref data }) => self.buffer.extend(data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    debug!(
                        "{} channel closed with {} unframed bytes",
                        self.host,
                        self.buffer.len()
                    );
                    return Err(TransportError::Disconnected.into());
                }
                Some(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.channel.eof().await {
            debug!("{} failed to send channel eof: {}", self.host, e);
        }
        self.buffer.clear();
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        // Host keys are not verified, see SshConfig.
        warn!(
            "accepting unverified {} host key from {}",
            server_public_key.algorithm(),
            self.host
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::error::Error;

    #[test]
    fn test_password_needs_no_key() {
        let auth = AuthMethod::Password(SecretString::from("pw".to_string()));
        assert!(load_private_key(&auth).unwrap().is_none());
    }

    #[test]
    fn test_invalid_key_material() {
        let auth = AuthMethod::KeyMaterial {
            pem: SecretString::from("not a key".to_string()),
            passphrase: None,
        };
        match load_private_key(&auth) {
            Err(TransportError::Key(message)) => {
                assert!(message.starts_with("failed to parse private key"));
            }
            other => panic!("expected key error, got {:?}", other.map(|k| k.is_some())),
        }
    }

    #[test]
    fn test_missing_key_file() {
        let auth = AuthMethod::KeyFile {
            path: PathBuf::from("/nonexistent/ferrisconf/id_ed25519"),
            passphrase: None,
        };
        match load_private_key(&auth) {
            Err(TransportError::Key(message)) => {
                assert!(message.contains("/nonexistent/ferrisconf/id_ed25519"));
            }
            other => panic!("expected key error, got {:?}", other.map(|k| k.is_some())),
        }
    }

    #[tokio::test]
    async fn test_connect_timeout_names_the_target() {
        // accepts TCP but never sends an SSH banner
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let silent = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut config = SshConfig::new(
            "127.0.0.1",
            "automation",
            AuthMethod::Password(SecretString::from("pw".to_string())),
        );
        config.port = port;
        config.timeout = Duration::from_millis(200);

        match SshTransport::connect(&config).await {
            Err(Error::Transport(TransportError::Timeout { host, port: p, after })) => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(p, port);
                assert_eq!(after, Duration::from_millis(200));
            }
            Err(other) => panic!("expected timeout, got {:?}", other),
            Ok(_) => panic!("expected timeout, got a session"),
        }
        silent.abort();
    }
}
