//! Candidate configuration transactions.
//!
//! A [`Transaction`] borrows the session mutably for its whole lifetime, so
//! no other RPC can interleave with a lock/load/commit cycle. Whether the
//! candidate lock is held is recorded on the session. A transaction never
//! closes the session.
//!
//! ```text
//! Idle --lock--> Locked --commit--> Committed --unlock--> Idle
//!                   \----clear----> Cleared  --unlock--> Idle
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use ferrisconf::session::{Batch, Session};
//! use ferrisconf::transport::SshTransport;
//!
//! # async fn example(session: &mut Session<SshTransport>) -> Result<(), ferrisconf::Error> {
//! let mut batch = Batch::new();
//! batch.push_set("interfaces ge-0/0/0 description uplink");
//! batch.push_delete("interfaces ge-0/0/0 disable");
//!
//! let outcome = session.transaction().apply(&batch, "uplink description").await?;
//! for warning in &outcome.warnings {
//!     println!("warning: {}", warning);
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use super::{Session, rpc};
use crate::error::{Result, TransactionError};
use crate::parser::{CommitOutcome, evaluate_commit};
use crate::transport::{SshTransport, Transport};

/// Default pause between lock attempts.
pub const DEFAULT_LOCK_INTERVAL: Duration = Duration::from_secs(1);

/// Default time spent waiting for the candidate lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

/// Ordered set-style statements submitted as one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    lines: Vec<String>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `set <statement>`.
    pub fn push_set(&mut self, statement: impl AsRef<str>) -> &mut Self {
        self.lines.push(format!("set {}", statement.as_ref()));
        self
    }

    /// Append `delete <statement>`.
    pub fn push_delete(&mut self, statement: impl AsRef<str>) -> &mut Self {
        self.lines.push(format!("delete {}", statement.as_ref()));
        self
    }

    /// Append a complete line as is.
    pub fn push(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn extend<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl From<Vec<String>> for Batch {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

/// Lock controller over one session.
///
/// Lock state belongs to the [`Session`], so a transaction started after
/// another was dropped still sees a lock taken earlier.
pub struct Transaction<'a, T: Transport = SshTransport> {
    session: &'a mut Session<T>,
    lock_interval: Duration,
    lock_timeout: Duration,
}

impl<'a, T: Transport> Transaction<'a, T> {
    pub(crate) fn new(session: &'a mut Session<T>) -> Self {
        Self {
            session,
            lock_interval: DEFAULT_LOCK_INTERVAL,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Set how [`apply`](Self::apply) waits for the candidate lock.
    pub fn lock_policy(mut self, interval: Duration, timeout: Duration) -> Self {
        self.lock_interval = interval;
        self.lock_timeout = timeout;
        self
    }

    /// Whether the candidate lock is held.
    pub fn is_locked(&self) -> bool {
        self.session.locked
    }

    /// Try once to lock the candidate configuration.
    ///
    /// A refusal by the device is `Ok(false)`; transport and decoding
    /// failures are returned.
    async fn try_lock(&mut self) -> Result<bool> {
        let reply = self.session.exec(rpc::LOCK_CANDIDATE).await?;
        if let Some(message) = reply.first_error() {
            debug!("Candidate lock refused: {}", message);
            return Ok(false);
        }
        self.session.locked = true;
        Ok(true)
    }

    /// Try once to lock the candidate configuration.
    pub async fn lock(&mut self) -> bool {
        match self.try_lock().await {
            Ok(locked) => locked,
            Err(e) => {
                debug!("Candidate lock failed: {}", e);
                false
            }
        }
    }

    /// Poll for the lock every `interval` until it is granted or `timeout`
    /// has elapsed. Refusals are retried; any other failure is returned at
    /// once.
    pub async fn lock_with_retry(&mut self, interval: Duration, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if self.try_lock().await? {
                debug!("Candidate locked after {} attempt(s)", attempts);
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(TransactionError::LockTimeout(timeout).into());
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Load a batch into the candidate; returns the device's concatenated
    /// messages, empty on success.
    pub async fn load(&mut self, batch: &Batch) -> Result<String> {
        if !self.session.locked {
            warn!("Loading {} line(s) without holding the candidate lock", batch.len());
        }
        self.session.load_config_set(batch.lines()).await
    }

    /// Commit the candidate configuration.
    pub async fn commit(&mut self, log: &str) -> Result<CommitOutcome> {
        let reply = self.session.exec(&rpc::commit_configuration(log)).await?;
        let outcome = evaluate_commit(&reply)?;

        for warning in &outcome.warnings {
            warn!("Commit warning: {}", warning);
        }
        Ok(outcome)
    }

    /// Discard uncommitted changes. Does nothing unless the session holds
    /// the lock.
    pub async fn clear(&mut self) -> Result<()> {
        if !self.session.locked {
            return Ok(());
        }

        let reply = self.session.exec(rpc::CLEAR_CANDIDATE).await?;
        if let Some(message) = reply.first_error() {
            return Err(TransactionError::Clear {
                message: message.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Release the candidate lock.
    pub async fn unlock(&mut self) -> Result<()> {
        let reply = self.session.exec(rpc::UNLOCK_CANDIDATE).await?;
        if let Some(message) = reply.first_error() {
            return Err(TransactionError::Unlock {
                message: message.to_string(),
            }
            .into());
        }
        self.session.locked = false;
        Ok(())
    }

    /// Lock, load `batch`, commit with `log` and unlock.
    ///
    /// Any failure after the lock is taken clears the candidate. When the
    /// clear fails as well both errors are reported through
    /// [`TransactionError::Aborted`]. An unlock failure is only returned
    /// when everything before it succeeded.
    pub async fn apply(&mut self, batch: &Batch, log: &str) -> Result<CommitOutcome> {
        if batch.is_empty() {
            debug!("Empty batch, nothing to apply");
            return Ok(CommitOutcome::default());
        }

        self.lock_with_retry(self.lock_interval, self.lock_timeout)
            .await?;

        let result = match self.load_and_commit(batch, log).await {
            Ok(outcome) => Ok(outcome),
            Err(source) => {
                let clear = self.clear().await.err();
                if let Some(e) = &clear {
                    warn!("Clearing candidate after failure also failed: {}", e);
                }
                Err(TransactionError::Aborted {
                    source: Box::new(source),
                    clear: clear.map(Box::new),
                }
                .into())
            }
        };

        match (result, self.unlock().await) {
            (Ok(_), Err(unlock)) => Err(unlock),
            (Err(e), Err(unlock)) => {
                warn!("Unlock after failed transaction also failed: {}", unlock);
                Err(e)
            }
            (result, Ok(())) => result,
        }
    }

    async fn load_and_commit(&mut self, batch: &Batch, log: &str) -> Result<CommitOutcome> {
        let messages = self.load(batch).await?;
        if !messages.is_empty() {
            return Err(TransactionError::LoadRejected { message: messages }.into());
        }
        self.commit(log).await
    }
}

impl<T: Transport> Drop for Transaction<'_, T> {
    fn drop(&mut self) {
        if self.session.locked {
            warn!(
                "Transaction on session {:?} dropped while holding the candidate lock",
                self.session.session_id()
            );
        }
    }
}
