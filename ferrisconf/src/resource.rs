//! Contract between typed configuration objects and the session.
//!
//! The session only speaks set-style strings. A [`Resource`] adapter maps a
//! typed object to the statements that create it and back from the
//! relative dump of its configuration section.

use crate::error::{ParseError, Result, SessionError};
use crate::parser::{ConfigDump, show_config_command};
use crate::session::Session;
use crate::transport::Transport;

/// A configuration object addressed by an identifier.
pub trait Resource: Sized {
    /// Configuration hierarchy of the object, e.g. `interfaces ge-0/0/0`.
    fn config_path(id: &str) -> String;

    /// Complete `set` statements that create the object.
    fn to_set_lines(&self) -> Vec<String>;

    /// Statements that remove the object.
    fn delete_lines(id: &str) -> Vec<String> {
        vec![format!("delete {}", Self::config_path(id))]
    }

    /// Rebuild the object from the relative statements of its section.
    fn from_set_lines(id: &str, lines: &[String]) -> std::result::Result<Self, ParseError>;
}

/// Load statements, failing on any message reported by the device.
pub async fn set<T: Transport>(session: &mut Session<T>, lines: &[String]) -> Result<()> {
    let messages = session.load_config_set(lines).await?;
    if !messages.is_empty() {
        return Err(SessionError::Command { message: messages }.into());
    }
    Ok(())
}

/// Dump the section at `path` as relative set statements.
pub async fn read_dump<T: Transport>(session: &mut Session<T>, path: &str) -> Result<ConfigDump> {
    let output = session.run_command(&show_config_command(path)).await?;
    Ok(ConfigDump::parse(&output))
}

/// Whether the section at `path` exists.
pub async fn exists<T: Transport>(session: &mut Session<T>, path: &str) -> Result<bool> {
    Ok(!read_dump(session, path).await?.is_absent())
}

/// Read object `id`, or `None` when its section is absent.
pub async fn read<R: Resource, T: Transport>(
    session: &mut Session<T>,
    id: &str,
) -> Result<Option<R>> {
    match read_dump(session, &R::config_path(id)).await? {
        ConfigDump::Absent => Ok(None),
        ConfigDump::Lines(lines) => Ok(Some(R::from_set_lines(id, &lines)?)),
    }
}
