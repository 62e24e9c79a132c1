//! `show configuration ... | display set relative` dumps.
//!
//! The device renders a configuration subtree as flat set statements framed
//! by two marker lines:
//!
//! ```text
//! <configuration-output>
//! set unit 0 family inet address 192.0.2.1/24
//! set description uplink
//! </configuration-output>
//! ```
//!
//! Each line is handled on its own; field semantics belong to the resource
//! adapter that asked for the dump.

/// Line that opens a configuration dump.
pub const OUTPUT_OPEN: &str = "<configuration-output>";

/// Line that closes a configuration dump.
pub const OUTPUT_CLOSE: &str = "</configuration-output>";

/// Prefix stripped from every dump line.
pub const SET_PREFIX: &str = "set ";

/// Returned in place of command output when the reply body was empty or a
/// bare empty element.
pub const EMPTY_OUTPUT: &str = "<empty>";

/// Build the command that dumps `path` as relative set statements.
pub fn show_config_command(path: &str) -> String {
    format!("show configuration {} | display set relative", path)
}

/// A decoded configuration dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigDump {
    /// The configuration section does not exist.
    Absent,

    /// Statements with the `set ` prefix removed, in device order.
    Lines(Vec<String>),
}

impl ConfigDump {
    /// Decode command output.
    pub fn parse(output: &str) -> Self {
        if output == EMPTY_OUTPUT {
            return ConfigDump::Absent;
        }

        let mut lines = Vec::new();
        for line in output.lines() {
            let line = line.trim_end_matches('\r');
            if line.contains(OUTPUT_OPEN) {
                continue;
            }
            if line.contains(OUTPUT_CLOSE) {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            lines.push(line.strip_prefix(SET_PREFIX).unwrap_or(line).to_string());
        }

        ConfigDump::Lines(lines)
    }

    /// Whether the section is absent.
    pub fn is_absent(&self) -> bool {
        matches!(self, ConfigDump::Absent)
    }

    /// The statements, empty for an absent section.
    pub fn lines(&self) -> &[String] {
        match self {
            ConfigDump::Absent => &[],
            ConfigDump::Lines(lines) => lines,
        }
    }

    /// Statements under `prefix`, with that prefix removed.
    ///
    /// `prefix` is matched as whole words, so `unit 1` does not select
    /// `unit 10`.
    pub fn under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.lines().iter().filter_map(move |line| {
            let rest = line.strip_prefix(prefix)?;
            if rest.is_empty() {
                Some(rest)
            } else {
                rest.strip_prefix(' ')
            }
        })
    }
}
