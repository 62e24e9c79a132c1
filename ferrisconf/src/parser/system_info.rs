//! `get-system-information` decoding.

use super::tree;
use crate::error::ParseError;

/// Device identity captured when a session opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facts {
    hardware_model: String,
    os_name: String,
    os_version: String,
    serial_number: String,
    host_name: String,
    cluster_node: bool,
}

impl Facts {
    /// Decode the body of a `get-system-information` reply.
    ///
    /// Chassis clusters answer with one `system-information` per node under
    /// `multi-routing-engine-results`; the first node is used and the
    /// session is flagged as a cluster node.
    pub fn parse(body: &str) -> Result<Self, ParseError> {
        let decode_error = || ParseError::Decode {
            what: "system-information",
            size: body.len(),
        };

        let wrapped = format!("<system-reply>{}</system-reply>", body);
        let root = tree::parse(&wrapped).map_err(|_| decode_error())?;
        let info = root.find("system-information").ok_or_else(decode_error)?;

        let text = |name: &str| info.child_text(name).unwrap_or_default().to_string();

        Ok(Self {
            hardware_model: text("hardware-model"),
            os_name: text("os-name"),
            os_version: text("os-version"),
            serial_number: text("serial-number"),
            host_name: text("host-name"),
            cluster_node: info.child("cluster-node").is_some()
                || root.find("multi-routing-engine-results").is_some(),
        })
    }

    pub fn hardware_model(&self) -> &str {
        &self.hardware_model
    }

    pub fn os_name(&self) -> &str {
        &self.os_name
    }

    pub fn os_version(&self) -> &str {
        &self.os_version
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Whether the device is a member of a chassis cluster.
    pub fn is_cluster_node(&self) -> bool {
        self.cluster_node
    }
}
