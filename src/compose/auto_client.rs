//! VPN auto-client generation.

use serde_json::{Map, Value, json};

use crate::model::{Context, VpnAttachment};

use super::ComposeError;

/// Generates the client-side stanza a VPN template contributes.
///
/// Called once per VPN template whose server the configuration has joined.
/// The returned fragment is merged like any template fragment, so list
/// sections are appended after the template's own content.
pub trait AutoClient: Send + Sync {
    /// Returns the fragment for `attachment`.
    ///
    /// `context` is the fully resolved context of the configuration,
    /// including the `*_<server>` VPN variables.
    ///
    /// # Errors
    ///
    /// Implementations return [`ComposeError`] when the membership lacks data
    /// the backend needs.
    fn generate(
        &self,
        attachment: &VpnAttachment<'_>,
        context: &Context,
    ) -> Result<Value, ComposeError>;
}

/// Backend-neutral generator producing a `tunnels` list entry.
///
/// Each entry carries the server id and tunnel family plus whichever of the
/// host, port, keys, address and tunnel id the context provides.
#[derive(Debug, Clone, Copy, Default)]
pub struct TunnelStanzaGenerator;

/// Context prefixes copied into the stanza, with the field they become.
const STANZA_FIELDS: &[(&str, &str)] = &[
    ("vpn_host", "host"),
    ("vpn_port", "port"),
    ("public_key", "server_public_key"),
    ("pub_key", "public_key"),
    ("pvt_key", "private_key"),
    ("ip_address", "address"),
    ("server_ip_address", "server_address"),
    ("vni", "vni"),
];

impl AutoClient for TunnelStanzaGenerator {
    fn generate(
        &self,
        attachment: &VpnAttachment<'_>,
        context: &Context,
    ) -> Result<Value, ComposeError> {
        let server = attachment.server;
        let mut stanza = Map::new();
        stanza.insert("server".to_string(), json!(server.id));
        stanza.insert(
            "family".to_string(),
            json!(server.tunnel_family().as_str()),
        );
        for (prefix, field) in STANZA_FIELDS {
            if let Some(value) = context.get(&format!("{prefix}_{}", server.id)) {
                stanza.insert((*field).to_string(), json!(value));
            }
        }
        Ok(json!({ "tunnels": [Value::Object(stanza)] }))
    }
}
