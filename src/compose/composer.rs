//! The render operation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::context::{ContextResolver, ContextSources};
use crate::model::{
    Configuration, Context, Device, Template, TemplateId, VpnAttachment, VpnServer, empty_document,
};
use crate::template::TemplateOrderer;
use crate::vpn::Peer;

use super::{
    AutoClient, BASE_DOCUMENT, ComposeError, Substituter, TunnelStanzaGenerator, dedupe_files,
    merge, validate,
};

/// Name of the file carrying the VXLAN peer list in server documents.
const VXLAN_PEERS_FILE: &str = "vxlan.json";

/// Everything one render reads, borrowed from the storage collaborator.
#[derive(Debug, Clone)]
pub struct RenderInput<'a> {
    /// The device.
    pub device: &'a Device,
    /// Its configuration.
    pub configuration: &'a Configuration,
    /// Organization-wide variables, if the organization has settings.
    pub organization: Option<&'a Context>,
    /// Device-group variables, if the device is grouped.
    pub group: Option<&'a Context>,
    /// Template catalog the configuration's references resolve against.
    pub templates: &'a BTreeMap<TemplateId, Template>,
    /// VPN memberships of the configuration.
    pub vpn: Vec<VpnAttachment<'a>>,
}

impl RenderInput<'_> {
    fn sources(&self) -> ContextSources<'_> {
        ContextSources {
            device: self.device,
            configuration: self.configuration,
            organization: self.organization,
            group: self.group,
            vpn: &self.vpn,
        }
    }
}

/// Combines templates, the base document and the resolved context into the
/// document an agent downloads.
///
/// Steps, in order:
///
/// 1. resolve the context
/// 2. order the templates (required, default, explicit)
/// 3. substitute each template (context first, then its `default_values`)
///    and merge it; VPN templates append the auto-client stanza
/// 4. substitute the base document and merge it last
/// 5. collapse duplicate files and validate the structure
#[derive(Debug)]
pub struct ConfigComposer<A = TunnelStanzaGenerator> {
    resolver: ContextResolver,
    substituter: Substituter,
    auto_client: A,
}

impl ConfigComposer {
    /// Creates a composer with the default auto-client generator.
    #[must_use]
    pub fn new(resolver: ContextResolver) -> Self {
        Self::with_auto_client(resolver, TunnelStanzaGenerator)
    }
}

impl<A: AutoClient> ConfigComposer<A> {
    /// Creates a composer with a custom auto-client generator.
    #[must_use]
    pub fn with_auto_client(resolver: ContextResolver, auto_client: A) -> Self {
        Self {
            resolver,
            substituter: Substituter::new(),
            auto_client,
        }
    }

    /// Returns the context resolver.
    #[must_use]
    pub const fn resolver(&self) -> &ContextResolver {
        &self.resolver
    }

    /// Returns the auto-client generator.
    #[must_use]
    pub const fn auto_client(&self) -> &A {
        &self.auto_client
    }

    /// Resolves the context of a configuration.
    #[must_use]
    pub fn context(&self, input: &RenderInput<'_>) -> Context {
        self.resolver.resolve(&input.sources())
    }

    /// Builds the rendered document.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError`] for unresolved placeholders, backend
    /// mismatches or structural violations.
    pub fn compose(&self, input: &RenderInput<'_>) -> Result<Value, ComposeError> {
        let configuration = input.configuration;
        let context = self.context(input);
        let ordered = TemplateOrderer::new(input.templates).order(configuration)?;

        let mut document = empty_document();
        for template in ordered {
            if template.backend != configuration.backend {
                return Err(ComposeError::BackendMismatch {
                    template: template.id.clone(),
                    expected: configuration.backend.clone(),
                    found: template.backend.clone(),
                });
            }
            let fragment = self.substituter.substitute(
                template.id.as_str(),
                &template.document,
                &context,
                &template.default_values,
            )?;
            merge(&mut document, fragment);

            if template.is_vpn() {
                self.merge_auto_client(&mut document, template, input, &context)?;
            }
        }

        let base = self.substituter.substitute(
            BASE_DOCUMENT,
            &configuration.document,
            &context,
            &Context::new(),
        )?;
        merge(&mut document, base);
        dedupe_files(&mut document);
        validate(&document)?;
        Ok(document)
    }

    /// Renders the document to its canonical bytes.
    ///
    /// Object keys are sorted, so unchanged inputs give identical bytes.
    ///
    /// # Errors
    ///
    /// See [`Self::compose`].
    pub fn render(&self, input: &RenderInput<'_>) -> Result<Vec<u8>, ComposeError> {
        let document = self.compose(input)?;
        serde_json::to_vec(&document).map_err(ComposeError::Encode)
    }

    /// Builds a VPN server's own document with its peer list embedded.
    ///
    /// WireGuard servers get `wireguard[0].peers` (and the private key);
    /// VXLAN servers get a `vxlan.json` file listing the peers. A server
    /// document lacking `wireguard[0]` is left for validation to reject.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::SchemaViolation`] if the result is invalid.
    pub fn compose_vpn_server(
        &self,
        server: &VpnServer,
        peers: &[Peer],
    ) -> Result<Value, ComposeError> {
        let family = server.tunnel_family();
        let mut document = server.document.clone();

        if family.uses_wireguard() {
            if let Some(Value::Object(interface)) = document.pointer_mut("/wireguard/0") {
                interface.insert("peers".to_string(), wireguard_peers(peers));
                if let Some(key) = &server.private_key {
                    interface.insert("private_key".to_string(), json!(key));
                }
            } else {
                return Err(ComposeError::SchemaViolation {
                    path: "/wireguard/0".to_string(),
                    reason: "WireGuard server document needs an interface".to_string(),
                });
            }
        }
        if family.uses_vxlan() {
            let contents = pretty(&vxlan_peers(server, peers))?;
            merge(
                &mut document,
                json!({
                    "files": [{
                        "mode": "0644",
                        "path": VXLAN_PEERS_FILE,
                        "contents": contents,
                    }]
                }),
            );
        }
        validate(&document)?;
        Ok(document)
    }

    /// Renders a VPN server document to its canonical bytes.
    ///
    /// # Errors
    ///
    /// See [`Self::compose_vpn_server`].
    pub fn render_vpn_server(
        &self,
        server: &VpnServer,
        peers: &[Peer],
    ) -> Result<Vec<u8>, ComposeError> {
        let document = self.compose_vpn_server(server, peers)?;
        serde_json::to_vec(&document).map_err(ComposeError::Encode)
    }

    fn merge_auto_client(
        &self,
        document: &mut Value,
        template: &Template,
        input: &RenderInput<'_>,
        context: &Context,
    ) -> Result<(), ComposeError> {
        let attachment = input
            .vpn
            .iter()
            .find(|a| template.vpn.as_ref() == Some(&a.server.id));
        match attachment {
            Some(attachment) => {
                let stanza = self.auto_client.generate(attachment, context)?;
                merge(document, stanza);
            }
            None => debug!(
                "Device {} has no client on the VPN server of template {}",
                input.device.id, template.id
            ),
        }
        Ok(())
    }
}

fn wireguard_peers(peers: &[Peer]) -> Value {
    peers
        .iter()
        .filter_map(|peer| {
            let key = peer.public_key.as_ref()?;
            let prefix = if peer.address.is_ipv4() { 32 } else { 128 };
            Some(json!({
                "public_key": key,
                "allowed_ips": format!("{}/{prefix}", peer.address),
            }))
        })
        .collect()
}

fn vxlan_peers(server: &VpnServer, peers: &[Peer]) -> Value {
    let server_vni = server.server_vni();
    let interface = server.vxlan_interface();
    peers
        .iter()
        .map(|peer| {
            let mut entry = Map::new();
            entry.insert("vni".to_string(), json!(peer.vni.or(server_vni)));
            entry.insert("remote".to_string(), json!(peer.address.to_string()));
            if let Some(name) = interface {
                entry.insert("interface".to_string(), json!(name));
            }
            Value::Object(entry)
        })
        .collect()
}

/// Pretty-prints with four-space indentation and sorted keys.
fn pretty(value: &Value) -> Result<String, ComposeError> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(ComposeError::Encode)?;
    String::from_utf8(out).map_err(|err| ComposeError::SchemaViolation {
        path: format!("/files/{VXLAN_PEERS_FILE}"),
        reason: err.to_string(),
    })
}
