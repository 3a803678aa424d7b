//! Tests for the peer registry.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::model::{VpnClient, VpnServerId};
use crate::vpn::{Peer, PeerSource, VpnError, VpnPeerRegistry};

/// Peer source backed by a mutable client list, counting loads.
#[derive(Default)]
struct FakeSource {
    clients: Mutex<BTreeMap<VpnServerId, Vec<VpnClient>>>,
    loads: AtomicUsize,
}

impl FakeSource {
    fn attach(&self, client: &VpnClient) {
        self.clients
            .lock()
            .unwrap()
            .entry(client.server.clone())
            .or_default()
            .push(client.clone());
    }

    fn detach(&self, client: &VpnClient) {
        if let Some(list) = self.clients.lock().unwrap().get_mut(&client.server) {
            list.retain(|c| c.device != client.device);
        }
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl PeerSource for FakeSource {
    fn load_peers(&self, server: &VpnServerId) -> Option<Vec<Peer>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let clients = self.clients.lock().unwrap();
        let list = clients.get(server)?;
        Some(list.iter().filter_map(Peer::from_client).collect())
    }
}

fn client(device: &str, ip: &str) -> VpnClient {
    VpnClient::new(device, "v")
        .with_public_key(format!("{device}-pub"))
        .with_address(ip.parse().unwrap())
}

fn devices(peers: &[Peer]) -> Vec<&str> {
    peers.iter().map(|p| p.device.as_str()).collect()
}

fn attach(registry: &VpnPeerRegistry, source: &FakeSource, client: &VpnClient) {
    source.attach(client);
    registry.on_client_attached(client);
}

fn detach(registry: &VpnPeerRegistry, source: &FakeSource, client: &VpnClient) {
    source.detach(client);
    registry.on_client_detached(client);
}

mod registry {
    use super::*;

    #[test]
    fn attach_order_is_preserved() {
        let registry = VpnPeerRegistry::new();
        let source = FakeSource::default();
        let server = VpnServerId::from("v");
        source.clients.lock().unwrap().insert(server.clone(), Vec::new());

        // Warm the cache so attachments append instead of rebuilding.
        assert!(registry.peers_for(&server, &source).unwrap().is_empty());
        attach(&registry, &source, &client("c1", "10.0.0.2"));
        attach(&registry, &source, &client("c2", "10.0.0.3"));

        let peers = registry.peers_for(&server, &source).unwrap();
        assert_eq!(devices(&peers), ["c1", "c2"]);
        assert_eq!(source.loads(), 1);
    }

    #[test]
    fn detach_forces_rebuild() {
        let registry = VpnPeerRegistry::new();
        let source = FakeSource::default();
        let server = VpnServerId::from("v");
        let c1 = client("c1", "10.0.0.2");
        let c2 = client("c2", "10.0.0.3");
        attach(&registry, &source, &c1);
        attach(&registry, &source, &c2);
        let _ = registry.peers_for(&server, &source).unwrap();

        detach(&registry, &source, &c1);
        assert!(!registry.is_warm(&server));

        let peers = registry.peers_for(&server, &source).unwrap();
        assert_eq!(devices(&peers), ["c2"]);
        assert_eq!(source.loads(), 2);
    }

    #[test]
    fn attach_to_cold_server_does_not_populate() {
        let registry = VpnPeerRegistry::new();
        let source = FakeSource::default();
        attach(&registry, &source, &client("c1", "10.0.0.2"));

        assert!(!registry.is_warm(&VpnServerId::from("v")));
    }

    #[test]
    fn duplicate_append_is_ignored() {
        let registry = VpnPeerRegistry::new();
        let source = FakeSource::default();
        let server = VpnServerId::from("v");
        let c1 = client("c1", "10.0.0.2");
        source.attach(&c1);
        let _ = registry.peers_for(&server, &source).unwrap();

        registry.on_client_attached(&c1);

        assert_eq!(devices(&registry.peers_for(&server, &source).unwrap()), ["c1"]);
    }

    #[test]
    fn unknown_server_is_reported() {
        let registry = VpnPeerRegistry::new();
        let source = FakeSource::default();

        assert_eq!(
            registry.peers_for(&"ghost".into(), &source),
            Err(VpnError::UnknownServer("ghost".into()))
        );
        assert!(!registry.is_warm(&"ghost".into()));
    }
}

mod peer {
    use super::*;

    #[test]
    fn manual_clients_are_not_peers() {
        assert!(Peer::from_client(&client("c1", "10.0.0.2").manual()).is_none());
    }

    #[test]
    fn clients_without_address_are_not_peers() {
        assert!(Peer::from_client(&VpnClient::new("c1", "v")).is_none());
    }

    #[test]
    fn peer_carries_key_address_and_vni() {
        let peer = Peer::from_client(&client("c1", "10.0.0.2").with_vni(9)).unwrap();

        assert_eq!(peer.public_key.as_deref(), Some("c1-pub"));
        assert_eq!(peer.address.to_string(), "10.0.0.2");
        assert_eq!(peer.vni, Some(9));
    }
}
