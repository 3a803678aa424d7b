//! Tests for context precedence and VPN variables.

use std::collections::BTreeMap;

use serde_json::json;

use crate::context::{ContextResolver, ContextSources, identity_variables, vpn_variables};
use crate::model::{Configuration, Context, Device, VpnAttachment, VpnClient, VpnServer};

fn ctx(pairs: &[(&str, &str)]) -> Context {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect::<BTreeMap<_, _>>()
}

fn device() -> Device {
    Device::new("dev-1", "secret", "router", "00:11:22:33:44:55", "org1")
}

mod precedence {
    use super::*;

    #[test]
    fn configuration_context_wins_over_lower_layers() {
        let resolver = ContextResolver::new(ctx(&[("a", "1")]));
        let device = device();
        let config = Configuration::new("dev-1", "X").with_context(ctx(&[("a", "4")]));
        let org = ctx(&[("a", "2")]);
        let group = ctx(&[("a", "3")]);

        let resolved = resolver.resolve(&ContextSources {
            device: &device,
            configuration: &config,
            organization: Some(&org),
            group: Some(&group),
            vpn: &[],
        });

        assert_eq!(resolved["a"], "4");
    }

    #[test]
    fn group_wins_over_organization_and_global() {
        let resolver = ContextResolver::new(ctx(&[("a", "1")]));
        let device = device();
        let config = Configuration::new("dev-1", "X");
        let org = ctx(&[("a", "2")]);
        let group = ctx(&[("a", "3")]);

        let resolved = resolver.resolve(&ContextSources {
            device: &device,
            configuration: &config,
            organization: Some(&org),
            group: Some(&group),
            vpn: &[],
        });

        assert_eq!(resolved["a"], "3");
    }

    #[test]
    fn identity_cannot_be_overridden() {
        let resolver = ContextResolver::new(ctx(&[("name", "global")]));
        let device = device();
        let config = Configuration::new("dev-1", "X")
            .with_context(ctx(&[("id", "forged"), ("key", "forged")]));

        let resolved = resolver.resolve(&ContextSources {
            device: &device,
            configuration: &config,
            organization: None,
            group: None,
            vpn: &[],
        });

        assert_eq!(resolved["id"], "dev-1");
        assert_eq!(resolved["key"], "secret");
        assert_eq!(resolved["name"], "router");
    }

    #[test]
    fn missing_layers_resolve_as_empty() {
        let resolver = ContextResolver::default();
        let device = device();
        let config = Configuration::new("dev-1", "X");

        let resolved = resolver.resolve(&ContextSources {
            device: &device,
            configuration: &config,
            organization: None,
            group: None,
            vpn: &[],
        });

        assert_eq!(resolved, identity_variables(&device));
    }

    #[test]
    fn resolution_is_deterministic() {
        let resolver = ContextResolver::new(ctx(&[("z", "1"), ("b", "2")]));
        let device = device();
        let config = Configuration::new("dev-1", "X").with_context(ctx(&[("m", "3")]));
        let sources = ContextSources {
            device: &device,
            configuration: &config,
            organization: None,
            group: None,
            vpn: &[],
        };

        assert_eq!(resolver.resolve(&sources), resolver.resolve(&sources));
    }
}

mod identity {
    use super::*;

    #[test]
    fn includes_mac_address() {
        let vars = identity_variables(&device());
        assert_eq!(vars["mac_address"], "00:11:22:33:44:55");
        assert!(!vars.contains_key("hardware_id"));
    }

    #[test]
    fn includes_hardware_id_when_present() {
        let vars = identity_variables(&device().with_hardware_id("HW-9"));
        assert_eq!(vars["hardware_id"], "HW-9");
    }
}

mod vpn {
    use super::*;

    #[test]
    fn wireguard_variables_keyed_by_server() {
        let server = VpnServer::new("wg1", "mesh", "Wireguard")
            .with_host("vpn.example.com")
            .with_keys("server-pub", "server-pvt")
            .with_ip_address("10.8.0.1".parse().unwrap())
            .with_document(json!({"wireguard": [{"port": 51820}]}));
        let client = VpnClient::new("dev-1", "wg1")
            .with_keys("client-pub", "client-pvt")
            .with_address("10.8.0.2".parse().unwrap());

        let vars = vpn_variables(&[VpnAttachment {
            server: &server,
            client: &client,
        }]);

        assert_eq!(vars["vpn_host_wg1"], "vpn.example.com");
        assert_eq!(vars["vpn_port_wg1"], "51820");
        assert_eq!(vars["public_key_wg1"], "server-pub");
        assert_eq!(vars["pub_key_wg1"], "client-pub");
        assert_eq!(vars["pvt_key_wg1"], "client-pvt");
        assert_eq!(vars["ip_address_wg1"], "10.8.0.2");
        assert_eq!(vars["server_ip_address_wg1"], "10.8.0.1");
        assert!(!vars.contains_key("vni_wg1"));
    }

    #[test]
    fn vxlan_vni_falls_back_to_server_vni() {
        let server = VpnServer::new("vx", "mesh", "VxlanWireguard")
            .with_document(json!({"vxlan": [{"vni": 42}]}));
        let client = VpnClient::new("dev-1", "vx");

        let vars = vpn_variables(&[VpnAttachment {
            server: &server,
            client: &client,
        }]);

        assert_eq!(vars["vni_vx"], "42");
    }

    #[test]
    fn identity_overrides_vpn_layer_and_vpn_overrides_user() {
        let resolver = ContextResolver::default();
        let device = device();
        let server = VpnServer::new("v1", "mesh", "Vxlan");
        let client = VpnClient::new("dev-1", "v1").with_vni(5);
        let config =
            Configuration::new("dev-1", "X").with_context(ctx(&[("vni_v1", "user")]));
        let vpn = [VpnAttachment {
            server: &server,
            client: &client,
        }];

        let resolved = resolver.resolve(&ContextSources {
            device: &device,
            configuration: &config,
            organization: None,
            group: None,
            vpn: &vpn,
        });

        assert_eq!(resolved["vni_v1"], "5");
    }
}
