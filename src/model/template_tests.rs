//! Tests for template flags and normalization.

use serde_json::json;

use crate::model::{Backend, ConfigStatus, Configuration, ModelError, OrgId, Template, TemplateKind};

fn template() -> Template {
    Template::new("t1", "base", "X")
}

mod flags {
    use super::*;

    #[test]
    fn required_builder_implies_default() {
        let t = template().required();
        assert!(t.required);
        assert!(t.default);
    }

    #[test]
    fn normalize_forces_default_for_required() {
        let mut t = template();
        t.required = true;

        let t = t.normalize().unwrap();
        assert!(t.default);
    }

    #[test]
    fn shared_template_is_visible_everywhere() {
        let t = template();
        assert!(t.is_visible_to(&OrgId::from("org1")));
        assert!(t.is_visible_to(&OrgId::from("org2")));
    }

    #[test]
    fn owned_template_is_visible_to_owner_only() {
        let t = template().owned_by("org1");
        assert!(t.is_visible_to(&OrgId::from("org1")));
        assert!(!t.is_visible_to(&OrgId::from("org2")));
    }

    #[test]
    fn required_for_checks_backend() {
        let t = template().required();
        let org = OrgId::from("org1");

        assert!(t.is_required_for(&Backend::from("X"), &org));
        assert!(!t.is_required_for(&Backend::from("Y"), &org));
    }
}

mod normalize {
    use super::*;

    #[test]
    fn vpn_template_without_server_is_rejected() {
        let mut t = template();
        t.kind = TemplateKind::Vpn;

        assert_eq!(
            t.normalize().unwrap_err(),
            ModelError::MissingVpnServer {
                template: "t1".into()
            }
        );
    }

    #[test]
    fn generic_template_drops_server_link() {
        let mut t = template();
        t.vpn = Some("v1".into());

        let t = t.normalize().unwrap();
        assert!(t.vpn.is_none());
    }

    #[test]
    fn non_object_document_is_rejected() {
        let t = template().with_document(json!([1, 2]));
        assert!(matches!(
            t.normalize(),
            Err(ModelError::NotAnObject { .. })
        ));
    }
}

mod content {
    use super::*;

    #[test]
    fn renaming_does_not_change_content() {
        let previous = template();
        let mut current = template();
        current.name = "renamed".to_string();

        assert!(!current.content_differs(&previous));
    }

    #[test]
    fn document_edit_changes_content() {
        let previous = template();
        let current = template().with_document(json!({"a": 1}));

        assert!(current.content_differs(&previous));
    }
}

mod serialization {
    use super::*;

    #[test]
    fn template_kind_uses_type_key() {
        let t = template().vpn_client_of("v1");
        let value = serde_json::to_value(&t).unwrap();

        assert_eq!(value["type"], "vpn");
        assert_eq!(value["vpn"], "v1");
    }

    #[test]
    fn configuration_defaults_on_deserialize() {
        let c: Configuration =
            serde_json::from_str(r#"{"device": "d1", "backend": "X"}"#).unwrap();

        assert_eq!(c.status, ConfigStatus::Modified);
        assert_eq!(c.document, json!({}));
        assert!(c.templates.is_empty());
    }

    #[test]
    fn status_serializes_lowercase() {
        let value = serde_json::to_value(ConfigStatus::Deactivating).unwrap();
        assert_eq!(value, json!("deactivating"));
        assert_eq!(ConfigStatus::Applied.to_string(), "applied");
    }

    #[test]
    fn configuration_rejects_non_object_document() {
        let c = Configuration::new("d1", "X").with_document(json!("text"));
        assert!(c.validate().is_err());
    }
}
