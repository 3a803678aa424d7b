//! Tests for template ordering and required/default enforcement.

use std::collections::BTreeMap;

use crate::model::{Backend, Configuration, OrgId, Template, TemplateId};
use crate::template::{TemplateError, TemplateOrderer, check_unique_name, sort_templates};

fn catalog(templates: Vec<Template>) -> BTreeMap<TemplateId, Template> {
    templates.into_iter().map(|t| (t.id.clone(), t)).collect()
}

fn ids(list: &[&str]) -> Vec<TemplateId> {
    list.iter().map(|s| TemplateId::from(*s)).collect()
}

fn org() -> OrgId {
    OrgId::from("org1")
}

/// Catalog used by most tests:
/// - `req2` (created 2) and `req1` (created 5): required
/// - `def` (created 1): default
/// - `a`, `b`: plain
/// - `y`: plain, other backend
/// - `foreign`: plain, owned by another organization
fn standard() -> BTreeMap<TemplateId, Template> {
    catalog(vec![
        Template::new("req1", "req1", "X").required().created_at(5),
        Template::new("req2", "req2", "X").required().created_at(2),
        Template::new("def", "def", "X").enabled_by_default().created_at(1),
        Template::new("a", "a", "X").created_at(3),
        Template::new("b", "b", "X").created_at(4),
        Template::new("y", "y", "Y").created_at(6),
        Template::new("foreign", "foreign", "X").owned_by("org2").created_at(7),
    ])
}

mod sorting {
    use super::*;

    #[test]
    fn required_then_default_then_explicit() {
        let cat = standard();
        let selection: Vec<&Template> = ["b", "def", "a", "req1", "req2"]
            .iter()
            .map(|id| &cat[&TemplateId::from(*id)])
            .collect();

        assert_eq!(
            sort_templates(&selection),
            ids(&["req2", "req1", "def", "b", "a"])
        );
    }

    #[test]
    fn duplicates_are_dropped() {
        let cat = standard();
        let a = &cat[&TemplateId::from("a")];
        let b = &cat[&TemplateId::from("b")];

        assert_eq!(sort_templates(&[a, b, a]), ids(&["a", "b"]));
    }

    #[test]
    fn order_is_independent_of_insertion_order() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);
        let first = Configuration::new("d1", "X").with_templates(["a", "def", "req1"]);
        let second = Configuration::new("d1", "X").with_templates(["req1", "a", "def"]);

        let first: Vec<_> = orderer.order(&first).unwrap().iter().map(|t| t.id.clone()).collect();
        let second: Vec<_> = orderer.order(&second).unwrap().iter().map(|t| t.id.clone()).collect();

        assert_eq!(first, ids(&["req1", "def", "a"]));
        assert_eq!(first, second);
    }

    #[test]
    fn order_rejects_backend_mismatch() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);
        let config = Configuration::new("d1", "X").with_templates(["y"]);

        assert!(matches!(
            orderer.order(&config),
            Err(TemplateError::BackendMismatch { .. })
        ));
    }

    #[test]
    fn order_rejects_unknown_template() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);
        let config = Configuration::new("d1", "X").with_templates(["ghost"]);

        assert_eq!(
            orderer.order(&config).unwrap_err(),
            TemplateError::NotFound("ghost".into())
        );
    }
}

mod required_defaults {
    use super::*;

    #[test]
    fn empty_configuration_receives_defaults_and_required() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);
        let config = Configuration::new("d1", "X");

        assert_eq!(
            orderer.apply_required_defaults(&config, &org()),
            ids(&["req2", "req1", "def"])
        );
    }

    #[test]
    fn explicit_selection_receives_required_only() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);
        let config = Configuration::new("d1", "X").with_templates(["a"]);

        assert_eq!(
            orderer.apply_required_defaults(&config, &org()),
            ids(&["req2", "req1", "a"])
        );
    }

    #[test]
    fn out_of_scope_defaults_are_skipped() {
        let cat = catalog(vec![
            Template::new("mine", "mine", "X").enabled_by_default().owned_by("org1"),
            Template::new("theirs", "theirs", "X").enabled_by_default().owned_by("org2"),
            Template::new("other", "other", "Y").enabled_by_default(),
        ]);
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer.apply_required_defaults(&Configuration::new("d1", "X"), &org()),
            ids(&["mine"])
        );
    }
}

mod mutations {
    use super::*;

    fn attached() -> Configuration {
        Configuration::new("d1", "X").with_templates(["req2", "req1", "a"])
    }

    #[test]
    fn detach_required_is_rejected() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer.detach(&attached(), &org(), &"req1".into()),
            Err(TemplateError::RequiredTemplateViolation {
                template: "req1".into()
            })
        );
    }

    #[test]
    fn detach_plain_template() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer.detach(&attached(), &org(), &"a".into()).unwrap(),
            ids(&["req2", "req1"])
        );
    }

    #[test]
    fn detach_absent_template_is_noop() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer.detach(&attached(), &org(), &"b".into()).unwrap(),
            ids(&["req2", "req1", "a"])
        );
    }

    #[test]
    fn clear_keeps_required_templates() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(orderer.clear(&attached(), &org()), ids(&["req2", "req1"]));
    }

    #[test]
    fn select_without_required_is_rejected() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        let err = orderer
            .select(&attached(), &org(), &ids(&["req2", "b"]))
            .unwrap_err();
        assert_eq!(
            err,
            TemplateError::RequiredTemplateViolation {
                template: "req1".into()
            }
        );
    }

    #[test]
    fn select_sorts_requested_list() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer
                .select(&attached(), &org(), &ids(&["b", "req1", "a", "req2"]))
                .unwrap(),
            ids(&["req2", "req1", "b", "a"])
        );
    }

    #[test]
    fn attach_appends_after_existing_explicit() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer.attach(&attached(), &org(), &"b".into()).unwrap(),
            ids(&["req2", "req1", "a", "b"])
        );
    }

    #[test]
    fn attach_foreign_template_is_rejected() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert!(matches!(
            orderer.attach(&attached(), &org(), &"foreign".into()),
            Err(TemplateError::OrganizationMismatch { .. })
        ));
    }

    #[test]
    fn attach_other_backend_is_rejected() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert!(matches!(
            orderer.attach(&attached(), &org(), &"y".into()),
            Err(TemplateError::BackendMismatch { .. })
        ));
    }
}

mod backend_change {
    use super::*;

    #[test]
    fn drops_mismatching_templates_and_adds_defaults_when_empty() {
        let cat = catalog(vec![
            Template::new("x", "x", "X"),
            Template::new("y-def", "y-def", "Y").enabled_by_default().created_at(1),
            Template::new("y-req", "y-req", "Y").required().created_at(2),
        ]);
        let orderer = TemplateOrderer::new(&cat);
        let config = Configuration::new("d1", "X").with_templates(["x"]);

        assert_eq!(
            orderer.rebackend(&config, &org(), &Backend::from("Y")),
            ids(&["y-req", "y-def"])
        );
    }

    #[test]
    fn keeps_matching_templates_and_adds_required_only() {
        let cat = catalog(vec![
            Template::new("both", "both", "Y"),
            Template::new("x", "x", "X"),
            Template::new("y-def", "y-def", "Y").enabled_by_default(),
            Template::new("y-req", "y-req", "Y").required(),
        ]);
        let orderer = TemplateOrderer::new(&cat);
        let config = Configuration::new("d1", "X").with_templates(["x", "both"]);

        assert_eq!(
            orderer.rebackend(&config, &org(), &Backend::from("Y")),
            ids(&["y-req", "both"])
        );
    }
}

mod rescoping {
    use super::*;

    fn config(list: &[&str]) -> Configuration {
        Configuration::new("d1", "X").with_templates(list.iter().copied())
    }

    #[test]
    fn group_swap_replaces_group_templates() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer.rescope(&config(&["req2", "req1", "a"]), &org(), &ids(&["a"]), &ids(&["b"])),
            ids(&["req2", "req1", "b"])
        );
    }

    #[test]
    fn templates_of_previous_organization_are_dropped() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer.rescope(&config(&["req2", "req1", "foreign", "a"]), &org(), &[], &[]),
            ids(&["req2", "req1", "a"])
        );
    }

    #[test]
    fn unusable_additions_are_skipped() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer.rescope(&config(&["req2", "req1"]), &org(), &[], &ids(&["y", "foreign", "b"])),
            ids(&["req2", "req1", "b"])
        );
    }

    #[test]
    fn required_templates_cannot_be_dropped() {
        let cat = standard();
        let orderer = TemplateOrderer::new(&cat);

        assert_eq!(
            orderer.rescope(&config(&["req2", "req1", "a"]), &org(), &ids(&["req1", "a"]), &[]),
            ids(&["req2", "req1"])
        );
    }
}

mod names {
    use super::*;

    #[test]
    fn duplicate_name_in_same_scope_is_rejected() {
        let cat = standard();
        let candidate = Template::new("new", "a", "X");

        assert_eq!(
            check_unique_name(cat.values(), &candidate),
            Err(TemplateError::DuplicateName {
                name: "a".to_string()
            })
        );
    }

    #[test]
    fn same_name_in_other_scope_is_allowed() {
        let cat = standard();
        let candidate = Template::new("new", "a", "X").owned_by("org1");

        assert!(check_unique_name(cat.values(), &candidate).is_ok());
    }

    #[test]
    fn updating_template_keeps_its_own_name() {
        let cat = standard();
        let candidate = Template::new("a", "a", "X");

        assert!(check_unique_name(cat.values(), &candidate).is_ok());
    }
}
