// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `bundle.rs`

#[cfg(test)]
mod tests {
    use super::super::{
        build_deployment, build_role, build_role_binding, deployment_replicas, listener_image,
        BundleKey, ConfigListenerBundle,
    };
    use crate::crd::{ConfigListenerSpec, Infinispan, InfinispanSpec};
    use crate::errors::ListenerError;

    const IMAGE: &str = "quay.io/infinispan/operator:2.4.0";

    fn create_test_infinispan() -> Infinispan {
        let mut cluster = Infinispan::new(
            "example",
            InfinispanSpec {
                replicas: 2,
                image: None,
                config_listener: Some(ConfigListenerSpec { enabled: true }),
            },
        );
        cluster.metadata.namespace = Some("caches".into());
        cluster
    }

    fn create_test_key() -> BundleKey {
        BundleKey::for_parent(&create_test_infinispan()).unwrap()
    }

    #[test]
    fn test_bundle_key_from_parent() {
        let key = create_test_key();

        assert_eq!(key.name(), "example-config-listener");
        assert_eq!(key.namespace(), "caches");
        assert_eq!(key.cluster(), "example");
    }

    #[test]
    fn test_bundle_key_requires_namespace() {
        let mut cluster = create_test_infinispan();
        cluster.metadata.namespace = None;

        assert!(matches!(
            BundleKey::for_parent(&cluster),
            Err(ListenerError::MissingNamespace { parent }) if parent == "example"
        ));
    }

    #[test]
    fn test_all_bundle_members_share_name_and_namespace() {
        let key = create_test_key();
        let bundle = ConfigListenerBundle::build(&key, &create_test_infinispan(), IMAGE);

        for metadata in [
            &bundle.service_account.metadata,
            &bundle.role.metadata,
            &bundle.role_binding.metadata,
            &bundle.deployment.metadata,
        ] {
            assert_eq!(metadata.name.as_deref(), Some("example-config-listener"));
            assert_eq!(metadata.namespace.as_deref(), Some("caches"));
            let labels = metadata.labels.as_ref().unwrap();
            assert_eq!(labels.get("app.kubernetes.io/instance").unwrap(), "example");
            assert_eq!(
                labels.get("app.kubernetes.io/managed-by").unwrap(),
                "config-listener-operator"
            );
        }
    }

    #[test]
    fn test_role_rules_are_fixed() {
        let role = build_role(&create_test_key());
        let rules = role.rules.unwrap();

        assert_eq!(rules.len(), 5);

        let caches = &rules[0];
        assert_eq!(caches.api_groups.as_deref(), Some(&["infinispan.org".to_string()][..]));
        assert_eq!(caches.resources.as_deref(), Some(&["caches".to_string()][..]));
        assert_eq!(
            caches.verbs,
            vec!["create", "delete", "get", "list", "patch", "update", "watch"]
        );

        let summary: Vec<(String, String, Vec<String>)> = rules[1..]
            .iter()
            .map(|rule| {
                (
                    rule.api_groups.as_ref().unwrap()[0].clone(),
                    rule.resources.as_ref().unwrap()[0].clone(),
                    rule.verbs.clone(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("infinispan.org".into(), "infinispans".into(), vec!["get".into()]),
                (String::new(), "pods".into(), vec!["list".into()]),
                (String::new(), "pods/exec".into(), vec!["create".into()]),
                (String::new(), "secrets".into(), vec!["get".into()]),
            ]
        );
    }

    #[test]
    fn test_role_binding_binds_account_to_role() {
        let binding = build_role_binding(&create_test_key());

        assert_eq!(binding.role_ref.api_group, "rbac.authorization.k8s.io");
        assert_eq!(binding.role_ref.kind, "Role");
        assert_eq!(binding.role_ref.name, "example-config-listener");

        let subjects = binding.subjects.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].kind, "ServiceAccount");
        assert_eq!(subjects[0].name, "example-config-listener");
        assert_eq!(subjects[0].namespace.as_deref(), Some("caches"));
    }

    #[test]
    fn test_deployment_runs_listener() {
        let key = create_test_key();
        let deployment = build_deployment(&key, &create_test_infinispan(), IMAGE);
        let spec = deployment.spec.as_ref().unwrap();
        let pod_spec = spec.template.spec.as_ref().unwrap();

        assert_eq!(spec.replicas, Some(1));
        assert_eq!(pod_spec.containers.len(), 1);
        assert_eq!(pod_spec.containers[0].name, "infinispan-listener");
        assert_eq!(
            pod_spec.containers[0].args.as_deref().unwrap(),
            ["listener", "-namespace", "caches", "-cluster", "example"]
        );
        assert_eq!(
            pod_spec.service_account_name.as_deref(),
            Some("example-config-listener")
        );
        assert_eq!(listener_image(&deployment), Some(IMAGE));
        assert_eq!(deployment_replicas(&deployment), Some(1));
    }

    #[test]
    fn test_deployment_pod_labels_and_selector() {
        let deployment = build_deployment(&create_test_key(), &create_test_infinispan(), IMAGE);
        let spec = deployment.spec.unwrap();
        let pod_labels = spec.template.metadata.unwrap().labels.unwrap();

        assert_eq!(pod_labels.get("app").unwrap(), "infinispan-config-listener-pod");
        assert_eq!(pod_labels.get("clusterName").unwrap(), "example");
        assert_eq!(pod_labels.get("infinispan_cr").unwrap(), "example");
        assert_eq!(spec.selector.match_labels.unwrap(), pod_labels);
    }

    #[test]
    fn test_listener_image_missing_container() {
        let mut deployment =
            build_deployment(&create_test_key(), &create_test_infinispan(), IMAGE);
        deployment
            .spec
            .as_mut()
            .unwrap()
            .template
            .spec
            .as_mut()
            .unwrap()
            .containers[0]
            .name = "sidecar".into();

        assert_eq!(listener_image(&deployment), None);
    }
}
