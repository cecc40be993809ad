use super::*;
use crate::config::SwitchboardConfig;

fn example_registry() -> Registry {
    let config = SwitchboardConfig::parse(include_str!("../../switchboard.example.toml")).unwrap();
    Registry::from_config(&config).unwrap()
}

fn registry_from(toml: &str) -> Registry {
    let config = SwitchboardConfig::parse(toml).unwrap();
    Registry::from_config(&config).unwrap()
}

#[test]
fn test_instance_status_serialization() {
    let json = serde_json::to_string(&InstanceStatus::Draining).unwrap();
    assert_eq!(json, r#""draining""#);

    let status: InstanceStatus = serde_json::from_str(r#""healthy""#).unwrap();
    assert_eq!(status, InstanceStatus::Healthy);
}

#[test]
fn test_registry_loads_example_agents_in_order() {
    let registry = example_registry();
    let ids: Vec<String> = registry.agents().iter().map(|a| a.id.clone()).collect();
    assert_eq!(
        ids,
        vec!["customer_service", "technical_support", "sales_specialist"]
    );
    assert_eq!(registry.team_count(), 8);
}

#[test]
fn test_profile_preserves_rule_order() {
    let registry = example_registry();
    let tech = registry.agent("technical_support").unwrap();
    assert_eq!(tech.rules[0].trigger(), "system down");
    assert_eq!(tech.rules[5].trigger(), "security breach");
    assert_eq!(tech.rules[5].target, "security_team");
    for (i, rule) in tech.rules.iter().enumerate() {
        assert_eq!(rule.index, i);
    }
}

#[test]
fn test_profile_temperature_and_specializations() {
    let registry = example_registry();
    let sales = registry.agent("sales_specialist").unwrap();
    assert!((sales.temperature - 0.7).abs() < f32::EPSILON);
    assert!(sales.specializations.contains(&"pricing".to_string()));
}

#[test]
fn test_instances_sorted_by_priority() {
    let registry = registry_from(
        r#"
        [routing]
        sentiment_triggers = []

        [[agents]]
        id = "support"
        rules = []

        [[agents.instances]]
        id = "support-low"
        priority = 9

        [[agents.instances]]
        id = "support-high"
        priority = 1

        [[agents.instances]]
        id = "support-high-2"
        priority = 1
        "#,
    );

    let support = registry.agent("support").unwrap();
    let ids: Vec<&str> = support.instances.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["support-high", "support-high-2", "support-low"]);
    assert_eq!(support.primary_instance().unwrap().id, "support-high");
}

#[test]
fn test_agent_without_instances_gets_implicit_instance() {
    let registry = registry_from(
        r#"
        [routing]
        sentiment_triggers = []

        [[agents]]
        id = "solo"
        rules = []
        "#,
    );

    let solo = registry.agent("solo").unwrap();
    assert_eq!(solo.instances.len(), 1);
    assert_eq!(solo.instances[0].id, "solo");
    assert_eq!(registry.instance_status("solo"), Some(InstanceStatus::Healthy));
}

#[test]
fn test_from_config_rejects_invalid_table() {
    let config = SwitchboardConfig::parse(
        r#"
        [routing]
        sentiment_triggers = []

        [[agents]]
        id = "customer_service"

        [[agents.rules]]
        trigger = "pricing"
        target = "nobody"
        "#,
    )
    .unwrap();

    let result = Registry::from_config(&config);
    assert!(matches!(
        result,
        Err(crate::config::ConfigError::UnknownTarget { .. })
    ));
}

#[test]
fn test_handler_kind() {
    let registry = example_registry();
    assert_eq!(
        registry.handler_kind("technical_support"),
        Some(HandlerKind::Agent)
    );
    assert_eq!(registry.handler_kind("legal_team"), Some(HandlerKind::Team));
    assert_eq!(registry.handler_kind("nobody"), None);
}

#[test]
fn test_set_instance_status() {
    let registry = example_registry();
    let previous = registry
        .set_instance_status("technical_support-1", InstanceStatus::Unhealthy)
        .unwrap();
    assert_eq!(previous, InstanceStatus::Healthy);
    assert_eq!(
        registry.instance_status("technical_support-1"),
        Some(InstanceStatus::Unhealthy)
    );
}

#[test]
fn test_set_status_unknown_instance() {
    let registry = example_registry();
    let result = registry.set_instance_status("ghost", InstanceStatus::Draining);
    assert!(matches!(result, Err(RegistryError::UnknownInstance(ref id)) if id == "ghost"));
}

#[test]
fn test_assign_and_release_sessions() {
    let registry = example_registry();
    assert_eq!(registry.assign_session("sales_specialist-1").unwrap(), 1);
    assert_eq!(registry.assign_session("sales_specialist-1").unwrap(), 2);
    assert_eq!(registry.release_session("sales_specialist-1").unwrap(), 1);
    assert_eq!(registry.session_count("sales_specialist-1"), Some(1));
}

#[test]
fn test_release_session_never_underflows() {
    let registry = example_registry();
    assert_eq!(registry.release_session("sales_specialist-1").unwrap(), 0);
    assert_eq!(registry.release_session("sales_specialist-1").unwrap(), 0);
    assert_eq!(registry.session_count("sales_specialist-1"), Some(0));
}

#[test]
fn test_instance_loads_snapshot() {
    let registry = example_registry();
    registry.assign_session("technical_support-2").unwrap();
    registry
        .set_instance_status("technical_support-1", InstanceStatus::Draining)
        .unwrap();

    let loads = registry.instance_loads("technical_support").unwrap();
    assert_eq!(loads.len(), 2);
    assert_eq!(loads[0].instance_id, "technical_support-1");
    assert_eq!(loads[0].status, InstanceStatus::Draining);
    assert_eq!(loads[1].sessions, 1);
}

#[test]
fn test_instance_loads_unknown_agent() {
    let registry = example_registry();
    assert!(matches!(
        registry.instance_loads("security_team"),
        Err(RegistryError::UnknownAgent(_))
    ));
}

#[test]
fn test_concurrent_session_accounting() {
    let registry = std::sync::Arc::new(example_registry());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    registry.assign_session("customer_service-1").unwrap();
                }
                for _ in 0..50 {
                    registry.release_session("customer_service-1").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(registry.session_count("customer_service-1"), Some(400));
}
