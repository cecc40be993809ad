use super::*;
use crate::breaker::CircuitState;
use std::time::Duration;

fn example_config() -> SwitchboardConfig {
    SwitchboardConfig::parse(include_str!("../../switchboard.example.toml")).unwrap()
}

fn router() -> Router {
    Router::from_config(&example_config()).unwrap()
}

fn open_breaker(router: &Router, handler: &str) {
    for _ in 0..router.breakers().config().failure_threshold {
        router.breakers().begin(handler).unwrap().fail(false);
    }
    assert_eq!(router.breakers().state(handler), CircuitState::Open);
}

#[test]
fn test_no_match_continues() {
    let router = router();
    let decision = router
        .evaluate_text("customer_service", "Hi, how are you today?")
        .unwrap();
    assert_eq!(
        decision,
        RoutingDecision::Continue {
            agent: "customer_service".to_string()
        }
    );
    assert!(router.breakers().snapshot().is_empty());
}

#[test]
fn test_technical_issue_escalates_to_technical_support() {
    let router = router();
    let decision = router
        .evaluate_text("customer_service", "I have a technical issue with login")
        .unwrap();

    match decision {
        RoutingDecision::Escalate {
            from,
            target,
            instance,
            rule,
            fallback,
        } => {
            assert_eq!(from, "customer_service");
            assert_eq!(target, "technical_support");
            assert_eq!(instance.as_deref(), Some("technical_support-1"));
            assert_eq!(rule.trigger, "technical issue");
            assert_eq!(rule.source, RuleSource::Agent);
            assert!(!fallback);
        }
        other => panic!("expected escalation, got {:?}", other),
    }
}

#[test]
fn test_pricing_escalates_to_sales() {
    let router = router();
    let decision = router
        .evaluate_text("customer_service", "Can you explain your PRICING?")
        .unwrap();
    assert_eq!(decision.target(), Some("sales_specialist"));
    assert!(decision.is_escalation());
}

#[test]
fn test_first_listed_rule_wins() {
    let router = router();
    // "error" (index 2) and "pricing" (index 11) both match
    let decision = router
        .evaluate_text("customer_service", "pricing page shows an error")
        .unwrap();
    let rule = decision.rule().unwrap();
    assert_eq!(rule.trigger, "error");
    assert_eq!(rule.index, 2);
    assert_eq!(decision.target(), Some("technical_support"));
}

#[test]
fn test_table_order_beats_specificity() {
    let router = router();
    // "bug" is listed before the longer, more specific "technical issue"
    let decision = router
        .evaluate_text("customer_service", "technical issue: found a bug")
        .unwrap();
    assert_eq!(decision.rule().unwrap().trigger, "bug");
}

#[test]
fn test_keyword_rule_ignores_partial_words() {
    let router = router();
    let decision = router
        .evaluate_text("customer_service", "Thanks for the explanation")
        .unwrap();
    assert!(matches!(decision, RoutingDecision::Continue { .. }));

    let decision = router
        .evaluate_text("customer_service", "Which plan should I pick?")
        .unwrap();
    assert_eq!(decision.target(), Some("sales_specialist"));
}

#[test]
fn test_team_target_has_no_instance() {
    let router = router();
    let decision = router
        .evaluate_text("technical_support", "We suspect a security breach")
        .unwrap();
    match decision {
        RoutingDecision::Escalate {
            target, instance, ..
        } => {
            assert_eq!(target, "security_team");
            assert!(instance.is_none());
        }
        other => panic!("expected escalation, got {:?}", other),
    }
}

#[test]
fn test_sentiment_routes_to_supervisor() {
    let router = router();
    let decision = router
        .evaluate_text("technical_support", "This is unacceptable")
        .unwrap();
    let rule = decision.rule().unwrap();
    assert_eq!(rule.source, RuleSource::Sentiment);
    assert_eq!(rule.target, "supervisor");
}

#[test]
fn test_agent_rule_beats_sentiment() {
    let router = router();
    // "broken" is an agent rule; "angry" is only a sentiment trigger
    let decision = router
        .evaluate_text("customer_service", "I'm angry, the app is broken")
        .unwrap();
    let rule = decision.rule().unwrap();
    assert_eq!(rule.source, RuleSource::Agent);
    assert_eq!(rule.target, "technical_support");
}

#[test]
fn test_sentiment_disabled_by_empty_list() {
    let mut config = example_config();
    config.routing.sentiment_triggers.clear();
    let router = Router::from_config(&config).unwrap();
    let decision = router
        .evaluate_text("technical_support", "This is unacceptable")
        .unwrap();
    assert!(matches!(decision, RoutingDecision::Continue { .. }));
}

#[test]
fn test_blank_sentiment_trigger_refused_at_load() {
    let mut config = example_config();
    config.routing.sentiment_triggers.push(String::new());
    let result = Router::from_config(&config);
    assert!(matches!(
        result,
        Err(ConfigError::Validation { ref field, .. }) if field.starts_with("routing.sentiment_triggers")
    ));
}

#[test]
fn test_unknown_agent_is_an_error() {
    let router = router();
    let result = router.evaluate_text("billing", "hello");
    assert_eq!(result, Err(RoutingError::UnknownAgent("billing".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_open_breaker_falls_back_to_next_instance() {
    let router = router();
    open_breaker(&router, "technical_support-1");

    let decision = router
        .evaluate_text("customer_service", "the app keeps crashing, crash after crash")
        .unwrap();
    match decision {
        RoutingDecision::Escalate {
            instance, fallback, ..
        } => {
            assert_eq!(instance.as_deref(), Some("technical_support-2"));
            assert!(fallback);
        }
        other => panic!("expected fallback escalation, got {:?}", other),
    }
    assert_eq!(router.stats().fallbacks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_all_breakers_open_degrades_with_follow_up() {
    let router = router();
    open_breaker(&router, "technical_support-1");
    open_breaker(&router, "technical_support-2");

    let decision = router
        .evaluate_text("customer_service", "installation failed")
        .unwrap();
    assert_eq!(
        decision,
        RoutingDecision::Degraded {
            agent: "customer_service".to_string(),
            target: "technical_support".to_string(),
            rule: MatchedRule {
                source: RuleSource::Agent,
                index: 7,
                trigger: "installation".to_string(),
                target: "technical_support".to_string(),
            },
            reason: DegradeReason::BreakerOpen,
        }
    );
    assert!(decision.needs_follow_up());
    assert_eq!(decision.handling_agent(), "customer_service");
    assert_eq!(router.stats().follow_ups, 1);
}

#[tokio::test(start_paused = true)]
async fn test_open_team_breaker_degrades() {
    let router = router();
    open_breaker(&router, "legal_team");

    let decision = router
        .evaluate_text("sales_specialist", "question about liability")
        .unwrap();
    assert!(matches!(
        decision,
        RoutingDecision::Degraded {
            reason: DegradeReason::BreakerOpen,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_breaker_recovers_after_open_duration() {
    let router = router();
    open_breaker(&router, "sales_specialist-1");
    assert!(router
        .evaluate_text("customer_service", "any discount?")
        .unwrap()
        .needs_follow_up());

    tokio::time::advance(Duration::from_millis(30_000)).await;
    let decision = router
        .evaluate_text("customer_service", "any discount?")
        .unwrap();
    assert!(decision.is_escalation());
    assert_eq!(
        router.breakers().state("sales_specialist-1"),
        CircuitState::HalfOpen
    );
}

#[test]
fn test_unhealthy_instances_are_skipped() {
    let router = router();
    router
        .registry()
        .set_instance_status("technical_support-1", InstanceStatus::Unhealthy)
        .unwrap();

    let decision = router
        .evaluate_text("customer_service", "it's broken")
        .unwrap();
    match decision {
        RoutingDecision::Escalate {
            instance, fallback, ..
        } => {
            assert_eq!(instance.as_deref(), Some("technical_support-2"));
            // Health is not a breaker fallback
            assert!(!fallback);
        }
        other => panic!("expected escalation, got {:?}", other),
    }
}

#[test]
fn test_no_healthy_instance_degrades() {
    let router = router();
    router
        .registry()
        .set_instance_status("sales_specialist-1", InstanceStatus::Draining)
        .unwrap();

    let decision = router
        .evaluate_text("customer_service", "I'd like a quote")
        .unwrap();
    assert!(matches!(
        decision,
        RoutingDecision::Degraded {
            reason: DegradeReason::NoHealthyInstance,
            ..
        }
    ));
}

#[test]
fn test_least_loaded_instance_selected() {
    let router = router();
    for _ in 0..3 {
        router.registry().assign_session("technical_support-1").unwrap();
    }
    router.registry().assign_session("technical_support-2").unwrap();

    let decision = router.evaluate_text("customer_service", "bug report").unwrap();
    match decision {
        RoutingDecision::Escalate {
            instance, fallback, ..
        } => {
            assert_eq!(instance.as_deref(), Some("technical_support-2"));
            assert!(!fallback);
        }
        other => panic!("expected escalation, got {:?}", other),
    }
}

#[test]
fn test_saturated_target_reports_no_capacity() {
    let mut config = example_config();
    config.routing.max_sessions_per_agent = 2;
    let router = Router::from_config(&config).unwrap();
    for _ in 0..2 {
        router.registry().assign_session("sales_specialist-1").unwrap();
    }

    let decision = router
        .evaluate_text("customer_service", "upgrade please")
        .unwrap();
    assert_eq!(
        decision.label(),
        "no_capacity",
        "unexpected decision {:?}",
        decision
    );
    assert!(!decision.needs_follow_up());
    assert_eq!(router.stats().decisions.no_capacity, 1);
}

#[test]
fn test_decisions_are_counted() {
    let router = router();
    router.evaluate_text("customer_service", "hello").unwrap();
    router.evaluate_text("customer_service", "pricing").unwrap();

    let stats = router.stats();
    assert_eq!(stats.decisions.total, 2);
    assert_eq!(stats.decisions.continued, 1);
    assert_eq!(stats.decisions.escalated, 1);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Text made only of digits and spaces matches no trigger.
        #[test]
        fn prop_unmatched_turns_continue_without_breaker_state(text in "[0-9 ]{0,80}") {
            let router = router();
            for agent in ["customer_service", "technical_support", "sales_specialist"] {
                let decision = router.evaluate_text(agent, &text).unwrap();
                prop_assert_eq!(decision, RoutingDecision::Continue { agent: agent.to_string() });
            }
            prop_assert!(router.breakers().snapshot().is_empty());
        }

        /// When two rules match, the earlier one decides.
        #[test]
        fn prop_earlier_rule_wins(
            i in 0usize..26,
            j in 0usize..26,
            filler in "[0-9 ]{0,10}",
        ) {
            prop_assume!(i < j);
            let router = router();
            let profile = router.registry().agent("customer_service").unwrap();
            let first = &profile.rules[i];
            let second = &profile.rules[j];

            let text = format!("{} {} {}", first.trigger(), filler, second.trigger());
            let decision = router.evaluate_text("customer_service", &text).unwrap();
            let rule = decision.rule().unwrap();

            // An even earlier rule may match inside the combined text, but
            // never a later one
            prop_assert!(rule.index <= i);
        }
    }
}
