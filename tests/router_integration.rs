mod common;

use common::{Health, MockProvider, Outcome, config, router_with};
use llm_router::llm::{ReportParams, ResponseFormat};
use llm_router::router::CircuitStatus;
use llm_router::{LLMRequest, ProviderId, RouterConfig, RouterError, TaskType};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn chat(prompt: &str) -> LLMRequest {
    LLMRequest::new(TaskType::Chat, prompt)
}

fn circuit_status(router: &llm_router::Router, provider: ProviderId) -> Option<CircuitStatus> {
    router
        .circuit_states()
        .into_iter()
        .find(|snapshot| snapshot.provider == provider)
        .map(|snapshot| snapshot.status)
}

#[tokio::test]
async fn test_primary_success_skips_fallbacks() {
    let anthropic = MockProvider::replying(ProviderId::Anthropic);
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(RouterConfig::default(), &[anthropic.clone(), openai.clone()]);

    let response = router.route(&chat("hi")).await.unwrap();

    assert_eq!(response.provider, ProviderId::Anthropic);
    assert_eq!(response.content, "hello from anthropic");
    assert_eq!(anthropic.calls(), 1);
    assert_eq!(openai.calls(), 0);
}

#[tokio::test]
async fn test_fatal_error_falls_back_without_retry() {
    let anthropic = MockProvider::new(ProviderId::Anthropic, Outcome::Rejected);
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let gemini = MockProvider::replying(ProviderId::Gemini);
    let router = router_with(
        RouterConfig::default(),
        &[anthropic.clone(), openai.clone(), gemini.clone()],
    );

    let response = router.route(&chat("hi")).await.unwrap();

    assert_eq!(response.provider, ProviderId::OpenAi);
    assert_eq!(anthropic.calls(), 1);
    assert_eq!(openai.calls(), 1);
    assert_eq!(gemini.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_retryable_error_is_retried_up_to_budget() {
    let router_config = config(
        r#"
        [[providers]]
        id = "anthropic"
        max_retries = 3
        base_delay_ms = 100
        "#,
    );
    let anthropic = MockProvider::new(ProviderId::Anthropic, Outcome::Unavailable);
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(router_config, &[anthropic.clone(), openai.clone()]);

    let started = Instant::now();
    let response = router.route(&chat("hi")).await.unwrap();

    assert_eq!(anthropic.calls(), 4);
    assert_eq!(response.provider, ProviderId::OpenAi);
    // 100 + 200 + 400 of backoff before giving up on the primary
    assert!(started.elapsed() >= Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_on_same_provider() {
    let anthropic = MockProvider::scripted(
        ProviderId::Anthropic,
        vec![Outcome::Unavailable],
        Outcome::Reply("second time lucky".to_string()),
    );
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(RouterConfig::default(), &[anthropic.clone(), openai.clone()]);

    let response = router.route(&chat("hi")).await.unwrap();

    assert_eq!(response.provider, ProviderId::Anthropic);
    assert_eq!(response.content, "second time lucky");
    assert_eq!(anthropic.calls(), 2);
    assert_eq!(openai.calls(), 0);

    let metrics = router
        .get_metrics()
        .into_iter()
        .find(|m| m.provider == ProviderId::Anthropic)
        .unwrap();
    assert_eq!(metrics.total_requests, 2);
    assert_eq!(metrics.failed_requests, 1);
    assert_eq!(metrics.successful_requests, 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_chain_reports_every_provider_in_order() {
    let anthropic = MockProvider::new(ProviderId::Anthropic, Outcome::Rejected);
    let openai = MockProvider::new(ProviderId::OpenAi, Outcome::Rejected);
    let gemini = MockProvider::new(ProviderId::Gemini, Outcome::Unavailable);
    let router = router_with(
        RouterConfig::default(),
        &[anthropic.clone(), openai.clone(), gemini.clone()],
    );

    let error = router.route(&chat("hi")).await.unwrap_err();

    let RouterError::Exhausted(failure) = error else {
        panic!("expected an aggregate failure");
    };
    assert_eq!(failure.task, TaskType::Chat);
    assert_eq!(
        failure.providers(),
        vec![ProviderId::Anthropic, ProviderId::OpenAi, ProviderId::Gemini]
    );
    assert!(!failure.errors[0].retryable);
    assert_eq!(failure.errors[2].status, Some(503));
    // Default budget: one attempt plus two retries
    assert_eq!(gemini.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_opens_at_threshold_and_sixth_request_skips_primary() {
    let router_config = config(
        r#"
        [[providers]]
        id = "anthropic"
        max_retries = 0
        "#,
    );
    let anthropic = MockProvider::new(ProviderId::Anthropic, Outcome::Unavailable);
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(router_config, &[anthropic.clone(), openai.clone()]);

    for _ in 0..5 {
        let response = router.route(&chat("hi")).await.unwrap();
        assert_eq!(response.provider, ProviderId::OpenAi);
    }
    assert_eq!(anthropic.calls(), 5);
    assert_eq!(circuit_status(&router, ProviderId::Anthropic), Some(CircuitStatus::Open));

    let response = router.route(&chat("hi")).await.unwrap();
    assert_eq!(response.provider, ProviderId::OpenAi);
    assert_eq!(anthropic.calls(), 5);
    assert_eq!(openai.calls(), 6);

    let metrics = router.get_metrics();
    let anthropic_metrics = metrics
        .iter()
        .find(|m| m.provider == ProviderId::Anthropic)
        .unwrap();
    assert!(anthropic_metrics.circuit_open);
    assert_eq!(anthropic_metrics.failed_requests, 5);
    assert_eq!(
        anthropic_metrics.last_error.as_deref(),
        Some("service unavailable")
    );
}

#[tokio::test(start_paused = true)]
async fn test_half_open_trial_success_closes_breaker() {
    let router_config = config(
        r#"
        [[providers]]
        id = "anthropic"
        max_retries = 0
        "#,
    );
    let anthropic = MockProvider::scripted(
        ProviderId::Anthropic,
        vec![Outcome::Unavailable; 5],
        Outcome::Reply("recovered".to_string()),
    );
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(router_config, &[anthropic.clone(), openai.clone()]);

    for _ in 0..5 {
        router.route(&chat("hi")).await.unwrap();
    }
    assert_eq!(circuit_status(&router, ProviderId::Anthropic), Some(CircuitStatus::Open));

    // Still inside the open duration
    tokio::time::advance(Duration::from_secs(10)).await;
    router.route(&chat("hi")).await.unwrap();
    assert_eq!(anthropic.calls(), 5);

    tokio::time::advance(Duration::from_secs(21)).await;
    let response = router.route(&chat("hi")).await.unwrap();

    assert_eq!(response.provider, ProviderId::Anthropic);
    assert_eq!(response.content, "recovered");
    assert_eq!(anthropic.calls(), 6);
    assert_eq!(circuit_status(&router, ProviderId::Anthropic), Some(CircuitStatus::Closed));
}

#[tokio::test(start_paused = true)]
async fn test_half_open_trial_failure_reopens_without_retrying() {
    let router_config = config(
        r#"
        [[providers]]
        id = "anthropic"
        max_retries = 2
        base_delay_ms = 10
        "#,
    );
    let anthropic = MockProvider::new(ProviderId::Anthropic, Outcome::Unavailable);
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(router_config, &[anthropic.clone(), openai.clone()]);

    // Three calls, then two more until the fifth failure opens the breaker and stops retrying
    router.route(&chat("first")).await.unwrap();
    assert_eq!(anthropic.calls(), 3);
    router.route(&chat("second")).await.unwrap();
    assert_eq!(anthropic.calls(), 5);
    assert_eq!(circuit_status(&router, ProviderId::Anthropic), Some(CircuitStatus::Open));

    tokio::time::advance(Duration::from_secs(31)).await;
    let response = router.route(&chat("trial")).await.unwrap();

    assert_eq!(response.provider, ProviderId::OpenAi);
    assert_eq!(anthropic.calls(), 6);
    assert_eq!(circuit_status(&router, ProviderId::Anthropic), Some(CircuitStatus::Open));
}

#[tokio::test(start_paused = true)]
async fn test_recovered_fallback_keeps_its_trial_until_called() {
    let router_config = config(
        r#"
        [[providers]]
        id = "openai"
        max_retries = 0
        "#,
    );
    let openai = MockProvider::scripted(
        ProviderId::OpenAi,
        vec![Outcome::Unavailable; 5],
        Outcome::Reply("openai is back".to_string()),
    );
    let anthropic = MockProvider::scripted(
        ProviderId::Anthropic,
        vec![Outcome::Reply("covering".to_string()); 6],
        Outcome::Rejected,
    );
    let router = router_with(router_config, &[anthropic.clone(), openai.clone()]);

    // Extraction goes to OpenAI first, so these open its breaker
    for _ in 0..5 {
        let request = LLMRequest::new(TaskType::Extraction, "pull the totals");
        let response = router.route(&request).await.unwrap();
        assert_eq!(response.provider, ProviderId::Anthropic);
    }
    assert_eq!(openai.calls(), 5);
    assert_eq!(circuit_status(&router, ProviderId::OpenAi), Some(CircuitStatus::Open));

    // OpenAI is an admissible chat fallback now, but the primary answers
    tokio::time::advance(Duration::from_secs(31)).await;
    let response = router.route(&chat("hi")).await.unwrap();
    assert_eq!(response.provider, ProviderId::Anthropic);
    assert_eq!(openai.calls(), 5);
    assert_eq!(circuit_status(&router, ProviderId::OpenAi), Some(CircuitStatus::Open));

    tokio::time::advance(Duration::from_secs(1)).await;
    let response = router.route(&chat("hi again")).await.unwrap();

    assert_eq!(response.provider, ProviderId::OpenAi);
    assert_eq!(response.content, "openai is back");
    assert_eq!(openai.calls(), 6);
    assert_eq!(circuit_status(&router, ProviderId::OpenAi), Some(CircuitStatus::Closed));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_share_one_half_open_trial() {
    let router_config = config(
        r#"
        [[providers]]
        id = "anthropic"
        max_retries = 0
        "#,
    );
    let anthropic = MockProvider::scripted(
        ProviderId::Anthropic,
        vec![Outcome::Unavailable; 5],
        Outcome::Slow(Duration::from_millis(100)),
    );
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = Arc::new(router_with(
        router_config,
        &[anthropic.clone(), openai.clone()],
    ));

    for _ in 0..5 {
        router.route(&chat("hi")).await.unwrap();
    }
    assert_eq!(circuit_status(&router, ProviderId::Anthropic), Some(CircuitStatus::Open));

    let spawn_batch = |count: usize| -> Vec<_> {
        (0..count)
            .map(|i| {
                let router = router.clone();
                tokio::spawn(async move { router.route(&chat(&format!("request {i}"))).await })
            })
            .collect()
    };

    // Just opened: every concurrent request lands on the first fallback
    for handle in spawn_batch(3) {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.provider, ProviderId::OpenAi);
    }
    assert_eq!(anthropic.calls(), 5);
    assert_eq!(openai.calls(), 8);

    tokio::time::advance(Duration::from_secs(31)).await;

    // Half-open: exactly one in-flight request carries the trial
    let mut served_by = Vec::new();
    for handle in spawn_batch(4) {
        served_by.push(handle.await.unwrap().unwrap().provider);
    }

    let trials = served_by
        .iter()
        .filter(|provider| **provider == ProviderId::Anthropic)
        .count();
    assert_eq!(trials, 1);
    assert_eq!(anthropic.calls(), 6);
    assert_eq!(openai.calls(), 11);
    assert_eq!(circuit_status(&router, ProviderId::Anthropic), Some(CircuitStatus::Closed));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_counts_as_retryable_failure() {
    let router_config = config(
        r#"
        [[providers]]
        id = "anthropic"
        timeout_ms = 1000
        max_retries = 1
        base_delay_ms = 100
        "#,
    );
    let anthropic = MockProvider::new(ProviderId::Anthropic, Outcome::Hang);
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(router_config, &[anthropic.clone(), openai.clone()]);

    let started = Instant::now();
    let response = router.route(&chat("hi")).await.unwrap();

    assert_eq!(response.provider, ProviderId::OpenAi);
    assert_eq!(anthropic.calls(), 2);
    assert!(started.elapsed() >= Duration::from_millis(2100));

    let metrics = router
        .get_metrics()
        .into_iter()
        .find(|m| m.provider == ProviderId::Anthropic)
        .unwrap();
    assert_eq!(metrics.failed_requests, 2);
    assert!(metrics.last_error.unwrap().contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn test_lone_timeout_surfaces_as_retryable_error() {
    let router_config = config(
        r#"
        [[providers]]
        id = "anthropic"
        timeout_ms = 500
        max_retries = 0
        "#,
    );
    let anthropic = MockProvider::new(ProviderId::Anthropic, Outcome::Hang);
    let router = router_with(router_config, &[anthropic]);

    let RouterError::Exhausted(failure) = router.route(&chat("hi")).await.unwrap_err() else {
        panic!("expected an aggregate failure");
    };
    assert_eq!(failure.errors.len(), 1);
    assert!(failure.errors[0].retryable);
    assert_eq!(failure.errors[0].provider, ProviderId::Anthropic);
}

#[tokio::test(start_paused = true)]
async fn test_chain_deadline_stops_fallbacks() {
    let router_config = config(
        r#"
        chain_deadline_ms = 1500
        "#,
    );
    let anthropic = MockProvider::new(ProviderId::Anthropic, Outcome::Hang);
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(router_config, &[anthropic.clone(), openai.clone()]);

    let started = Instant::now();
    let RouterError::Exhausted(failure) = router.route(&chat("hi")).await.unwrap_err() else {
        panic!("expected an aggregate failure");
    };

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1500));
    assert!(elapsed < Duration::from_millis(1600));
    assert_eq!(anthropic.calls(), 1);
    assert_eq!(openai.calls(), 0);
    assert_eq!(
        failure.providers(),
        vec![ProviderId::Anthropic, ProviderId::OpenAi]
    );
    assert_eq!(failure.errors[1].message, "chain deadline exceeded");
}

#[tokio::test]
async fn test_cost_and_tokens_accumulate_monotonically() {
    let anthropic = MockProvider::replying(ProviderId::Anthropic);
    let router = router_with(RouterConfig::default(), &[anthropic]);

    let mut last_cost = 0.0;
    for round in 1..=3u64 {
        router.route(&chat("hi")).await.unwrap();
        let metrics = router
            .get_metrics()
            .into_iter()
            .find(|m| m.provider == ProviderId::Anthropic)
            .unwrap();
        assert!(metrics.estimated_cost_usd > last_cost);
        assert_eq!(metrics.input_tokens, 1_000 * round);
        assert_eq!(metrics.output_tokens, 500 * round);
        last_cost = metrics.estimated_cost_usd;
    }
}

#[tokio::test]
async fn test_get_metrics_has_no_side_effects() {
    let anthropic = MockProvider::replying(ProviderId::Anthropic);
    let groq = MockProvider::replying(ProviderId::Groq);
    let router = router_with(RouterConfig::default(), &[anthropic, groq]);
    router.route(&chat("hi")).await.unwrap();

    let first = router.get_metrics();
    let second = router.get_metrics();
    assert_eq!(first, second);
    // Registered providers report zeros before their first request
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].provider, ProviderId::Groq);
    assert_eq!(first[1].total_requests, 0);
}

#[tokio::test]
async fn test_safety_net_uses_any_general_provider() {
    let groq = MockProvider::replying(ProviderId::Groq);
    let reports = MockProvider::replying(ProviderId::ReportService);
    let router = router_with(RouterConfig::default(), &[groq.clone(), reports.clone()]);

    // Chat routes to anthropic, openai and gemini; none is registered
    let response = router.route(&chat("hi")).await.unwrap();

    assert_eq!(response.provider, ProviderId::Groq);
    assert_eq!(groq.calls(), 1);
    assert_eq!(reports.calls(), 0);
}

#[tokio::test]
async fn test_no_providers_available() {
    let reports = MockProvider::replying(ProviderId::ReportService);
    let router = router_with(RouterConfig::default(), &[reports.clone()]);

    let RouterError::Exhausted(failure) = router.route(&chat("hi")).await.unwrap_err() else {
        panic!("expected an aggregate failure");
    };

    assert_eq!(failure.providers(), vec![ProviderId::Anthropic]);
    assert_eq!(failure.errors[0].message, "no providers available");
    assert_eq!(reports.calls(), 0);
}

#[tokio::test]
async fn test_model_override_targets_primary_only() {
    let anthropic = MockProvider::new(ProviderId::Anthropic, Outcome::Rejected);
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(RouterConfig::default(), &[anthropic.clone(), openai.clone()]);

    let request = chat("hi").with_model("claude-3-opus-latest");
    let response = router.route(&request).await.unwrap();

    assert_eq!(anthropic.models(), vec!["claude-3-opus-latest"]);
    assert_eq!(openai.models(), vec!["gpt-4o-mini"]);
    assert_eq!(response.model, "gpt-4o-mini");
}

#[tokio::test]
async fn test_rule_defaults_fill_unset_parameters() {
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(RouterConfig::default(), &[openai.clone()]);

    let request = LLMRequest::new(TaskType::Extraction, "{\"a\": 1}").with_temperature(0.5);
    router.route(&request).await.unwrap();

    let seen = openai.last_request().unwrap();
    assert_eq!(seen.response_format, Some(ResponseFormat::Json));
    assert_eq!(seen.max_tokens, Some(4096));
    assert_eq!(seen.temperature, Some(0.5));
    assert_eq!(seen.id, request.id);

    let vision = LLMRequest::new(TaskType::Vision, "what is this");
    router.route(&vision).await.unwrap();
    assert_eq!(openai.models().last().map(String::as_str), Some("gpt-4o"));
}

#[tokio::test]
async fn test_embed_bypasses_routing() {
    let openai = MockProvider::new(ProviderId::OpenAi, Outcome::Rejected);
    let router = router_with(RouterConfig::default(), &[openai.clone()]);

    let texts = vec!["alpha".to_string(), "be".to_string()];
    let vectors = router.embed(&texts, None).await.unwrap();

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0][0], 5.0);
    assert!(router.circuit_states().is_empty());
    assert_eq!(router.get_metrics()[0].total_requests, 0);
}

#[tokio::test]
async fn test_embed_without_embedding_provider() {
    let anthropic = MockProvider::replying(ProviderId::Anthropic);
    let router = router_with(RouterConfig::default(), &[anthropic.clone()]);

    let error = router.embed(&["x".to_string()], None).await.unwrap_err();
    assert_eq!(error.provider, ProviderId::OpenAi);
    assert!(!error.retryable);
    assert_eq!(anthropic.calls(), 0);
}

#[tokio::test]
async fn test_generate_report_bypasses_routing() {
    let reports = MockProvider::replying(ProviderId::ReportService);
    let router = router_with(RouterConfig::default(), &[reports.clone()]);

    let params = ReportParams {
        title: "weekly".to_string(),
        content: "numbers".to_string(),
        format: "pdf".to_string(),
        options: serde_json::Value::Null,
    };
    let result = router.generate_report(&params).await.unwrap();

    assert_eq!(result.status, "queued");
    assert_eq!(result.url.as_deref(), Some("https://reports.test/weekly"));
    assert_eq!(reports.calls(), 1);
    assert!(router.circuit_states().is_empty());
}

#[tokio::test]
async fn test_health_check_isolates_failures() {
    let router = router_with(
        RouterConfig::default(),
        &[
            MockProvider::with_health(ProviderId::Anthropic, Health::Up),
            MockProvider::with_health(ProviderId::OpenAi, Health::Down),
            MockProvider::with_health(ProviderId::Gemini, Health::Panics),
        ],
    );

    let health = router.health_check().await;

    assert_eq!(health.len(), 3);
    assert!(health[&ProviderId::Anthropic]);
    assert!(!health[&ProviderId::OpenAi]);
    assert!(!health[&ProviderId::Gemini]);
}

#[tokio::test]
async fn test_override_route_changes_chain() {
    let anthropic = MockProvider::replying(ProviderId::Anthropic);
    let groq = MockProvider::replying(ProviderId::Groq);
    let router = router_with(RouterConfig::default(), &[anthropic.clone(), groq.clone()]);

    router
        .override_route(TaskType::Chat, ProviderId::Groq, vec![ProviderId::Anthropic])
        .await
        .unwrap();
    let response = router.route(&chat("hi")).await.unwrap();

    assert_eq!(response.provider, ProviderId::Groq);
    assert_eq!(anthropic.calls(), 0);

    let table = router.routing_table().await;
    let rule = table.rule(TaskType::Chat).unwrap();
    assert_eq!(rule.chain(), vec![ProviderId::Groq, ProviderId::Anthropic]);
    // Defaults survive the override
    assert_eq!(rule.defaults.max_tokens, Some(2048));
}

#[tokio::test]
async fn test_override_route_rejects_report_service() {
    let router = router_with(RouterConfig::default(), &[]);

    let error = router
        .override_route(TaskType::Chat, ProviderId::ReportService, vec![])
        .await
        .unwrap_err();
    assert!(matches!(error, RouterError::Config(_)));

    let table = router.routing_table().await;
    assert_eq!(table.rule(TaskType::Chat).unwrap().primary, ProviderId::Anthropic);
}

#[tokio::test(start_paused = true)]
async fn test_reset_circuit_restores_primary() {
    let router_config = config(
        r#"
        [circuit_breaker]
        failure_threshold = 1

        [[providers]]
        id = "anthropic"
        max_retries = 0
        "#,
    );
    let anthropic = MockProvider::scripted(
        ProviderId::Anthropic,
        vec![Outcome::Unavailable],
        Outcome::Reply("back".to_string()),
    );
    let openai = MockProvider::replying(ProviderId::OpenAi);
    let router = router_with(router_config, &[anthropic.clone(), openai]);

    router.route(&chat("hi")).await.unwrap();
    assert_eq!(circuit_status(&router, ProviderId::Anthropic), Some(CircuitStatus::Open));

    router.reset_circuit(ProviderId::Anthropic);
    let response = router.route(&chat("hi")).await.unwrap();

    assert_eq!(response.provider, ProviderId::Anthropic);
    assert_eq!(anthropic.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_limit_is_respected() {
    let router_config = config(
        r#"
        [[providers]]
        id = "anthropic"
        max_concurrency = 2
        "#,
    );
    let anthropic = MockProvider::new(
        ProviderId::Anthropic,
        Outcome::Slow(Duration::from_millis(100)),
    );
    let router = Arc::new(router_with(router_config, &[anthropic.clone()]));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let router = router.clone();
            tokio::spawn(async move { router.route(&chat(&format!("request {i}"))).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(anthropic.calls(), 6);
    assert_eq!(anthropic.max_in_flight(), 2);
}

#[tokio::test]
async fn test_route_settings_from_config_apply() {
    let router_config = config(
        r#"
        [[routes]]
        task = "translation"
        primary = "mistral"
        fallbacks = ["openai"]
        max_tokens = 512
        "#,
    );
    let mistral = MockProvider::replying(ProviderId::Mistral);
    let deepseek = MockProvider::replying(ProviderId::DeepSeek);
    let router = router_with(router_config, &[mistral.clone(), deepseek.clone()]);

    let response = router
        .route(&LLMRequest::new(TaskType::Translation, "bonjour"))
        .await
        .unwrap();

    assert_eq!(response.provider, ProviderId::Mistral);
    assert_eq!(mistral.last_request().unwrap().max_tokens, Some(512));
    assert_eq!(deepseek.calls(), 0);
}

#[tokio::test]
async fn test_report_only_route_config_is_rejected() {
    let router_config = config(
        r#"
        [[routes]]
        task = "chat"
        primary = "report_service"
        "#,
    );
    let registry = llm_router::router::ProviderRegistry::new();
    let result = llm_router::Router::with_providers(router_config, registry);
    assert!(matches!(result, Err(RouterError::Config(_))));
}
