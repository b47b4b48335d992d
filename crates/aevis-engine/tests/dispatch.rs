//! Dispatcher and pipeline integration tests over wiremock HTTP mocks.
//!
//! One mock server plays every platform; requests are told apart by the
//! `model` field in the chat-completions body, so per-platform outages can
//! be simulated precisely.

use std::time::Duration;

use aevis_core::{Mode, PlatformSpec};
use aevis_engine::{
    dispatch, run_visibility, BandThresholds, Dimension, EngineError, EngineOptions, ErrorKind,
    ProbeContext, Query, ScoringWeights, SlotOutcome,
};
use aevis_providers::AnswerClient;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn platform(id: &str, model_ref: &str) -> PlatformSpec {
    PlatformSpec {
        id: id.to_owned(),
        model_ref: model_ref.to_owned(),
        has_native_search: true,
        requires_search_tool: false,
        fast_mode: true,
    }
}

fn queries(n: usize) -> Vec<Query> {
    (0..n)
        .map(|i| Query::new(format!("probe query number {i}"), Dimension::Recommendation))
        .collect()
}

fn options(query_count: usize) -> EngineOptions {
    EngineOptions {
        mode: Mode::Fast,
        query_count,
        max_concurrent_probes: 4,
        probe_timeout: Duration::from_secs(5),
        max_retries: 0,
        backoff_base_ms: 0,
        results_cap: 50,
        weights: ScoringWeights::default(),
        thresholds: BandThresholds::default(),
    }
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [ { "message": { "role": "assistant", "content": content } } ],
        "usage": { "total_tokens": 12 }
    })
}

async fn mock_model(server: &MockServer, model: &str, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({ "model": model })))
        .respond_with(template)
        .mount(server)
        .await;
}

fn ctx<'a>(answer: &'a AnswerClient, timeout: Duration) -> ProbeContext<'a> {
    ProbeContext {
        answer,
        search: None,
        probe_timeout: timeout,
        max_retries: 0,
        backoff_base_ms: 0,
    }
}

#[tokio::test]
async fn one_failing_platform_does_not_sink_the_run() {
    let server = MockServer::start().await;
    mock_model(
        &server,
        "good-model",
        ResponseTemplate::new(200).set_body_json(completion("Acme gets a nod here.")),
    )
    .await;
    mock_model(&server, "bad-model", ResponseTemplate::new(500)).await;

    let answer = AnswerClient::with_base_url("k", 30, &server.uri()).unwrap();
    let platforms = vec![platform("working", "good-model"), platform("failing", "bad-model")];
    let qs = queries(5);

    let results = dispatch(
        ctx(&answer, Duration::from_secs(5)),
        &qs,
        &platforms,
        4,
    )
    .await
    .expect("partial failure must not fail the run");

    assert_eq!(results.len(), 10, "every slot must produce a result");
    let failing_errors = results
        .iter()
        .filter(|r| r.platform_id == "failing" && r.is_error())
        .count();
    let working_errors = results
        .iter()
        .filter(|r| r.platform_id == "working" && r.is_error())
        .count();
    assert_eq!(failing_errors, 5);
    assert_eq!(working_errors, 0);

    // The partly-failed matrix still folds into a report with the outage
    // visible in that platform's error count.
    let outcomes = results
        .into_iter()
        .map(|r| match r.error {
            Some(kind) => SlotOutcome::Errored {
                query: r.query,
                platform_id: r.platform_id,
                kind,
            },
            None => SlotOutcome::Scored {
                analysis: aevis_engine::score(
                    &r.query,
                    &r.platform_id,
                    r.response_text.as_deref().unwrap_or_default(),
                    "Acme",
                    &[],
                    &ScoringWeights::default(),
                ),
                tokens_used: r.tokens_used,
            },
        })
        .collect();
    let report = aevis_engine::aggregate(
        "Acme",
        Mode::Fast,
        &qs,
        &platforms,
        outcomes,
        &BandThresholds::default(),
        50,
    );
    assert_eq!(report.platform_stats["failing"].errors, 5);
    assert_eq!(report.platform_stats["working"].errors, 0);
    assert_eq!(report.platform_stats["working"].responses, 5);
}

#[tokio::test]
async fn all_slots_failing_is_all_platforms_failed() {
    let server = MockServer::start().await;
    mock_model(&server, "bad-model", ResponseTemplate::new(500)).await;
    mock_model(&server, "worse-model", ResponseTemplate::new(503)).await;

    let answer = AnswerClient::with_base_url("k", 30, &server.uri()).unwrap();
    let platforms = vec![platform("one", "bad-model"), platform("two", "worse-model")];
    let qs = queries(3);

    let result = dispatch(ctx(&answer, Duration::from_secs(5)), &qs, &platforms, 4).await;

    assert!(
        matches!(result, Err(EngineError::AllPlatformsFailed { attempted: 6 })),
        "expected AllPlatformsFailed over 6 slots, got: {result:?}"
    );
}

#[tokio::test]
async fn rate_limited_platform_is_captured_as_such() {
    let server = MockServer::start().await;
    mock_model(&server, "limited-model", ResponseTemplate::new(429)).await;
    mock_model(
        &server,
        "good-model",
        ResponseTemplate::new(200).set_body_json(completion("fine")),
    )
    .await;

    let answer = AnswerClient::with_base_url("k", 30, &server.uri()).unwrap();
    let platforms = vec![
        platform("limited", "limited-model"),
        platform("working", "good-model"),
    ];
    let qs = queries(1);

    let results = dispatch(ctx(&answer, Duration::from_secs(5)), &qs, &platforms, 2)
        .await
        .unwrap();
    let limited = results.iter().find(|r| r.platform_id == "limited").unwrap();
    assert_eq!(limited.error, Some(ErrorKind::RateLimited));
}

#[tokio::test]
async fn slow_platform_resolves_as_timeout() {
    let server = MockServer::start().await;
    mock_model(
        &server,
        "slow-model",
        ResponseTemplate::new(200)
            .set_body_json(completion("eventually"))
            .set_delay(Duration::from_secs(5)),
    )
    .await;
    mock_model(
        &server,
        "good-model",
        ResponseTemplate::new(200).set_body_json(completion("quick")),
    )
    .await;

    let answer = AnswerClient::with_base_url("k", 30, &server.uri()).unwrap();
    let platforms = vec![platform("slow", "slow-model"), platform("working", "good-model")];
    let qs = queries(1);

    let results = dispatch(ctx(&answer, Duration::from_millis(300)), &qs, &platforms, 2)
        .await
        .unwrap();
    let slow = results.iter().find(|r| r.platform_id == "slow").unwrap();
    assert_eq!(slow.error, Some(ErrorKind::Timeout));
    let working = results.iter().find(|r| r.platform_id == "working").unwrap();
    assert!(!working.is_error(), "slow sibling must not block the fast one");
}

#[tokio::test]
async fn full_run_produces_report_with_fallback_queries() {
    let server = MockServer::start().await;
    // Only probe models are mocked; the query-generation model gets a 404,
    // forcing the deterministic template fallback.
    mock_model(
        &server,
        "good-model",
        ResponseTemplate::new(200).set_body_json(completion(
            "The best construction tools are Acme and BuildRight.",
        )),
    )
    .await;

    let answer = AnswerClient::with_base_url("k", 30, &server.uri()).unwrap();
    let platforms = vec![platform("working", "good-model")];
    let profile = aevis_core::CompanyProfile {
        name: "Acme".to_owned(),
        website: None,
        industry: Some("construction tools".to_owned()),
        products: vec![],
        services: vec![],
        pain_points: vec![],
        competitors: vec!["BuildRight".to_owned()],
    };

    let report = run_visibility(&answer, None, &profile, &platforms, &options(6))
        .await
        .expect("run should produce a report");

    assert_eq!(report.total_slots, 6);
    assert_eq!(report.company, "Acme");
    // Every slot answers with one Acme mention.
    assert!((report.visibility_score - 100.0).abs() < f64::EPSILON);
    assert!(report.quality_score > 0.0);
    let working = &report.platform_stats["working"];
    assert_eq!(working.responses, 6);
    assert_eq!(working.errors, 0);
    assert!(working.tokens_used > 0);
    assert!(report
        .query_results
        .iter()
        .all(|r| r.competitor_mentions.get("BuildRight") == Some(&1)));
    // Fallback queries span dimensions.
    assert!(report.dimension_stats.len() > 1);
}

#[tokio::test]
async fn query_generation_survives_model_failure() {
    // No mocks mounted: every call 404s, so the template fallback must carry.
    let server = MockServer::start().await;
    let answer = AnswerClient::with_base_url("k", 30, &server.uri()).unwrap();
    let profile = aevis_core::CompanyProfile {
        name: "Acme".to_owned(),
        website: None,
        industry: Some("construction tools".to_owned()),
        products: vec![],
        services: vec![],
        pain_points: vec![],
        competitors: vec![],
    };

    let queries = aevis_engine::generate_queries(&answer, &profile, 10).await;

    assert_eq!(queries.len(), 10);
    let mut dimensions: Vec<_> = queries.iter().map(|q| q.dimension).collect();
    dimensions.sort_unstable();
    dimensions.dedup();
    assert!(
        dimensions.len() > 1,
        "fallback queries must span multiple dimensions"
    );
    assert!(queries.iter().all(|q| !q.text.trim().is_empty()));
}

#[tokio::test]
async fn duplicate_generated_lines_fall_back_to_templates() {
    let server = MockServer::start().await;
    // A degenerate model answer: one query repeated over and over. After
    // dedupe only a single usable query remains, so templates must top up
    // the set to the requested size.
    let generated = "branded: What is Acme known for?\n".repeat(10);
    mock_model(
        &server,
        "openai/gpt-4o-mini",
        ResponseTemplate::new(200).set_body_json(completion(&generated)),
    )
    .await;

    let answer = AnswerClient::with_base_url("k", 30, &server.uri()).unwrap();
    let profile = aevis_core::CompanyProfile {
        name: "Acme".to_owned(),
        website: None,
        industry: Some("construction tools".to_owned()),
        products: vec![],
        services: vec![],
        pain_points: vec![],
        competitors: vec![],
    };

    let queries = aevis_engine::generate_queries(&answer, &profile, 6).await;

    assert_eq!(queries.len(), 6, "repeated model lines must not shrink the set");
    let mut texts: Vec<&str> = queries.iter().map(|q| q.text.as_str()).collect();
    texts.sort_unstable();
    texts.dedup();
    assert_eq!(texts.len(), 6, "topped-up queries must be distinct");
    assert!(queries
        .iter()
        .any(|q| q.text == "What is Acme known for?"));
}

#[tokio::test]
async fn query_generation_uses_model_output_when_available() {
    let server = MockServer::start().await;
    let generated = "branded: What is Acme known for?\n\
                     trend: What is changing in construction tools?\n\
                     comparison: How does Acme stack up against rivals?\n";
    mock_model(
        &server,
        "openai/gpt-4o-mini",
        ResponseTemplate::new(200).set_body_json(completion(generated)),
    )
    .await;

    let answer = AnswerClient::with_base_url("k", 30, &server.uri()).unwrap();
    let profile = aevis_core::CompanyProfile {
        name: "Acme".to_owned(),
        website: None,
        industry: Some("construction tools".to_owned()),
        products: vec![],
        services: vec![],
        pain_points: vec![],
        competitors: vec![],
    };

    let queries = aevis_engine::generate_queries(&answer, &profile, 3).await;

    assert_eq!(queries.len(), 3);
    assert_eq!(queries[0].text, "What is Acme known for?");
    assert_eq!(queries[0].dimension, Dimension::Branded);
    assert_eq!(queries[1].dimension, Dimension::Trend);
    assert_eq!(queries[2].dimension, Dimension::Comparison);
}
