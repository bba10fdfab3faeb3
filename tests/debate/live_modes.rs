use axon_console::axon::{AnalysisMode, AnalysisRequest};
use axon_console::config::AxonMode;
use axon_console::debate::DebateStatus;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::debate_harness::{adapter, chat_envelope, new_view, runner};

async fn failing_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend overloaded"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn live_replies_become_debate_turns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_envelope("Fares fund maintenance.")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let runner = runner(adapter(AxonMode::Live, &server.uri()));
    let mut view = new_view(&["Ada", "Grace"], 1);
    runner.start(&mut view);
    let produced = runner.run_to_end(&mut view).await.unwrap();

    assert_eq!(produced, 2);
    let session = view.session();
    assert_eq!(session.status, DebateStatus::Completed);
    let last = session.messages.last().unwrap();
    assert_eq!(last.content, "Fares fund maintenance.");
    assert_eq!(last.model.as_deref(), Some("axon-live-1"));
    assert_eq!(last.usage.map(|u| u.total_tokens), Some(20));
}

#[tokio::test]
async fn auto_mode_falls_back_to_mock_on_backend_failure() {
    let server = failing_backend().await;
    let adapter = adapter(AxonMode::Auto, &server.uri());

    let request = AnalysisRequest {
        project_id: "integration".into(),
        prompt: "Why do buses bunch?".into(),
        mode: AnalysisMode::Kipling,
        language: "en".into(),
    };
    let analysis = adapter.analyze(&request).await.unwrap();
    assert!(analysis.id.starts_with("mock-an-"));

    let runner = runner(adapter);
    let mut view = new_view(&["Ada", "Grace"], 1);
    runner.start(&mut view);
    assert_eq!(runner.run_to_end(&mut view).await.unwrap(), 2);
    assert_eq!(view.session().status, DebateStatus::Completed);
}

#[tokio::test]
async fn auto_mode_health_reports_the_mock_when_backend_is_down() {
    let server = failing_backend().await;
    let adapter = adapter(AxonMode::Auto, &server.uri());

    let health = adapter.health().await;
    assert!(health.ok);
    assert_eq!(health.service.as_deref(), Some("axon-mock"));
}

#[tokio::test]
async fn live_mode_failure_leaves_the_session_untouched() {
    let server = failing_backend().await;
    let runner = runner(adapter(AxonMode::Live, &server.uri()));
    let mut view = new_view(&["Ada", "Grace"], 1);
    runner.start(&mut view);
    let before = view.session().clone();

    let err = runner.generate_turn(&mut view).await.unwrap_err();
    assert!(err.to_string().contains("503"));
    assert_eq!(view.session(), &before);
    assert!(matches!(
        view.session().next_speaker().map(|p| p.name.as_str()),
        Some("Ada")
    ));
}

#[tokio::test]
async fn health_is_probed_once_within_the_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "service": "axon",
            "version": "2.1.0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter(AxonMode::Live, &server.uri());
    let (a, b) = tokio::join!(adapter.health(), adapter.health());
    let c = adapter.health().await;
    assert!(a.ok && b.ok && c.ok);
    assert_eq!(c.version.as_deref(), Some("2.1.0"));
    // `expect(1)` is verified when the server drops.
}
