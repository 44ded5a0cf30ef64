#![cfg(unix)]

mod support;

use serial_test::serial;
use std::thread;
use std::time::Duration;
use support::{
    bundled_knowledge, exit_repl, expect_text, openai_config, read_trace_file, spawn_app,
    submit_line,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}
        ]
    })
}

#[test]
#[serial]
fn unmatched_question_is_answered_by_completion_service() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_string_contains("asdkjaslkdj"))
            .and(body_string_contains("Here is relevant information from our knowledge base"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("Mock agent says hello")),
            )
            .expect(1)
            .mount(&server)
            .await;
    });

    let config = openai_config(&server.uri(), 4_000);
    let mut app = spawn_app(Some(&config), &bundled_knowledge(), &[]);
    expect_text(&mut app.session, "fallback via openai/gpt-test");
    expect_text(&mut app.session, "you> ");

    submit_line(&mut app.session, "asdkjaslkdj");
    expect_text(&mut app.session, "[generated] Mock agent says hello");
    expect_text(&mut app.session, "you> ");

    exit_repl(&mut app.session);
    let (_path, content) = read_trace_file(&app.state_home);
    assert!(content.contains("[user.in    ] asdkjaslkdj"), "{content}");
    assert!(content.contains("[kb.miss    ]"), "{content}");
    assert!(content.contains("[ai.http.in ] POST"), "{content}");
    assert!(
        content.contains("[ai.out     ] Mock agent says hello"),
        "{content}"
    );
    assert!(
        !content.contains("Bearer test-key"),
        "trace must not contain the API key"
    );
}

#[test]
#[serial]
fn provider_failure_degrades_then_recovers() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("first question xyzzy"))
            .respond_with(ResponseTemplate::new(500).set_body_string("provider down"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("second question xyzzy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Recovered answer")))
            .expect(1)
            .mount(&server)
            .await;
    });

    let config = openai_config(&server.uri(), 4_000);
    let mut app = spawn_app(Some(&config), &bundled_knowledge(), &[]);
    expect_text(&mut app.session, "you> ");

    submit_line(&mut app.session, "first question xyzzy");
    expect_text(&mut app.session, "[unavailable] I'm having trouble answering that right now");

    submit_line(&mut app.session, "second question xyzzy");
    expect_text(&mut app.session, "[generated] Recovered answer");

    exit_repl(&mut app.session);
    let (_path, content) = read_trace_file(&app.state_home);
    assert!(
        content.contains("[ai.degraded] provider request failed with status 500"),
        "{content}"
    );
    assert!(content.contains("[ai.out     ] Recovered answer"), "{content}");
}

#[test]
#[serial]
fn rejected_api_key_shows_hint() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;
    });

    let config = openai_config(&server.uri(), 4_000);
    let mut app = spawn_app(Some(&config), &bundled_knowledge(), &[]);
    expect_text(&mut app.session, "you> ");

    submit_line(&mut app.session, "asdkjaslkdj");
    expect_text(&mut app.session, "[unavailable]");
    expect_text(&mut app.session, "rejected the configured API key");
    exit_repl(&mut app.session);
}

#[test]
#[serial]
fn slow_completion_times_out_and_session_continues() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(completion_body("too late")),
            )
            .mount(&server)
            .await;
    });

    let config = openai_config(&server.uri(), 200);
    let mut app = spawn_app(Some(&config), &bundled_knowledge(), &[]);
    expect_text(&mut app.session, "you> ");

    submit_line(&mut app.session, "asdkjaslkdj");
    expect_text(&mut app.session, "[unavailable]");

    submit_line(&mut app.session, "What does EVA do?");
    expect_text(&mut app.session, "[knowledge 0.63]");
    thread::sleep(Duration::from_millis(100));

    exit_repl(&mut app.session);
    let (_path, content) = read_trace_file(&app.state_home);
    assert!(
        content.contains("[ai.degraded] provider did not answer within 200 ms"),
        "{content}"
    );
    assert!(!content.contains("too late"), "{content}");
}
