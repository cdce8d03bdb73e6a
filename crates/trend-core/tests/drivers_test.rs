mod common;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use trend_core::notify::{WebhookDriver, DEFAULT_GITHUB_EVENT_TYPE};
use trend_core::{create_driver, Driver, DriverKind, Error, NotificationConfig};

fn body_json(request: &reqwest::Request) -> Value {
    let bytes = request.body().and_then(|b| b.as_bytes()).expect("buffered body");
    serde_json::from_slice(bytes).unwrap()
}

fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn build(config: &NotificationConfig) -> Driver {
    create_driver(config).unwrap().expect("driver")
}

#[test]
fn slack_posts_text_field() {
    let driver = build(&NotificationConfig::Slack {
        webhook_url: "https://hooks.slack.test/T/B/X".into(),
    });
    let request = driver.build_request(&Client::new(), "hello").unwrap();

    assert_eq!(request.method(), reqwest::Method::POST);
    assert_eq!(request.url().as_str(), "https://hooks.slack.test/T/B/X");
    assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
    assert!(request.headers().get(AUTHORIZATION).is_none());
    assert_eq!(body_json(&request), serde_json::json!({ "text": "hello" }));
}

#[test]
fn discord_suppresses_embeds() {
    let driver = build(&NotificationConfig::Discord {
        webhook_url: "https://discord.test/api/webhooks/1/abc".into(),
    });
    let request = driver.build_request(&Client::new(), "hello").unwrap();

    assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(
        body_json(&request),
        serde_json::json!({ "content": "hello", "flags": 4 })
    );
}

#[test]
fn webhook_custom_headers_are_merged() {
    let driver = build(&NotificationConfig::Webhook {
        url: "https://hook.test/in".into(),
        custom_headers: headers(&[("X-Test", "1")]),
    });
    let request = driver.build_request(&Client::new(), "draft").unwrap();

    let sent = request.headers();
    assert_eq!(sent[CONTENT_TYPE], "application/json");
    assert_eq!(sent["x-test"], "1");
    assert_eq!(sent.len(), 2);

    let body = body_json(&request);
    assert_eq!(body["content"], "draft");
    let ts = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
}

#[test]
fn webhook_custom_headers_win_on_collision() {
    let driver = build(&NotificationConfig::Webhook {
        url: "https://hook.test/in".into(),
        custom_headers: headers(&[("content-type", "application/vnd.custom+json")]),
    });
    let request = driver.build_request(&Client::new(), "draft").unwrap();

    let values: Vec<_> = request.headers().get_all(CONTENT_TYPE).iter().collect();
    assert_eq!(values, vec!["application/vnd.custom+json"]);
}

#[test]
fn webhook_custom_payload_is_sent_verbatim() {
    let driver = WebhookDriver::new("https://hook.test/in".into(), &BTreeMap::new())
        .unwrap()
        .with_payload_builder(|content| serde_json::json!({ "msg": content.to_uppercase() }));
    let request = Driver::Webhook(driver)
        .build_request(&Client::new(), "draft")
        .unwrap();

    assert_eq!(body_json(&request), serde_json::json!({ "msg": "DRAFT" }));
}

#[test]
fn github_dispatch_shape() {
    let driver = build(&NotificationConfig::GitHub {
        owner: "octo".into(),
        repo: "news".into(),
        token: "ghp_secret".into(),
        event_type: None,
    });
    let request = driver.build_request(&Client::new(), "draft").unwrap();

    assert_eq!(
        request.url().as_str(),
        "https://api.github.com/repos/octo/news/dispatches"
    );
    assert_eq!(request.headers()[AUTHORIZATION], "token ghp_secret");
    assert_eq!(request.headers()["accept"], "application/vnd.github.v3+json");

    let body = body_json(&request);
    assert_eq!(body["event_type"], DEFAULT_GITHUB_EVENT_TYPE);
    assert_eq!(body["client_payload"]["content"], "draft");
    assert!(body["client_payload"]["timestamp"].is_string());
}

#[test]
fn missing_fields_fail_at_construction() {
    let cases = [
        NotificationConfig::Slack {
            webhook_url: String::new(),
        },
        NotificationConfig::Discord {
            webhook_url: "  ".into(),
        },
        NotificationConfig::Webhook {
            url: String::new(),
            custom_headers: BTreeMap::new(),
        },
        NotificationConfig::GitHub {
            owner: "octo".into(),
            repo: String::new(),
            token: "t".into(),
            event_type: None,
        },
    ];

    for config in cases {
        let err = create_driver(&config).unwrap_err();
        match err {
            Error::MissingField { driver, .. } => assert_eq!(driver, config.kind().as_str()),
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn construction_is_repeatable() {
    let good = NotificationConfig::Slack {
        webhook_url: "https://hooks.slack.test/x".into(),
    };
    let first = build(&good);
    let second = build(&good);
    assert_eq!(first.kind(), DriverKind::Slack);
    assert_eq!(first.kind(), second.kind());

    let client = Client::new();
    let a = first.build_request(&client, "same").unwrap();
    let b = second.build_request(&client, "same").unwrap();
    assert_eq!(a.url(), b.url());
    assert_eq!(body_json(&a), body_json(&b));

    let bad = NotificationConfig::Slack {
        webhook_url: String::new(),
    };
    for _ in 0..3 {
        assert!(matches!(
            create_driver(&bad),
            Err(Error::MissingField { driver: "slack", .. })
        ));
    }
}

#[test]
fn invalid_header_names_are_rejected() {
    let err = create_driver(&NotificationConfig::Webhook {
        url: "https://hook.test".into(),
        custom_headers: headers(&[("bad header", "1")]),
    })
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn send_reports_transport_failures() {
    let driver = build(&NotificationConfig::Slack {
        webhook_url: "http://127.0.0.1:9/hook".into(),
    });
    let err = driver.send(&Client::new(), "hello").await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn send_surfaces_non_success_status_with_body() {
    let (base, requests) = common::serve(vec![(500, "nope")]).await;
    let driver = build(&NotificationConfig::Slack {
        webhook_url: format!("{base}/hook"),
    });

    let err = driver.send(&Client::new(), "hello").await.unwrap_err();
    match err {
        Error::Status {
            service,
            status,
            body,
        } => {
            assert_eq!(service, "slack");
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "nope");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let sent = requests.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, "POST");
    assert_eq!(sent[0].target, "/hook");
    assert_eq!(sent[0].json(), serde_json::json!({ "text": "hello" }));
}

#[tokio::test]
async fn send_maps_too_many_requests_to_rate_limited() {
    let (base, _requests) = common::serve(vec![(429, "slow down")]).await;
    let driver = build(&NotificationConfig::Discord {
        webhook_url: format!("{base}/api/webhooks/1/abc"),
    });

    let err = driver.send(&Client::new(), "hello").await.unwrap_err();
    assert!(
        matches!(err, Error::RateLimited { service: "discord" }),
        "got {err:?}"
    );
}
