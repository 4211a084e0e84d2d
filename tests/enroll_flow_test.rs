//! End-to-end tests for the stateful enroll flow against a mock backend

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use learner_portal::analytics::{AnalyticsSink, EnrollmentEvent};
use learner_portal::config::PortalConfig;
use learner_portal::enroll::{EnrollCallbacks, EnrollError, StatefulEnroll};
use learner_portal::services::ApiClient;
use learner_portal::types::{SubsidyAccessPolicy, SubsidyTransaction, TransactionState};
use serde_json::json;

#[derive(Debug, Default)]
struct CountingSink {
    search_conversions: AtomicUsize,
    enrollments: AtomicUsize,
}

impl AnalyticsSink for CountingSink {
    fn track_search_conversion(&self, _event: &EnrollmentEvent<'_>) {
        self.search_conversions.fetch_add(1, Ordering::SeqCst);
    }
    fn track_enterprise_enrollment(&self, _event: &EnrollmentEvent<'_>) {
        self.enrollments.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_config() -> PortalConfig {
    let mut config = PortalConfig::default();
    // Keep the fixed-interval semantics but make the tests fast.
    config.polling.interval_ms = 10;
    config
}

fn policy(redemption_url: &str) -> SubsidyAccessPolicy {
    SubsidyAccessPolicy {
        uuid: "policy-1".to_string(),
        policy_redemption_url: redemption_url.to_string(),
        policy_type: None,
        display_name: None,
    }
}

fn transaction_body(uuid: &str, state: &str, status_url: &str) -> String {
    json!({
        "uuid": uuid,
        "state": state,
        "lms_user_id": 123,
        "content_key": "course-v1:X",
        "subsidy_access_policy_uuid": "policy-1",
        "transaction_status_api_url": status_url,
    })
    .to_string()
}

#[tokio::test]
async fn redeem_polls_until_committed_and_fires_success_once() {
    let mut server = mockito::Server::new_async().await;
    let status_url = format!("{}/status/", server.url());

    let post_mock = server
        .mock("POST", "/redeem/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(transaction_body("t1", "pending", &status_url))
        .expect(1)
        .create_async()
        .await;

    // First poll still pending, second poll committed.
    let polls = Arc::new(AtomicUsize::new(0));
    let polls_cb = polls.clone();
    let status_url_cb = status_url.clone();
    let status_mock = server
        .mock("GET", "/status/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body_from_request(move |_request| {
            let n = polls_cb.fetch_add(1, Ordering::SeqCst);
            let state = if n == 0 { "pending" } else { "committed" };
            transaction_body("t1", state, &status_url_cb).into_bytes()
        })
        .expect(2)
        .create_async()
        .await;

    let config = Arc::new(test_config());
    let api = Arc::new(ApiClient::new(config).unwrap());
    let analytics = Arc::new(CountingSink::default());

    let successes: Arc<Mutex<Vec<SubsidyTransaction>>> = Arc::new(Mutex::new(Vec::new()));
    let successes_cb = successes.clone();
    let began = Arc::new(AtomicUsize::new(0));
    let began_cb = began.clone();

    let enroll = StatefulEnroll::new(
        api,
        analytics.clone(),
        123,
        "course-v1:X",
        Some(policy(&format!("{}/redeem/", server.url()))),
    )
    .with_callbacks(EnrollCallbacks {
        on_begin_redeem: Some(Box::new(move || {
            began_cb.fetch_add(1, Ordering::SeqCst);
        })),
        on_success: Some(Box::new(move |tx| {
            successes_cb.lock().unwrap().push(tx.clone());
        })),
        on_error: None,
    });

    let final_tx = enroll.redeem(None).await.unwrap();

    post_mock.assert_async().await;
    status_mock.assert_async().await;
    assert_eq!(final_tx.state, TransactionState::Committed);
    assert_eq!(began.load(Ordering::SeqCst), 1);

    let successes = successes.lock().unwrap();
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].uuid, "t1");
    assert_eq!(successes[0].state, TransactionState::Committed);
    assert_eq!(analytics.search_conversions.load(Ordering::SeqCst), 1);
    assert_eq!(analytics.enrollments.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn redeem_without_policy_issues_no_request() {
    let mut server = mockito::Server::new_async().await;
    let catch_all = server
        .mock("POST", mockito::Matcher::Regex(".*".to_string()))
        .expect(0)
        .create_async()
        .await;

    let config = Arc::new(test_config());
    let api = Arc::new(ApiClient::new(config).unwrap());
    let analytics = Arc::new(CountingSink::default());

    let errors = Arc::new(AtomicUsize::new(0));
    let errors_cb = errors.clone();
    let enroll = StatefulEnroll::new(api, analytics, 123, "course-v1:X", None)
        .with_callbacks(EnrollCallbacks {
            on_begin_redeem: None,
            on_success: None,
            on_error: Some(Box::new(move |_| {
                errors_cb.fetch_add(1, Ordering::SeqCst);
            })),
        });

    let result = enroll.redeem(None).await;
    assert!(matches!(result, Err(EnrollError::MissingSubsidyPolicy)));
    // The precondition failure is logged, not surfaced through on_error.
    assert_eq!(errors.load(Ordering::SeqCst), 0);
    catch_all.assert_async().await;
}

#[tokio::test]
async fn failed_poll_synthesizes_transaction_failed_error() {
    let mut server = mockito::Server::new_async().await;
    let status_url = format!("{}/status/", server.url());

    server
        .mock("POST", "/redeem/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(transaction_body("X", "pending", &status_url))
        .create_async()
        .await;
    server
        .mock("GET", "/status/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(transaction_body("X", "failed", &status_url))
        .create_async()
        .await;

    let config = Arc::new(test_config());
    let api = Arc::new(ApiClient::new(config).unwrap());
    let analytics = Arc::new(CountingSink::default());

    let error_messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let error_messages_cb = error_messages.clone();
    let enroll = StatefulEnroll::new(
        api,
        analytics.clone(),
        123,
        "course-v1:X",
        Some(policy(&format!("{}/redeem/", server.url()))),
    )
    .with_callbacks(EnrollCallbacks {
        on_begin_redeem: None,
        on_success: None,
        on_error: Some(Box::new(move |error| {
            error_messages_cb.lock().unwrap().push(error.to_string());
        })),
    });

    let result = enroll.redeem(None).await;
    assert!(matches!(result, Err(EnrollError::TransactionFailed { .. })));

    let messages = error_messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Transaction X failed during redemption."));
    assert_eq!(analytics.search_conversions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn poll_budget_exhaustion_yields_timeout() {
    let mut server = mockito::Server::new_async().await;
    let status_url = format!("{}/status/", server.url());

    server
        .mock("POST", "/redeem/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(transaction_body("t9", "pending", &status_url))
        .create_async()
        .await;
    let status_mock = server
        .mock("GET", "/status/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(transaction_body("t9", "pending", &status_url))
        .expect(2)
        .create_async()
        .await;

    let mut config = test_config();
    config.polling.max_attempts = 2;
    let api = Arc::new(ApiClient::new(Arc::new(config)).unwrap());
    let analytics = Arc::new(CountingSink::default());

    let enroll = StatefulEnroll::new(
        api,
        analytics,
        123,
        "course-v1:X",
        Some(policy(&format!("{}/redeem/", server.url()))),
    );

    let result = enroll.redeem(None).await;
    match result {
        Err(EnrollError::Timeout { uuid, attempts }) => {
            assert_eq!(uuid, "t9");
            assert_eq!(attempts, 2);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    status_mock.assert_async().await;
}

#[tokio::test]
async fn transport_error_on_submit_routes_to_on_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/redeem/")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let config = Arc::new(test_config());
    let api = Arc::new(ApiClient::new(config).unwrap());
    let analytics = Arc::new(CountingSink::default());

    let errors = Arc::new(AtomicUsize::new(0));
    let errors_cb = errors.clone();
    let enroll = StatefulEnroll::new(
        api,
        analytics,
        123,
        "course-v1:X",
        Some(policy(&format!("{}/redeem/", server.url()))),
    )
    .with_callbacks(EnrollCallbacks {
        on_begin_redeem: None,
        on_success: None,
        on_error: Some(Box::new(move |_| {
            errors_cb.fetch_add(1, Ordering::SeqCst);
        })),
    });

    let result = enroll.redeem(None).await;
    assert!(matches!(result, Err(EnrollError::Api(_))));
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}
