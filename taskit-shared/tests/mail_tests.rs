/// Mail delivery against a mocked SendGrid API

use serde_json::json;
use taskit_shared::mail::{EmailMessage, MailConfig, MailError, Mailer};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mailer_for(server: &MockServer) -> Mailer {
    Mailer::new(MailConfig {
        api_key: Some("SG.test-key".to_string()),
        from_address: "noreply@taskit.test".to_string(),
        api_url: format!("{}/v3/mail/send", server.uri()),
    })
}

#[tokio::test]
async fn test_deliver_posts_sendgrid_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer SG.test-key"))
        .and(body_partial_json(json!({
            "personalizations": [{ "to": [{ "email": "steve@example.com" }] }],
            "from": { "email": "noreply@taskit.test" },
            "subject": "Thanks for joining in!"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let mailer = mailer_for(&server);
    assert!(mailer.is_enabled());

    mailer
        .deliver(&EmailMessage::welcome("steve@example.com", "Steve"))
        .await
        .expect("delivery should succeed");
}

#[tokio::test]
async fn test_deliver_reports_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let result = mailer_for(&server)
        .deliver(&EmailMessage::cancellation("steve@example.com", "Steve"))
        .await;

    match result {
        Err(MailError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_background_send_reaches_api() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(body_partial_json(json!({
            "subject": "Goodbye, thanks for joining in!"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    mailer_for(&server).send_cancellation_email("grant@example.com", "Grant");

    // The send runs on a detached task; give it a moment to land
    for _ in 0..50 {
        if !server.received_requests().await.unwrap_or_default().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    server.verify().await;
}
