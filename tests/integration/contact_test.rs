//! Contact and Knowledge Base Integration Tests
//!
//! End-to-end over the real HTTP client against a canned local responder.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use aspirepath::models::settings::AppConfig;
use aspirepath::{AppError, AppState};
use aspirepath_core::{ContactSubmission, UploadFile};

/// A received request: request line and body.
type Seen = Arc<Mutex<Vec<(String, String)>>>;

/// Serve canned `(path, status line, body)` responses until the test ends.
async fn serve(routes: Vec<(&'static str, &'static str, &'static str)>) -> (String, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let (line, body) = read_request(&mut socket).await;
            let path = line.split_whitespace().nth(1).unwrap_or("").to_string();
            log.lock().unwrap().push((line, body));

            let (status, payload) = routes
                .iter()
                .find(|(p, _, _)| *p == path)
                .map(|(_, s, b)| (*s, *b))
                .unwrap_or(("404 Not Found", r#"{"detail":"Not Found"}"#));
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                payload.len(),
                payload
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), seen)
}

async fn read_request(socket: &mut TcpStream) -> (String, String) {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);
        let Some(head_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&data[..head_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if data.len() >= head_end + 4 + content_length {
            let line = String::from_utf8_lossy(&data[..head_end])
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            let body = String::from_utf8_lossy(&data[head_end + 4..]).to_string();
            return (line, body);
        }
    }
    (String::new(), String::new())
}

fn state_for(base_url: String) -> AppState {
    AppState::new(AppConfig {
        api_base_url: base_url,
        send_credentials: false,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_contact_submission_roundtrip() {
    let (base, seen) = serve(vec![(
        "/api/v1/contact/submit",
        "200 OK",
        r#"{"message":"Thanks, we'll be in touch.","submission_id":1042}"#,
    )])
    .await;
    let state = state_for(base);

    let submission = ContactSubmission {
        email: "lena@example.com".into(),
        country: "Germany".into(),
        promotional_emails: true,
        linkedin_url: Some("https://www.linkedin.com/in/lena".into()),
        resume: Some(UploadFile::new("resume.pdf", b"%PDF-1.4 resume".to_vec())),
    };
    let receipt = state.contact().submit(&submission).await.unwrap();
    assert_eq!(receipt.submission_id, 1042);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].0.starts_with("POST /api/v1/contact/submit"));
    let body = &seen[0].1;
    for field in ["email", "country", "promotional_emails", "linkedin_profile", "resume"] {
        assert!(
            body.contains(&format!("name=\"{}\"", field)),
            "missing form field {}",
            field
        );
    }
    assert!(body.contains("lena@example.com"));
    assert!(body.contains("filename=\"resume.pdf\""));
}

#[tokio::test]
async fn test_invalid_contact_never_reaches_backend() {
    let (base, seen) = serve(vec![]).await;
    let state = state_for(base);

    let submission = ContactSubmission {
        email: "lena@example.com".into(),
        country: "  ".into(),
        promotional_emails: false,
        linkedin_url: None,
        resume: None,
    };
    let err = state.contact().submit(&submission).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_contact_backend_error_surfaces() {
    let (base, _) = serve(vec![(
        "/api/v1/contact/submit",
        "422 Unprocessable Entity",
        r#"{"detail":"Email already registered"}"#,
    )])
    .await;
    let state = state_for(base);

    let submission = ContactSubmission {
        email: "lena@example.com".into(),
        country: "Germany".into(),
        promotional_emails: false,
        linkedin_url: None,
        resume: None,
    };
    match state.contact().submit(&submission).await.unwrap_err() {
        AppError::Api(err) => {
            assert_eq!(err.status, Some(422));
            assert_eq!(err.message, "Email already registered");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_readiness_over_http() {
    let (base, _) = serve(vec![(
        "/api/v1/vectorstore/check-vectorstore",
        "200 OK",
        r#"{"exists":false}"#,
    )])
    .await;
    let state = state_for(base);
    assert!(!state.knowledge().check_readiness().await.unwrap());
}

#[tokio::test]
async fn test_questionnaire_over_http() {
    let (base, seen) = serve(vec![(
        "/api/v1/typeform/analyze/abc123",
        "200 OK",
        r#"{"success":true,"response_id":"abc123","analysis":{"automationRiskScore":12,"automationRiskInsight":"High.","strengths":[],"skillsToImprove":[],"recommendedCareerPaths":[]}}"#,
    )])
    .await;
    let state = state_for(base);

    let result = state.analysis().submit_response_id("abc123").await.unwrap();
    assert_eq!(result.display_score(), 10);
    assert!(seen.lock().unwrap()[0].0.starts_with("POST /api/v1/typeform/analyze/abc123"));
}
