use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use worklog_core::api::{ApiRequest, HttpTransport, Transport, into_data};
use worklog_core::config::Config;
use worklog_core::error::ApiError;
use worklog_core::fetch::FetchStatus;

/// Serves one canned response and hands back the raw request head.
async fn serve_once(status_line: &'static str, body: &'static str) -> (Config, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut raw = Vec::new();
        let mut buf = [0_u8; 1024];
        while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
        }
        let head_len = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .map_or(raw.len(), |at| at + 4);
        let head = String::from_utf8_lossy(&raw[..head_len]).into_owned();
        let body_len = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while raw.len() < head_len + body_len {
            let n = socket.read(&mut buf).await.expect("read body");
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.shutdown().await.ok();
        head
    });

    let config = Config {
        base_url: format!("http://{addr}/api"),
        ..Config::default()
    };
    (config, server)
}

#[tokio::test]
async fn list_request_carries_the_query() {
    let (config, server) = serve_once("200 OK", r#"{"error":false,"data":[]}"#).await;
    let transport = HttpTransport::new(&config).expect("client");

    let request = ApiRequest::get(
        "/work-logs",
        vec![("search", "design".to_string()), ("sort", "date".to_string())],
    );
    let envelope = transport.execute(request).await.expect("served");
    assert_eq!(into_data(envelope).expect("not flagged"), Some(json!([])));

    let head = server.await.expect("server task");
    assert!(
        head.starts_with("GET /api/work-logs?search=design&sort=date HTTP/1.1"),
        "{head}"
    );
}

#[tokio::test]
async fn validation_failures_keep_the_error_body() {
    let (config, server) = serve_once(
        "422 Unprocessable Entity",
        r#"{"message":"invalid","errors":{"hourly_rate":["The hourly rate must be at least 0."]}}"#,
    )
    .await;
    let transport = HttpTransport::new(&config).expect("client");

    let err = transport
        .execute(ApiRequest::post("/work-logs", json!({"task_description": ""})))
        .await
        .expect_err("rejected");
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.user_message(), "The hourly rate must be at least 0.");

    let head = server.await.expect("server task");
    assert!(head.starts_with("POST /api/work-logs HTTP/1.1"), "{head}");
}

#[tokio::test]
async fn non_json_success_is_a_schema_error() {
    let (config, server) = serve_once("200 OK", "<html></html>").await;
    let transport = HttpTransport::new(&config).expect("client");

    let err = transport
        .execute(ApiRequest::get("/work-logs", Vec::new()))
        .await
        .expect_err("not json");
    assert!(matches!(err, ApiError::Schema(_)), "{err:?}");
    server.await.expect("server task");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let config = Config {
        base_url: format!("http://{addr}/api"),
        ..Config::default()
    };
    let transport = HttpTransport::new(&config).expect("client");
    let err = transport
        .execute(ApiRequest::delete("/work-logs/1"))
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn client_mounts_a_live_work_log_list() {
    let (config, server) = serve_once(
        "200 OK",
        r#"{"data":[{"id":9,"task_description":"Audit","date":"2024-03-10","hourly_rate":"50000.00","additional_charges":"0.00","total_remuneration":"100000.00","contributors":[{"employee_name":"Ana","hours_spent":"2"}]}]}"#,
    )
    .await;
    let client = worklog_core::Client::new(config).expect("client");
    let list = client.work_logs();

    let mut rx = list.subscribe();
    let state = rx
        .wait_for(|state| state.status != FetchStatus::Loading && state.status != FetchStatus::Idle)
        .await
        .expect("controller alive")
        .clone();
    assert_eq!(state.status, FetchStatus::Success);
    assert_eq!(state.items[0].total_hours(), 2.0);

    let head = server.await.expect("server task");
    assert!(head.starts_with("GET /api/work-logs?search=&sort=date&order=asc "), "{head}");
}
