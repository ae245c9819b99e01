use std::collections::BTreeMap;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_test::{assert_err, assert_ok};

use gita_guide::error::{Error, FALLBACK_MESSAGE};
use gita_guide::providers::{HttpTransport, Transport};
use gita_guide::request::compose;
use gita_guide::{GenerationConfig, GuidanceRequest, Persona, ProviderConfig};

/// One HTTP exchange as seen by the server
struct Captured
{   request_line: String
  , headers: BTreeMap<String, String>
  , body: serde_json::Value
}

fn find_header_end(buf: &[u8]) -> Option<usize>
{   buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

/// Accept a single connection, record the request and answer with
/// `status_line` / `reply`. Returns the endpoint URL and the capture.
async fn serve_once(
  status_line: &'static str
, content_type: &'static str
, reply: &'static str
) -> (String, JoinHandle<Captured>)
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = Vec::new();
      let mut chunk = [0u8; 4096];

      let header_end = loop
      {   let n = socket.read(&mut chunk).await.unwrap();
          assert!(n > 0, "client closed before sending headers");
          buf.extend_from_slice(&chunk[..n]);
          if let Some(end) = find_header_end(&buf)
          {   break end;
          }
      };

      let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
      let mut lines = head.split("\r\n");
      let request_line = lines.next().unwrap_or_default().to_string();
      let headers: BTreeMap<String, String> = lines
        .filter_map(|line| {
          let (name, value) = line.split_once(':')?;
          Some((name.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect();

      let length: usize = headers.get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
      while buf.len() < header_end + length
      {   let n = socket.read(&mut chunk).await.unwrap();
          assert!(n > 0, "client closed before sending body");
          buf.extend_from_slice(&chunk[..n]);
      }
      let body = serde_json::from_slice(&buf[header_end..header_end + length])
        .unwrap_or(serde_json::Value::Null);

      let response = format!(
        "{}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line, content_type, reply.len(), reply
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      let _ = socket.shutdown().await;

      Captured { request_line, headers, body }
    });

    (format!("http://{}/openai/v1/chat/completions", addr), handle)
}

fn transport() -> HttpTransport
{   // ignore any proxy settings of the machine running the tests
    HttpTransport::with_client(
      reqwest::Client::builder().no_proxy().build().unwrap()
    )
}

fn provider(url: &str) -> ProviderConfig
{   ProviderConfig::new(url, Some("k".to_string()))
      .with_header("X-Title", "t")
}

fn request(config: &ProviderConfig) -> GuidanceRequest
{   compose("I feel lost", &Persona::points(), &GenerationConfig::default(), config)
      .unwrap()
}

#[tokio::test]
async fn test_success_sends_headers_and_body()
{   let (url, server) = serve_once(
      "HTTP/1.1 200 OK"
    , "application/json"
    , r#"{"choices":[{"message":{"role":"assistant","content":"**Point One:** Breathe."}}],"usage":{"prompt_tokens":1,"completion_tokens":2,"total_tokens":3}}"#
    ).await;
    let config = provider(&url);

    let completion = assert_ok!(
      transport().send(&request(&config), &config).await
    );
    assert_eq!(completion.text, "**Point One:** Breathe.");
    assert_eq!(completion.usage.unwrap().total_tokens, Some(3));

    let captured = server.await.unwrap();
    assert!(captured.request_line.starts_with("POST /openai/v1/chat/completions "));
    assert_eq!(captured.headers["authorization"], "Bearer k");
    assert_eq!(captured.headers["content-type"], "application/json");
    assert_eq!(captured.headers["x-title"], "t");

    let body = captured.body;
    assert_eq!(body["model"], "llama-3.1-8b-instant");
    assert_eq!(body["max_tokens"], 400);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "I feel lost");
    assert!(body.get("top_p").is_none());
}

#[tokio::test]
async fn test_provider_error_maps_to_message()
{   let (url, server) = serve_once(
      "HTTP/1.1 401 Unauthorized"
    , "application/json"
    , r#"{"error":{"message":"invalid_api_key","type":"invalid_request_error"}}"#
    ).await;
    let config = provider(&url);

    let err = assert_err!(
      transport().send(&request(&config), &config).await
    );
    match &err
    {   Error::Transport(failure) => assert_eq!(failure.status, Some(401))
      , other => panic!("unexpected error: {:?}", other)
    }
    assert_eq!(err.user_message(), "invalid_api_key");
    server.await.unwrap();
}

#[tokio::test]
async fn test_plain_text_error_uses_fallback()
{   let (url, server) = serve_once(
      "HTTP/1.1 500 Internal Server Error"
    , "text/plain"
    , "upstream exploded"
    ).await;
    let config = provider(&url);

    let err = assert_err!(
      transport().send(&request(&config), &config).await
    );
    match &err
    {   Error::Transport(failure) => {
          assert_eq!(failure.status, Some(500));
          assert_eq!(failure.body.as_deref(), Some("upstream exploded"));
        }
      , other => panic!("unexpected error: {:?}", other)
    }
    assert_eq!(err.user_message(), FALLBACK_MESSAGE);
    server.await.unwrap();
}

#[tokio::test]
async fn test_success_without_choices_uses_fallback()
{   let (url, server) = serve_once(
      "HTTP/1.1 200 OK"
    , "application/json"
    , r#"{"choices":[]}"#
    ).await;
    let config = provider(&url);

    let err = assert_err!(
      transport().send(&request(&config), &config).await
    );
    assert_eq!(err, Error::NoChoicesInResponse);
    assert_eq!(err.user_message(), FALLBACK_MESSAGE);
    server.await.unwrap();
}

#[tokio::test]
async fn test_connection_refused_is_network_failure()
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = provider(&format!("http://{}/v1/chat/completions", addr));
    let err = assert_err!(
      transport().send(&request(&config), &config).await
    );
    match &err
    {   Error::Transport(failure) => {
          assert_eq!(failure.status, None);
          assert_eq!(failure.body, None);
        }
      , other => panic!("unexpected error: {:?}", other)
    }
    assert_eq!(err.user_message(), FALLBACK_MESSAGE);
}
