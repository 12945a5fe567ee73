//! Error mapping verification for the API client against a real local
//! HTTP server. A revoked session must surface as an authentication error
//! from every endpoint, including the empty-body DELETE ones.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use uuid::Uuid;

use agropec_companion_lib::error::AppError;
use agropec_companion_lib::services::api_client::{AgroPecClient, ApiClientConfig};

/// Serve a fixed HTTP response to every connection; returns the port.
async fn spawn_http_server(status: &'static str, body: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                // Drain the request headers before answering
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            });
        }
    });

    port
}

fn client_for(port: u16) -> AgroPecClient {
    AgroPecClient::new(ApiClientConfig {
        base_url: format!("http://127.0.0.1:{}", port),
        token: Some("revoked-token".to_string()),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_revoked_token_maps_to_authentication_on_deletes() {
    let port = spawn_http_server("401 Unauthorized", "{}").await;
    let client = client_for(port);

    let one = client
        .delete_notification("user-1", Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(
        matches!(one, AppError::Authentication { .. }),
        "delete-one mapped to {:?}",
        one
    );

    let all = client.delete_all_notifications("user-1").await.unwrap_err();
    assert!(
        matches!(all, AppError::Authentication { .. }),
        "delete-all mapped to {:?}",
        all
    );
}

#[tokio::test]
async fn test_revoked_token_maps_to_authentication_on_fetches() {
    let port = spawn_http_server("401 Unauthorized", "{}").await;
    let client = client_for(port);

    let err = client.get_user_notifications("user-1").await.unwrap_err();
    assert!(matches!(err, AppError::Authentication { .. }));
}
