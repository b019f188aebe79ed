mod support;

use std::net::SocketAddr;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;

use support::{build_app, entry_json};

struct TestServer {
    base_url: String,
}

/// Serve the in-memory app on an ephemeral port.
async fn start_server() -> anyhow::Result<TestServer> {
    let app = build_app(false).router;
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });
    Ok(TestServer { base_url: format!("http://{}:{}", addr.ip(), addr.port()) })
}

#[tokio::test]
async fn browser_style_session_uses_cookie() -> anyhow::Result<()> {
    let srv = start_server().await?;
    let client = reqwest::Client::builder().cookie_store(true).build()?;

    let resp = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({"username": "browser", "email": "browser@example.com", "password": "S3curePass!"}))
        .send()
        .await?;
    assert_eq!(resp.status(), HttpStatusCode::CREATED);

    let resp = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({"email": "browser@example.com", "password": "S3curePass!"}))
        .send()
        .await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);

    // no Authorization header from here on; the cookie jar carries the token
    let resp = client.post(format!("{}/api/entry", srv.base_url)).json(&entry_json("Cookie Customer")).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::CREATED);

    let list: serde_json::Value = client.get(format!("{}/api/fetch-entry", srv.base_url)).send().await?.json().await?;
    assert_eq!(list[0]["customerName"], "Cookie Customer");
    assert_eq!(list[0]["owner"]["username"], "browser");

    let resp = client.post(format!("{}/auth/logout", srv.base_url)).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::NO_CONTENT);
    let resp = client.get(format!("{}/api/fetch-entry", srv.base_url)).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> anyhow::Result<()> {
    let srv = start_server().await?;
    let doc: serde_json::Value = reqwest::get(format!("{}/api-docs/openapi.json", srv.base_url)).await?.json().await?;
    assert!(doc["paths"].get("/api/export").is_some());
    Ok(())
}

#[tokio::test]
async fn run_serves_given_config_until_shutdown() -> anyhow::Result<()> {
    let Ok(url) = std::env::var("DATABASE_URL") else { return Ok(()) };
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }

    let port = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?.local_addr()?.port();
    let mut cfg = configs::AppConfig::from_env();
    cfg.server.port = port;
    cfg.database.url = url;
    cfg.auth.jwt_secret = support::SECRET.into();
    cfg.normalize_and_validate()?;

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server::run(cfg, async move {
        let _ = stop_rx.await;
    }));

    let health = format!("http://127.0.0.1:{port}/health");
    let mut up = false;
    for _ in 0..100 {
        if let Ok(resp) = reqwest::get(&health).await {
            if resp.status() == HttpStatusCode::OK {
                up = true;
                break;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    assert!(up, "server never answered /health");

    let _ = stop_tx.send(());
    handle.await??;
    Ok(())
}
