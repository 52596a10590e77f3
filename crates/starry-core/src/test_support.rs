//! In-process fake backend for tests.

use axum::Router;
use reqwest::Url;

/// Serve `router` on an ephemeral local port and return its base URL
pub(crate) async fn spawn_backend(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    Url::parse(&format!("http://{}/", addr)).expect("test url")
}
