use axum::Router;
use jh_core::ProviderConfig;
use tokio::net::TcpListener;

pub(crate) async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub(crate) fn local_config(base: &str) -> ProviderConfig {
    ProviderConfig::default()
        .with_base_url(base)
        .with_gnews_key("test-gnews-key")
        .with_places_key("test-places-key")
}
