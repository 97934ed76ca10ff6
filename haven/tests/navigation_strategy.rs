mod common;

use common::{MockNetwork, agent, agent_with, html, origin, url};
use haven::{
    AgentConfig, HavenError, NavigationFallback, Purpose, RequestDescriptor, ResponseSource,
};
use haven_moka::MokaBackend;
use http::StatusCode;

fn body(served: &haven::Served) -> String {
    let payload = served.response.as_readable().unwrap();
    String::from_utf8(payload.body().to_vec()).unwrap()
}

#[tokio::test]
async fn test_network_response_is_returned_and_written_back() {
    common::init_tracing();
    let network = MockNetwork::new();
    let page = url("/MagicTraining/lesson/3");
    network.route(&page, html("<h1>lesson 3</h1>"));
    let agent = agent(MokaBackend::builder().build(), &network);

    let served = agent
        .fetch(&RequestDescriptor::navigate(page.clone()))
        .await
        .unwrap();
    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(body(&served), "<h1>lesson 3</h1>");

    agent.offload().wait_all().await;
    let entry = agent
        .storage()
        .store(Purpose::StaticAssets)
        .match_url(&page)
        .await
        .unwrap()
        .expect("navigation response should be written back");
    assert_eq!(entry.response(), &served.response);
}

#[tokio::test]
async fn test_fresh_response_replaces_cached_copy() {
    let network = MockNetwork::new();
    let page = url("/MagicTraining/");
    network.route(&page, html("v1"));
    let agent = agent(MokaBackend::builder().build(), &network);
    let request = RequestDescriptor::navigate(page.clone());

    agent.fetch(&request).await.unwrap();
    agent.offload().wait_all().await;
    network.route(&page, html("v2"));
    let served = agent.fetch(&request).await.unwrap();
    agent.offload().wait_all().await;

    assert_eq!(body(&served), "v2");
    network.set_offline(true);
    let offline = agent.fetch(&request).await.unwrap();
    assert_eq!(body(&offline), "v2");
    assert!(offline.is_cached());
}

#[tokio::test]
async fn test_error_status_is_still_network_first() {
    let network = MockNetwork::new();
    let agent = agent(MokaBackend::builder().build(), &network);

    let served = agent
        .fetch(&RequestDescriptor::navigate(url("/MagicTraining/nope")))
        .await
        .unwrap();

    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(served.response.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn test_offline_serves_cached_page() {
    let network = MockNetwork::new();
    network.serve_app_shell();
    let agent = agent(MokaBackend::builder().build(), &network);
    agent.install().await.unwrap();
    network.set_offline(true);

    let served = agent
        .fetch(&RequestDescriptor::navigate(url("/MagicTraining/index.html")))
        .await
        .unwrap();

    assert_eq!(served.source, ResponseSource::Cache("static-assets-v1".into()));
    assert_eq!(body(&served), "shell /MagicTraining/index.html");
}

#[tokio::test]
async fn test_offline_unknown_page_falls_back_to_root_document() {
    let network = MockNetwork::new();
    network.serve_app_shell();
    let agent = agent(MokaBackend::builder().build(), &network);
    agent.install().await.unwrap();
    network.set_offline(true);

    let served = agent
        .fetch(&RequestDescriptor::navigate(url("/MagicTraining/lesson/9")))
        .await
        .unwrap();

    assert!(served.is_cached());
    assert_eq!(body(&served), "shell /MagicTraining/");
}

#[tokio::test]
async fn test_offline_without_cache_fails_by_default() {
    let network = MockNetwork::new();
    network.set_offline(true);
    let agent = agent(MokaBackend::builder().build(), &network);
    let page = url("/MagicTraining/");

    let result = agent.fetch(&RequestDescriptor::navigate(page.clone())).await;

    match result {
        Err(HavenError::NavigationUnavailable { url }) => assert_eq!(url, page),
        other => panic!("expected NavigationUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_offline_without_cache_can_serve_offline_page() {
    let network = MockNetwork::new();
    network.set_offline(true);
    let config = AgentConfig::builder(origin())
        .navigation_fallback(NavigationFallback::OfflinePage)
        .build();
    let agent = agent_with(config, MokaBackend::builder().build(), &network);

    let served = agent
        .fetch(&RequestDescriptor::navigate(url("/MagicTraining/")))
        .await
        .unwrap();

    assert_eq!(served.source, ResponseSource::Fallback);
    assert_eq!(served.response.status(), Some(StatusCode::OK));
    assert!(body(&served).contains("Video temporarily unavailable"));
}
