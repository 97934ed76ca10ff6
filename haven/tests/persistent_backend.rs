mod common;

use common::{MockNetwork, origin, url};
use haven::{
    AgentConfig, AgentState, CacheAgent, Opaque, PopulationReport, Purpose, RequestDescriptor,
    Response,
};
use haven_backend::Backend;
use haven_core::CacheKey;
use haven_feoxdb::FeOxDbBackend;
use pretty_assertions::assert_eq;
use smol_str::SmolStr;
use url::Url;

fn agent(backend: FeOxDbBackend, network: &MockNetwork) -> CacheAgent {
    CacheAgent::builder()
        .config(AgentConfig::new(origin()))
        .backend(backend)
        .network(network.clone())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_full_lifecycle_on_feoxdb() {
    common::init_tracing();
    let network = MockNetwork::new();
    network.serve_app_shell();
    let backend = FeOxDbBackend::in_memory().unwrap();
    backend
        .write(
            "static-assets-v0",
            &CacheKey::get(&url("/old.js")),
            "stale".into(),
        )
        .await
        .unwrap();
    let agent = agent(backend.clone(), &network);

    assert_eq!(agent.install().await.unwrap().precached, 6);
    let activated = agent.activate().await.unwrap();
    assert_eq!(activated.sweep.deleted, vec![SmolStr::new("static-assets-v0")]);
    assert_eq!(agent.state(), AgentState::Activated);
    assert_eq!(
        backend.namespaces().await.unwrap(),
        vec![SmolStr::new("static-assets-v1")]
    );

    network.set_offline(true);
    let served = agent
        .fetch(&RequestDescriptor::navigate(url("/MagicTraining/index.html")))
        .await
        .unwrap();
    assert!(served.is_cached());
}

#[tokio::test]
async fn test_population_on_feoxdb_stores_only_successful_videos() {
    let network = MockNetwork::new();
    let videos: Vec<Url> = (0..5)
        .map(|i| Url::parse(&format!("https://drive.google.com/file/d/v{i}/preview")).unwrap())
        .collect();
    for video in &videos {
        network.route(video, Response::Opaque(Opaque::new("video")));
    }
    network.fail(&videos[0]).fail(&videos[4]);
    let backend = FeOxDbBackend::in_memory().unwrap();
    let agent = agent(backend.clone(), &network);

    let report = agent
        .dispatch(haven::Message::CacheVideos {
            videos: videos.iter().map(Url::to_string).collect(),
        })
        .await;

    assert_eq!(report, PopulationReport { stored: 3, failed: 2 });
    let media = agent.storage().store(Purpose::Media);
    assert_eq!(media.len().await.unwrap(), 3);
    assert_eq!(backend.keys("media-v1").await.unwrap().len(), 3);
    let cached = media.match_url(&videos[2]).await.unwrap().unwrap();
    assert!(cached.response().is_opaque());
}
