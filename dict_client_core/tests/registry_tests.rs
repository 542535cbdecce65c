//! Shared sessions through the registry

use dict_client_core::{SessionConfig, SessionRegistry};
use dict_test_utils::{ReplyBuilder, Script, ScriptedConnector};
use std::sync::Arc;

fn database_listing() -> Vec<String> {
    ReplyBuilder::new()
        .status(110, "1 databases present")
        .text(["wn \"WordNet (r) 3.0 (2006)\""])
        .ok()
        .build()
}

#[tokio::test]
async fn test_same_key_shares_one_connection() {
    let connector = ScriptedConnector::new([Script::new()
        .reply("SHOW DB", database_listing())
        .reply("SHOW DB", database_listing())]);
    let registry = SessionRegistry::with_connector(connector.clone());
    let config = SessionConfig::new("dict.test", 2628);
    let key = SessionRegistry::<ScriptedConnector>::key_for(&config);

    let first = registry.get_or_create(&key, || config.clone()).await;
    let second = registry.get_or_create(&key, || config.clone()).await;
    assert!(Arc::ptr_eq(&first, &second));

    first.lock().await.list_databases().await.unwrap();
    second.lock().await.list_databases().await.unwrap();

    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.log().count("SHOW DB"), 2);
}

#[tokio::test]
async fn test_concurrent_callers_are_serialized() {
    let reply = ReplyBuilder::new()
        .status(152, "1 matches found")
        .text(["wn \"cat\""])
        .ok()
        .build();
    let connector = ScriptedConnector::new([Script::new()
        .reply("MATCH", reply.clone())
        .reply("MATCH", reply)]);
    let registry = Arc::new(SessionRegistry::with_connector(connector.clone()));

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            let session = registry
                .get_or_create("dict.test:2628", SessionConfig::default)
                .await;
            let mut session = session.lock().await;
            session.matches("wn", Some("exact"), "cat").await
        }));
    }

    for task in tasks {
        let matches = task.await.unwrap().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].word, "cat");
    }
    assert_eq!(connector.connects(), 1);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_remove_closes_session() {
    let connector = ScriptedConnector::new([Script::new()]);
    let registry = SessionRegistry::with_connector(connector.clone());

    let session = registry
        .get_or_create("dict.test:2628", SessionConfig::default)
        .await;
    session.lock().await.connect().await.unwrap();

    assert!(registry.remove("dict.test:2628").await.unwrap());
    assert!(!session.lock().await.is_connected());
    assert_eq!(connector.log().count("QUIT"), 1);
}

#[tokio::test]
async fn test_close_all() {
    let connector = ScriptedConnector::new([Script::new(), Script::new()]);
    let registry = SessionRegistry::with_connector(connector.clone());

    for key in ["a:2628", "b:2628"] {
        let session = registry.get_or_create(key, SessionConfig::default).await;
        session.lock().await.connect().await.unwrap();
    }

    registry.close_all().await.unwrap();

    assert!(registry.is_empty().await);
    assert_eq!(connector.log().count("QUIT"), 2);
}
