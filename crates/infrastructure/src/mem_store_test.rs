use serde_json::json;

use dicesched_core::traits::{KvStore, WatchEventKind};

use crate::mem_store::MemStore;

#[tokio::test]
async fn test_get_put_remove() {
    let store = MemStore::new();
    assert!(store.get("/a").await.unwrap().is_none());

    store.put("/a", json!({"x": 1})).await.unwrap();
    assert_eq!(store.get("/a").await.unwrap(), Some(json!({"x": 1})));

    let removed = store.remove("/a").await.unwrap();
    assert_eq!(removed, Some(json!({"x": 1})));
    assert!(store.get("/a").await.unwrap().is_none());
    assert!(store.remove("/a").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_prefix_is_scoped_and_ordered() {
    let store = MemStore::new();
    store.put("/dice/service/ns/b", json!(2)).await.unwrap();
    store.put("/dice/service/ns/a", json!(1)).await.unwrap();
    store.put("/dice/job/ns/c", json!(3)).await.unwrap();

    let entries = store.list_prefix("/dice/service/").await.unwrap();
    let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["/dice/service/ns/a", "/dice/service/ns/b"]);
}

#[tokio::test]
async fn test_watch_distinguishes_add_update_delete() {
    let store = MemStore::new();
    let mut rx = store.watch_prefix("/cfg/").await.unwrap();

    store.put("/cfg/one", json!("v1")).await.unwrap();
    store.put("/cfg/one", json!("v2")).await.unwrap();
    store.put("/other/ignored", json!("x")).await.unwrap();
    store.remove("/cfg/one").await.unwrap();

    let ev = rx.recv().await.unwrap();
    assert_eq!(ev.kind, WatchEventKind::Put { created: true });
    assert_eq!(ev.key, "/cfg/one");

    let ev = rx.recv().await.unwrap();
    assert_eq!(ev.kind, WatchEventKind::Put { created: false });
    assert_eq!(ev.value, Some(json!("v2")));

    let ev = rx.recv().await.unwrap();
    assert_eq!(ev.kind, WatchEventKind::Delete);
    assert_eq!(ev.key, "/cfg/one");
}
