//! Integration tests for the apply driver and its state file

mod common;

use common::*;
use tempfile::TempDir;
use yc_resource_provider::apply::{self, Action, DeclaredResource, DesiredSpec, Manifest};
use yc_resource_provider::resources::KafkaClusterSpec;
use yc_resource_provider::state::{StateStore, StoredResource};

fn manifest(cluster: KafkaClusterSpec) -> Manifest {
    Manifest {
        resources: vec![
            DeclaredResource {
                name: "ingress".to_string(),
                spec: DesiredSpec::VpcAddress(address_spec("ingress")),
            },
            DeclaredResource {
                name: "events".to_string(),
                spec: DesiredSpec::KafkaCluster(cluster),
            },
        ],
    }
}

fn events() -> KafkaClusterSpec {
    let mut spec = cluster_spec("events");
    spec.topics = vec![topic("orders", 3)];
    spec
}

fn stored_cluster_id(store: &StateStore) -> String {
    store.state.resources["kafka_cluster.events"].id().to_string()
}

#[tokio::test]
async fn first_apply_creates_and_second_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state/provider.json");
    let cloud = FakeCloud::new();
    let ctx = context(&cloud);

    let mut store = StateStore::open(&path).unwrap();
    let report = apply::apply(&ctx, &manifest(events()), &mut store).await.unwrap();
    assert_eq!(report.action("vpc_address.ingress"), Some(Action::Created));
    assert_eq!(report.action("kafka_cluster.events"), Some(Action::Created));

    let mut reopened = StateStore::open(&path).unwrap();
    assert_eq!(reopened.state, store.state);

    cloud.clear_calls();
    let report = apply::apply(&ctx, &manifest(events()), &mut reopened).await.unwrap();
    assert_eq!(report.summary().get("unchanged"), Some(&2));
    assert!(cloud.mutations().is_empty());
}

#[tokio::test]
async fn changed_topics_are_updated_in_place() {
    let dir = TempDir::new().unwrap();
    let cloud = FakeCloud::new();
    let ctx = context(&cloud);
    let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
    apply::apply(&ctx, &manifest(events()), &mut store).await.unwrap();
    cloud.clear_calls();

    let mut desired = events();
    desired.topics.push(topic("payments", 1));
    let report = apply::apply(&ctx, &manifest(desired), &mut store).await.unwrap();

    assert_eq!(report.action("kafka_cluster.events"), Some(Action::Updated));
    assert_eq!(cloud.mutations(), vec!["create_topic:payments"]);
}

#[tokio::test]
async fn force_new_change_replaces_the_cluster() {
    let dir = TempDir::new().unwrap();
    let cloud = FakeCloud::new();
    let ctx = context(&cloud);
    let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
    apply::apply(&ctx, &manifest(events()), &mut store).await.unwrap();
    let old_id = stored_cluster_id(&store);
    cloud.clear_calls();

    let mut desired = events();
    desired.config.assign_public_ip = true;
    let report = apply::apply(&ctx, &manifest(desired), &mut store).await.unwrap();

    assert_eq!(report.action("kafka_cluster.events"), Some(Action::Replaced));
    assert_eq!(cloud.mutations(), vec!["delete_cluster", "create_cluster"]);
    assert_ne!(stored_cluster_id(&store), old_id);
    assert!(cloud.cluster(&old_id).is_none());
}

#[tokio::test]
async fn failed_creation_is_tainted_then_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    let cloud = FakeCloud::new();
    let ctx = context(&cloud);
    cloud.fail("create_cluster");

    let mut store = StateStore::open(&path).unwrap();
    let err = apply::apply(&ctx, &manifest(events()), &mut store)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("creating kafka_cluster.events"));

    let store_on_disk = StateStore::open(&path).unwrap();
    let tainted = &store_on_disk.state.resources["kafka_cluster.events"];
    assert!(tainted.is_tainted());
    let tainted_id = tainted.id().to_string();

    cloud.recover("create_cluster");
    cloud.clear_calls();
    let report = apply::apply(&ctx, &manifest(events()), &mut store).await.unwrap();

    assert_eq!(report.action("kafka_cluster.events"), Some(Action::Replaced));
    assert_eq!(cloud.mutations(), vec!["delete_cluster", "create_cluster"]);
    assert!(cloud.cluster(&tainted_id).is_none());
    assert!(!store.state.resources["kafka_cluster.events"].is_tainted());
}

#[tokio::test]
async fn cluster_removed_remotely_is_recreated() {
    let dir = TempDir::new().unwrap();
    let cloud = FakeCloud::new();
    let ctx = context(&cloud);
    let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
    apply::apply(&ctx, &manifest(events()), &mut store).await.unwrap();

    cloud.drop_cluster(&stored_cluster_id(&store));
    cloud.clear_calls();
    let report = apply::apply(&ctx, &manifest(events()), &mut store).await.unwrap();

    assert_eq!(report.action("kafka_cluster.events"), Some(Action::Created));
    assert_eq!(cloud.mutations(), vec!["create_cluster"]);
}

#[tokio::test]
async fn undeclared_resources_are_deleted() {
    let dir = TempDir::new().unwrap();
    let cloud = FakeCloud::new();
    let ctx = context(&cloud);
    let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
    apply::apply(&ctx, &manifest(events()), &mut store).await.unwrap();
    cloud.clear_calls();

    let mut only_address = manifest(events());
    only_address.resources.truncate(1);
    let report = apply::apply(&ctx, &only_address, &mut store).await.unwrap();

    assert_eq!(report.action("kafka_cluster.events"), Some(Action::Deleted));
    assert_eq!(cloud.mutations(), vec!["delete_cluster"]);
    assert!(!store.state.resources.contains_key("kafka_cluster.events"));
}

#[tokio::test]
async fn refresh_drops_resources_gone_remotely() {
    let dir = TempDir::new().unwrap();
    let cloud = FakeCloud::new();
    let ctx = context(&cloud);
    let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
    apply::apply(&ctx, &manifest(events()), &mut store).await.unwrap();

    let address_id = store.state.resources["vpc_address.ingress"].id().to_string();
    cloud.drop_address(&address_id);
    let report = apply::refresh(&ctx, &mut store).await.unwrap();

    assert_eq!(report.action("vpc_address.ingress"), Some(Action::Removed));
    assert_eq!(report.action("kafka_cluster.events"), Some(Action::Refreshed));
    assert!(matches!(
        store.state.resources.get("kafka_cluster.events"),
        Some(StoredResource::KafkaCluster(_))
    ));
    assert_eq!(store.state.resources.len(), 1);
}

#[tokio::test]
async fn destroy_deletes_everything() {
    let dir = TempDir::new().unwrap();
    let cloud = FakeCloud::new();
    let ctx = context(&cloud);
    let mut store = StateStore::open(dir.path().join("state.json")).unwrap();
    apply::apply(&ctx, &manifest(events()), &mut store).await.unwrap();
    cloud.clear_calls();

    let report = apply::destroy(&ctx, &mut store).await.unwrap();

    assert_eq!(report.summary().get("deleted"), Some(&2));
    assert_eq!(cloud.mutations(), vec!["delete_address", "delete_cluster"]);
    assert!(store.state.resources.is_empty());
}
