//! Router behaviour when the directory store fails.

use super::support::{EchoRelay, FlakyStore, RecordingController};
use crate::capability::domain::{
    CapabilityDescriptor, DirectoryInsertion, PageInstanceId, ToolDescriptor,
};
use crate::config::BridgeConfig;
use crate::protocol::{ChatMessage, SamplingRequest};
use crate::router::{
    ports::{ControllerLink, DirectoryStore, RelayLink},
    services::{Router, RouterError},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::time::Duration;

type FlakyRouter = Router<FlakyStore, DefaultClock>;

struct Harness {
    store: Arc<FlakyStore>,
    controller: Arc<RecordingController>,
}

impl Harness {
    fn router(&self) -> FlakyRouter {
        Router::new(
            Arc::clone(&self.store),
            Arc::new(EchoRelay::default()) as Arc<dyn RelayLink>,
            Arc::clone(&self.controller) as Arc<dyn ControllerLink>,
            &BridgeConfig::default(),
            Arc::new(DefaultClock),
        )
    }
}

#[fixture]
fn harness() -> Harness {
    Harness {
        store: Arc::new(FlakyStore::default()),
        controller: Arc::new(RecordingController::answering_after(Duration::from_secs(20))),
    }
}

fn tool(name: &str) -> CapabilityDescriptor {
    ToolDescriptor::new(name, "").expect("valid tool").into()
}

fn page_42() -> PageInstanceId {
    PageInstanceId::from(42)
}

fn tool_names(tools: &[ToolDescriptor]) -> Vec<&str> {
    tools.iter().map(ToolDescriptor::name).collect()
}

#[rstest]
#[tokio::test]
async fn failed_save_leaves_cache_unchanged(harness: Harness) {
    let router = harness.router();
    harness.store.fail_saves(true);

    let failed = router.announce(&page_42(), tool("a")).await;

    assert!(matches!(failed, Err(RouterError::Store(_))));
    assert!(router.tools_for(&page_42()).await.expect("tools").is_empty());
    assert!(harness.controller.updates().is_empty());
}

#[rstest]
#[tokio::test]
async fn announcement_is_retried_after_store_recovers(harness: Harness) {
    let router = harness.router();
    harness.store.fail_saves(true);
    router
        .announce(&page_42(), tool("a"))
        .await
        .expect_err("save fails");
    harness.store.fail_saves(false);

    let retried = router.announce(&page_42(), tool("a")).await.expect("announce");

    assert_eq!(retried, DirectoryInsertion::Added);
    let restarted = harness.router();
    let tools = restarted.tools_for(&page_42()).await.expect("tools");
    assert_eq!(tool_names(&tools), vec!["a"]);
}

#[rstest]
#[tokio::test]
async fn failed_save_keeps_earlier_entries(harness: Harness) {
    let router = harness.router();
    router.announce(&page_42(), tool("a")).await.expect("announce");
    harness.store.fail_saves(true);

    router
        .announce(&page_42(), tool("b"))
        .await
        .expect_err("save fails");

    let live = router.tools_for(&page_42()).await.expect("tools");
    let persisted = harness
        .store
        .inner
        .load(&page_42())
        .await
        .expect("load")
        .expect("page stored");
    assert_eq!(tool_names(&live), vec!["a"]);
    assert_eq!(tool_names(persisted.tools()), vec!["a"]);
}

#[rstest]
#[tokio::test]
async fn failed_delete_keeps_cache_and_store_in_agreement(harness: Harness) {
    let router = harness.router();
    router.announce(&page_42(), tool("a")).await.expect("announce");
    harness.store.fail_removes(true);

    let failed = router.close_page(&page_42()).await;

    assert!(matches!(failed, Err(RouterError::Store(_))));
    let live = router.tools_for(&page_42()).await.expect("tools");
    let cold = harness.router().tools_for(&page_42()).await.expect("tools");
    assert_eq!(live, cold);

    harness.store.fail_removes(false);
    assert!(router.close_page(&page_42()).await.expect("close"));
    assert!(router.tools_for(&page_42()).await.expect("tools").is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_delete_still_retires_pending_sampling(harness: Harness) {
    let router = harness.router();
    let waiting_router = router.clone();
    let waiting = tokio::spawn(async move {
        waiting_router
            .forward_sampling(&page_42(), SamplingRequest::new(vec![ChatMessage::user("hi")]))
            .await
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.store.fail_removes(true);

    router
        .close_page(&page_42())
        .await
        .expect_err("delete fails");

    let outcome = waiting
        .await
        .expect("task finished")
        .expect("sampling registered");
    assert!(
        outcome
            .error_message()
            .is_some_and(|message| message.starts_with("Channel unavailable"))
    );
}
