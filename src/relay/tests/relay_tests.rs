//! Relay forwarding, correlation, and teardown.

use crate::capability::domain::{CallId, CallOutcome, PageInstanceId, ToolDescriptor};
use crate::config::BridgeConfig;
use crate::protocol::{
    BridgeMessage, ChatMessage, Envelope, PageDirective, PageEventBus, SamplingRequest,
    SamplingResponse,
};
use crate::registry::{
    adapters::tool_fn, domain::ToolDefinition, ports::ModelContext, services::CapabilityRegistry,
};
use crate::relay::Relay;
use crate::router::ports::{LinkError, LinkResult, RelayLink, RouterLink};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Map, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Router stand-in that records every message and answers sampling with a
/// canned model reply.
#[derive(Default)]
struct RecordingRouter {
    received: Mutex<Vec<(BridgeMessage, Option<PageInstanceId>)>>,
}

impl RecordingRouter {
    fn received(&self) -> Vec<(BridgeMessage, Option<PageInstanceId>)> {
        self.received.lock().expect("lock").clone()
    }
}

#[async_trait]
impl RouterLink for RecordingRouter {
    async fn send(
        &self,
        envelope: Envelope<BridgeMessage>,
        origin: Option<&PageInstanceId>,
    ) -> LinkResult<Envelope<BridgeMessage>> {
        let message = envelope.open(1)?;
        self.received
            .lock()
            .expect("lock")
            .push((message.clone(), origin.cloned()));
        let reply = match message {
            BridgeMessage::SamplingRequest { request } => {
                let answer = SamplingResponse::text("It sells widgets", None);
                BridgeMessage::SamplingResponse {
                    request_id: request.request_id,
                    outcome: CallOutcome::success(
                        serde_json::to_value(answer).map_err(|err| LinkError::Rejected(err.to_string()))?,
                    ),
                }
            }
            _ => BridgeMessage::Ack,
        };
        Ok(Envelope::new(reply))
    }
}

struct Page {
    registry: CapabilityRegistry<DefaultClock>,
    relay: Relay<DefaultClock>,
    router: Arc<RecordingRouter>,
}

#[fixture]
fn page() -> Page {
    let config = BridgeConfig::default();
    let bus = PageEventBus::new(64);
    let router = Arc::new(RecordingRouter::default());
    let registry = CapabilityRegistry::new(bus.clone(), &config, Arc::new(DefaultClock));
    let relay = Relay::new(
        PageInstanceId::from(42),
        bus,
        Arc::clone(&router) as Arc<dyn RouterLink>,
        &config,
        Arc::new(DefaultClock),
    );
    Page {
        registry,
        relay,
        router,
    }
}

fn sleeping_tool(name: &str, delay: Duration) -> ToolDefinition {
    let descriptor = ToolDescriptor::new(name, "Sleeps then answers").expect("valid tool");
    ToolDefinition::new(
        descriptor,
        tool_fn(move |_| async move {
            tokio::time::sleep(delay).await;
            Ok(json!("done"))
        }),
    )
}

fn execute(tool_name: &str, call_id: &str) -> PageDirective {
    PageDirective::ExecuteOnPage {
        tool_name: tool_name.to_owned(),
        args: Map::new(),
        call_id: CallId::new(call_id).expect("valid call id"),
    }
}

#[rstest]
#[tokio::test]
async fn discovery_is_forwarded_with_page_origin(page: Page) {
    page.relay.start();

    page.registry
        .register_tool(sleeping_tool("get_widget", Duration::ZERO))
        .expect("registration should succeed");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let received = page.router.received();
    let (message, origin) = received.first().expect("announcement forwarded");
    assert_eq!(message.type_name(), "NEW_TOOL_AVAILABLE");
    assert_eq!(origin.as_ref(), Some(&PageInstanceId::from(42)));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn short_handler_resolves_once(page: Page) {
    page.registry
        .register_tool(sleeping_tool("quick", Duration::from_millis(200)))
        .expect("registration should succeed");
    let listener = page.registry.attach();
    page.relay.start();

    let outcome = page.relay.run_directive(execute("quick", "c-200")).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.result(), &json!("done"));
    assert_eq!(page.relay.pending_calls(), 0);
    listener.abort();
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_handler_times_out_and_late_result_is_dropped(page: Page) {
    page.registry
        .register_tool(sleeping_tool("slow", Duration::from_secs(15)))
        .expect("registration should succeed");
    let listener = page.registry.attach();
    page.relay.start();
    let started = tokio::time::Instant::now();

    let outcome = page.relay.run_directive(execute("slow", "c-15s")).await;

    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(11));
    assert!(
        outcome
            .error_message()
            .is_some_and(|message| message.starts_with("Timeout"))
    );
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(page.relay.pending_calls(), 0);
    listener.abort();
}

#[rstest]
#[tokio::test]
async fn unknown_tool_comes_back_immediately(page: Page) {
    let listener = page.registry.attach();
    page.relay.start();

    let outcome = page.relay.run_directive(execute("get_widget", "c-x")).await;

    assert_eq!(outcome.error_message(), Some("Unknown tool: get_widget"));
    listener.abort();
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn shutdown_fails_outstanding_and_new_directives(page: Page) {
    page.registry
        .register_tool(sleeping_tool("slow", Duration::from_secs(5)))
        .expect("registration should succeed");
    let listener = page.registry.attach();
    page.relay.start();
    let relay = page.relay.clone();
    let waiting = tokio::spawn(async move { relay.run_directive(execute("slow", "c-1")).await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    page.relay.shutdown().await;

    let outstanding = waiting.await.expect("waiter finished");
    let later = page.relay.run_directive(execute("slow", "c-2")).await;
    for outcome in [outstanding, later] {
        assert!(
            outcome
                .error_message()
                .is_some_and(|message| message.starts_with("Channel unavailable"))
        );
    }
    let received = page.router.received();
    assert!(
        received
            .iter()
            .any(|(message, _)| message.type_name() == "PAGE_CLOSED")
    );
    listener.abort();
}

#[rstest]
#[tokio::test]
async fn page_sampling_round_trips_through_router(page: Page) {
    let listener = page.registry.attach();
    page.relay.start();

    let response = page
        .registry
        .request_sampling(SamplingRequest::new(vec![ChatMessage::user("What is this page?")]))
        .await
        .expect("sampling should succeed");

    assert_eq!(response.content.text(), "It sells widgets");
    listener.abort();
}

#[rstest]
#[tokio::test]
async fn relay_link_rejects_foreign_page(page: Page) {
    let result = RelayLink::dispatch(
        &page.relay,
        &PageInstanceId::from(7),
        Envelope::new(execute("any", "c-7")),
    )
    .await;

    assert!(matches!(result, Err(LinkError::Unreachable(_))));
}

#[rstest]
#[tokio::test]
async fn relay_link_rejects_unknown_version(page: Page) {
    let envelope: Envelope<PageDirective> = serde_json::from_value(json!({
        "version": 2,
        "message": { "type": "EXECUTE_ON_PAGE", "toolName": "any", "callId": "c-v2" }
    }))
    .expect("decodable envelope");

    let result = RelayLink::dispatch(&page.relay, &PageInstanceId::from(42), envelope).await;

    assert!(matches!(result, Err(LinkError::Protocol(_))));
}
