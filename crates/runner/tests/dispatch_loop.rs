//! Integration test: Dispatcher <-> Session <-> simulated gateway

use chrono::NaiveDate;
use meridian_core::{
    CorrelationId, Event, Message, Names, Request, Subscription, SubscriptionList,
};
use meridian_gateway::{
    ChannelLink, ClientFrame, Operations, Services, Session, SessionOptions, SessionState,
};
use meridian_gateway_sim::{SimConfig, spawn_in_process};
use meridian_runner::{
    Dispatcher, EventHandler, HandlerError, SubscriptionHandler, SubscriptionRouter,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

type SimSession = Session<ChannelLink<ClientFrame, Event>>;

fn config() -> SimConfig {
    SimConfig {
        tick_interval: Duration::from_millis(5),
        as_of: NaiveDate::from_ymd_opt(2009, 11, 2),
        ..SimConfig::default()
    }
}

async fn start() -> (SimSession, JoinHandle<meridian_gateway_sim::Result<()>>) {
    let _ = env_logger::try_init();
    let (link, gateway) = spawn_in_process(config());
    let session = Session::start(SessionOptions::default(), link)
        .await
        .expect("session should start");
    (session, gateway)
}

async fn subscribe_vwap(session: &mut SimSession, ids: &[u64]) {
    session.open_service(Services::MKTVWAP).await.unwrap();
    let mut list = SubscriptionList::new();
    for (id, ticker) in ids.iter().zip(["AAPL US Equity", "IBM US Equity"]) {
        list.add(
            Subscription::new(Services::MKTVWAP, ticker, CorrelationId::new(*id))
                .with_fields(["VWAP"]),
        )
        .unwrap();
    }
    session.subscribe(list).await.unwrap();
}

#[derive(Default)]
struct Responses {
    partials: usize,
    finals: usize,
}

impl EventHandler for Responses {
    fn on_response(&mut self, _message: &Message, is_final: bool) -> Result<(), HandlerError> {
        if is_final {
            self.finals += 1;
        } else {
            self.partials += 1;
        }
        Ok(())
    }
}

struct Recorder {
    seen: Arc<Mutex<Vec<CorrelationId>>>,
}

impl SubscriptionHandler for Recorder {
    fn on_data(&mut self, message: &Message) -> Result<(), HandlerError> {
        self.seen
            .lock()
            .unwrap()
            .extend(message.correlation_ids.iter().copied());
        Ok(())
    }
}

#[tokio::test]
async fn test_request_ends_at_final_despite_ticks() {
    let (mut session, _gateway) = start().await;
    subscribe_vwap(&mut session, &[1]).await;
    session.open_service(Services::REFDATA).await.unwrap();
    // Let some ticks queue up ahead of the response
    tokio::time::sleep(Duration::from_millis(30)).await;

    let request = Request::builder(Services::REFDATA, Operations::HISTORICAL_DATA)
        .extend(Names::SECURITIES, ["IBM US Equity", "MSFT US Equity"])
        .append(Names::FIELDS, "PX_LAST")
        .set(Names::START_DATE, "20091001")
        .set(Names::END_DATE, "20091031")
        .build();
    let mut dispatcher = Dispatcher::new(Responses::default());
    let stats = dispatcher.run_request(&mut session, &request).await.unwrap();

    assert_eq!(dispatcher.handler().partials, 1);
    assert_eq!(dispatcher.handler().finals, 1);
    assert_eq!(stats.subscription_updates, 0);

    // Ticks received while the request ran are still waiting
    let queued = session.next_event().await.unwrap();
    assert!(queued.event_type.is_subscription());

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_router_keeps_streams_apart() {
    let (mut session, _gateway) = start().await;
    subscribe_vwap(&mut session, &[1, 2]).await;

    let first = Arc::new(Mutex::new(Vec::new()));
    let second = Arc::new(Mutex::new(Vec::new()));
    let mut router = SubscriptionRouter::new();
    router.register(CorrelationId::new(1), Box::new(Recorder { seen: first.clone() }));
    router.register(CorrelationId::new(2), Box::new(Recorder { seen: second.clone() }));

    let mut dispatcher = Dispatcher::new(router);
    let stats = dispatcher
        .run_subscriptions(&mut session, tokio::time::sleep(Duration::from_millis(100)))
        .await
        .unwrap();

    let first = first.lock().unwrap().clone();
    let second = second.lock().unwrap().clone();
    assert!(!first.is_empty());
    assert!(!second.is_empty());
    assert!(first.iter().all(|id| *id == CorrelationId::new(1)));
    assert!(second.iter().all(|id| *id == CorrelationId::new(2)));
    assert_eq!(dispatcher.handler().dropped(), 0);
    assert_eq!(stats.handler_errors, 0);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_subscription_loop_ends_on_termination() {
    let (mut session, gateway) = start().await;
    subscribe_vwap(&mut session, &[7]).await;
    gateway.abort();

    let mut dispatcher = Dispatcher::new(SubscriptionRouter::new());
    dispatcher
        .run_subscriptions(&mut session, std::future::pending())
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Terminated);
}

struct Failing;

impl EventHandler for Failing {
    fn on_response(&mut self, _message: &Message, _is_final: bool) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_subscription_data(&mut self, _message: &Message) -> Result<(), HandlerError> {
        Err(HandlerError::Other("unprintable".to_string()))
    }
}

#[tokio::test]
async fn test_handler_errors_are_counted_not_fatal() {
    let (mut session, _gateway) = start().await;
    subscribe_vwap(&mut session, &[1]).await;

    let mut dispatcher = Dispatcher::new(Failing);
    let stats = dispatcher
        .run_subscriptions(&mut session, tokio::time::sleep(Duration::from_millis(60)))
        .await
        .unwrap();
    assert!(stats.handler_errors >= 2);
    assert_eq!(stats.handler_errors, stats.subscription_updates - 1);

    session.stop().await.unwrap();
}
