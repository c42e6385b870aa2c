//! Integration test: Session <-> scripted gateway
//!
//! A small gateway double answers client frames through a `ChannelLink`, so
//! the session's ordering and routing rules can be checked exactly.

use meridian_core::{
    CorrelationId, Element, Event, EventType, Message, Names, Request, Subscription,
    SubscriptionList,
};
use meridian_gateway::{
    ChannelLink, ClientFrame, GatewayLink, Link, Session, SessionError, SessionOptions,
    SessionState, Services, TransportError,
    messages::status,
};
use tokio::task::JoinHandle;

type ClientEnd = ChannelLink<ClientFrame, Event>;

/// Spawn a gateway that announces the session then answers each frame with `script`
fn spawn_gateway<F>(mut link: impl GatewayLink + 'static, mut script: F) -> JoinHandle<Vec<ClientFrame>>
where
    F: FnMut(&ClientFrame) -> Vec<Event> + Send + 'static,
{
    tokio::spawn(async move {
        let mut seen = Vec::new();
        if link.send(status::session_started()).await.is_err() {
            return seen;
        }
        while let Ok(frame) = link.next().await {
            let stop = frame == ClientFrame::Stop;
            for event in script(&frame) {
                if link.send(event).await.is_err() {
                    break;
                }
            }
            seen.push(frame);
            if stop {
                break;
            }
        }
        seen
    })
}

/// Opens every service; leaves requests to the test
fn open_all(frame: &ClientFrame) -> Vec<Event> {
    match frame {
        ClientFrame::OpenService {
            service,
            correlation_id,
        } => vec![status::service_opened(service, *correlation_id)],
        _ => Vec::new(),
    }
}

fn response(event_type: EventType, id: CorrelationId, seq: i32) -> Event {
    Event::single(
        event_type,
        Message::new(
            "HistoricalDataResponse",
            Element::complex(
                Names::SECURITY_DATA,
                vec![Element::scalar(Names::SEQUENCE_NUMBER, seq)],
            ),
        )
        .with_correlation_id(id),
    )
}

fn tick(id: CorrelationId) -> Event {
    Event::single(
        EventType::SubscriptionData,
        Message::new("MarketDataEvents", Element::complex("MarketDataEvents", vec![]))
            .with_correlation_id(id),
    )
}

async fn start(script: impl FnMut(&ClientFrame) -> Vec<Event> + Send + 'static) -> (
    Session<ClientEnd>,
    JoinHandle<Vec<ClientFrame>>,
) {
    let (client, server) = ChannelLink::<ClientFrame, Event>::pair(64);
    let gateway = spawn_gateway(server, script);
    let session = Session::start(SessionOptions::default(), client)
        .await
        .expect("session should start");
    (session, gateway)
}

#[tokio::test]
async fn test_startup_failure_is_connect_failed() {
    let _ = env_logger::try_init();

    let (client, mut server) = ChannelLink::<ClientFrame, Event>::pair(8);
    server
        .send(status::session_startup_failure("not entitled"))
        .await
        .unwrap();

    let err = Session::start(SessionOptions::default(), client)
        .await
        .err()
        .expect("startup failure must not yield a session");
    match err {
        SessionError::ConnectFailed { reason, .. } => assert_eq!(reason, "not entitled"),
        other => panic!("unexpected error: {:?}", other),
    }
    // The client end was closed on the way out
    assert!(matches!(
        server.next().await,
        Err(TransportError::ChannelClosed)
    ));
}

#[tokio::test]
async fn test_open_service() {
    let _ = env_logger::try_init();

    let (mut session, _gateway) = start(|frame| match frame {
        ClientFrame::OpenService {
            service,
            correlation_id,
        } if service == Services::REFDATA => {
            vec![status::service_opened(service, *correlation_id)]
        }
        ClientFrame::OpenService {
            service,
            correlation_id,
        } => vec![status::service_open_failure(
            service,
            *correlation_id,
            "unknown service",
        )],
        _ => Vec::new(),
    })
    .await;

    assert!(session.open_service(Services::REFDATA).await.unwrap());
    // Second open is answered locally
    assert!(!session.open_service(Services::REFDATA).await.unwrap());
    assert!(session.is_service_open(Services::REFDATA));

    match session.open_service("//nope").await {
        Err(SessionError::ServiceUnavailable { service, reason }) => {
            assert_eq!(service, "//nope");
            assert_eq!(reason, "unknown service");
        }
        other => panic!("expected ServiceUnavailable, got {:?}", other.map(|_| ())),
    }

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_request_to_unopened_service_is_invalid() {
    let (mut session, _gateway) = start(open_all).await;

    let request = Request::builder(Services::REFDATA, "HistoricalDataRequest").build();
    let result = session.send_request(&request).await;
    assert!(matches!(result, Err(SessionError::RequestInvalid(_))));

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_stream_stops_at_final_response() {
    let _ = env_logger::try_init();

    let other = CorrelationId::new(7);
    let (mut session, _gateway) = start(move |frame| match frame {
        ClientFrame::SendRequest { correlation_id, .. } => {
            let id = *correlation_id;
            vec![
                response(EventType::PartialResponse, id, 0),
                tick(other),
                response(EventType::PartialResponse, id, 1),
                response(EventType::Response, id, 2),
                // Arrives after the final response and must stay unread
                response(EventType::Response, id, 3),
            ]
        }
        other => open_all(other),
    })
    .await;

    session.open_service(Services::REFDATA).await.unwrap();
    let request = Request::builder(Services::REFDATA, "HistoricalDataRequest").build();

    let events = session
        .send_request(&request)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let kinds: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        kinds,
        vec![
            EventType::PartialResponse,
            EventType::PartialResponse,
            EventType::Response
        ]
    );
    assert_eq!(events.iter().filter(|e| e.is_final_response()).count(), 1);

    // The interleaved tick was kept for the general event sequence
    let next = session.next_event().await.unwrap();
    assert_eq!(next.event_type, EventType::SubscriptionData);
    assert!(next.is_for(other));

    // The trailing event was not consumed by the stream
    let trailing = session.next_event().await.unwrap();
    assert_eq!(trailing.event_type, EventType::Response);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_subscription_token_rejected() {
    let (mut session, _gateway) = start(open_all).await;
    session.open_service(Services::MKTVWAP).await.unwrap();

    let id = CorrelationId::new(1);
    let mut list = SubscriptionList::new();
    list.add(Subscription::new(Services::MKTVWAP, "AAPL US Equity", id))
        .unwrap();
    session.subscribe(list).await.unwrap();
    assert_eq!(session.active_subscriptions().count(), 1);

    let mut again = SubscriptionList::new();
    again
        .add(Subscription::new(Services::MKTVWAP, "IBM US Equity", id))
        .unwrap();
    let result = session.subscribe(again).await;
    assert!(matches!(result, Err(SessionError::DuplicateCorrelationId(dup)) if dup == id));

    session.unsubscribe(&[id]).await.unwrap();
    assert_eq!(session.active_subscriptions().count(), 0);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_delivers_terminal_event_once() {
    let (mut session, gateway) = start(open_all).await;

    session.stop().await.unwrap();
    assert_eq!(session.state(), SessionState::Stopped);

    let event = session.next_event().await.unwrap();
    assert!(status::is_session_terminated(&event));
    assert!(matches!(
        session.next_event().await,
        Err(SessionError::SessionTerminated)
    ));

    // Stop is idempotent
    session.stop().await.unwrap();

    let frames = gateway.await.unwrap();
    assert_eq!(frames.last(), Some(&ClientFrame::Stop));
}

#[tokio::test]
async fn test_gateway_disconnect_terminates_session() {
    let (client, mut server) = ChannelLink::<ClientFrame, Event>::pair(8);
    server.send(status::session_started()).await.unwrap();
    let mut session = Session::start(SessionOptions::default(), client)
        .await
        .unwrap();

    drop(server);

    let event = session.next_event().await.unwrap();
    assert!(status::is_session_terminated(&event));
    assert_eq!(session.state(), SessionState::Terminated);
    assert!(matches!(
        session.next_event().await,
        Err(SessionError::SessionTerminated)
    ));
}

#[tokio::test]
async fn test_connect_refused_is_connect_failed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let options = SessionOptions::new("127.0.0.1", port);
    let result = Session::connect(&options).await;
    assert!(matches!(result, Err(SessionError::ConnectFailed { .. })));
}
