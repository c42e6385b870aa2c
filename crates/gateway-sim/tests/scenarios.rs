//! End-to-end scenarios: Session <-> simulated gateway
//!
//! Each test drives a real `Session` against `SimGateway`, in process over a
//! `ChannelLink` and once over TCP.

use chrono::NaiveDate;
use meridian_core::items::{field_exceptions, security_error};
use meridian_core::walker::{get_field, get_f64, get_string, get_value, walk_sequence};
use meridian_core::{
    CorrelationId, Event, EventType, Names, Request, Subscription, SubscriptionList, Value,
};
use meridian_gateway::{
    ChannelLink, ClientFrame, Operations, Services, Session, SessionOptions, TcpSession,
};
use meridian_gateway::TcpLink;
use meridian_gateway_sim::{SimConfig, SimGateway, bind, serve_tcp, spawn_in_process};
use std::time::Duration;

type SimSession = Session<ChannelLink<ClientFrame, Event>>;

fn config() -> SimConfig {
    SimConfig {
        tick_interval: Duration::from_millis(10),
        as_of: NaiveDate::from_ymd_opt(2009, 11, 2),
        ..SimConfig::default()
    }
}

async fn start(config: SimConfig) -> SimSession {
    let _ = env_logger::try_init();
    let (link, _gateway) = spawn_in_process(config);
    Session::start(SessionOptions::default(), link)
        .await
        .expect("session should start")
}

fn historical(securities: &[&str]) -> Request {
    Request::builder(Services::REFDATA, Operations::HISTORICAL_DATA)
        .extend(Names::SECURITIES, securities.iter().copied())
        .append(Names::FIELDS, "PX_LAST")
        .set(Names::START_DATE, "20091001")
        .set(Names::END_DATE, "20091101")
        .build()
}

#[tokio::test]
async fn test_historical_ibm_rows() {
    let mut session = start(config()).await;
    assert!(session.open_service(Services::REFDATA).await.unwrap());

    let events = session
        .send_request(&historical(&["IBM US Equity"]))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_final_response());

    let security_data = get_field(&events[0].messages[0].body, Names::SECURITY_DATA).unwrap();
    assert_eq!(get_string(security_data, Names::SECURITY).unwrap(), "IBM US Equity");
    let rows = walk_sequence(get_field(security_data, Names::FIELD_DATA).unwrap()).unwrap();
    assert!(rows.len() > 0);
    for row in rows {
        assert!(matches!(get_value(row, Names::DATE).unwrap(), Value::Datetime(_)));
        assert!(get_f64(row, "PX_LAST").unwrap() > 0.0);
    }

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_security_still_final() {
    let mut session = start(config()).await;
    session.open_service(Services::REFDATA).await.unwrap();

    let events = session
        .send_request(&historical(&["NOPE US Equity"]))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_final_response());

    let security_data = get_field(&events[0].messages[0].body, Names::SECURITY_DATA).unwrap();
    let error = security_error(security_data).unwrap().expect("security error");
    assert_eq!(error.security, "NOPE US Equity");
    assert_eq!(error.info.category, "BAD_SEC");

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_multi_security_partials_then_final() {
    let mut session = start(config()).await;
    session.open_service(Services::REFDATA).await.unwrap();

    let securities = ["IBM US Equity", "AAPL US Equity", "MSFT US Equity"];
    let events = session
        .send_request(&historical(&securities))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let finals = events.iter().filter(|e| e.is_final_response()).count();
    assert_eq!(finals, 1);
    assert_eq!(events.len(), securities.len());
    assert!(events.last().unwrap().is_final_response());
    for event in &events[..securities.len() - 1] {
        assert_eq!(event.event_type, EventType::PartialResponse);
    }

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_reference_field_exceptions() {
    let mut session = start(config()).await;
    session.open_service(Services::REFDATA).await.unwrap();

    let request = Request::builder(Services::REFDATA, Operations::REFERENCE_DATA)
        .append(Names::SECURITIES, "VOD LN Equity")
        .extend(Names::FIELDS, ["PX_LAST", "CRNCY", "EQY_FLOAT", "NOT_A_FIELD"])
        .build();
    let events = session.send_request(&request).await.unwrap().collect().await.unwrap();
    let entries = get_field(&events[0].messages[0].body, Names::SECURITY_DATA).unwrap();
    let entry = walk_sequence(entries).unwrap().next().unwrap();

    let exceptions = field_exceptions(entry).unwrap();
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].info.category, "BAD_FLD");

    let data = get_field(entry, Names::FIELD_DATA).unwrap();
    assert_eq!(get_string(data, "CRNCY").unwrap(), "GBp");
    // Unrecognised wire types still read as text
    assert!(matches!(get_value(data, "EQY_FLOAT").unwrap(), Value::Unknown { .. }));

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_portfolio_bulk_rows() {
    let mut session = start(config()).await;
    session.open_service(Services::REFDATA).await.unwrap();

    let request = Request::builder(Services::REFDATA, Operations::PORTFOLIO_DATA)
        .append(Names::SECURITIES, "P1234567-1 Client")
        .extend(Names::FIELDS, ["PORTFOLIO_MEMBER", "PORTFOLIO_MWEIGHT"])
        .build();
    let events = session.send_request(&request).await.unwrap().collect().await.unwrap();
    let entries = get_field(&events[0].messages[0].body, Names::SECURITY_DATA).unwrap();
    let entry = walk_sequence(entries).unwrap().next().unwrap();
    let data = get_field(entry, Names::FIELD_DATA).unwrap();

    let members = walk_sequence(get_field(data, "PORTFOLIO_MEMBER").unwrap()).unwrap();
    assert_eq!(members.len(), 3);
    let weights: f64 = walk_sequence(get_field(data, "PORTFOLIO_MWEIGHT").unwrap())
        .unwrap()
        .map(|row| get_f64(row, "Weight").unwrap())
        .sum();
    assert!((weights - 100.0).abs() < 0.1);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_study_request() {
    let mut session = start(config()).await;
    session.open_service(Services::TASVC).await.unwrap();

    let request = Request::builder(Services::TASVC, Operations::STUDY)
        .set(Names::SECURITY, "IBM US Equity")
        .set(Names::STUDY, "SMAVG")
        .set(Names::PERIOD, 10)
        .set(Names::START_DATE, "20091001")
        .set(Names::END_DATE, "20091031")
        .build();
    let events = session.send_request(&request).await.unwrap().collect().await.unwrap();
    assert_eq!(events.len(), 1);
    let rows = get_field(&events[0].messages[0].body, Names::STUDY_DATA).unwrap();
    assert_eq!(walk_sequence(rows).unwrap().len(), 22);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_vwap_subscription_status_then_data() {
    let mut session = start(config()).await;
    session.open_service(Services::MKTVWAP).await.unwrap();

    let id = CorrelationId::new(1);
    let mut list = SubscriptionList::new();
    list.add(
        Subscription::new(Services::MKTVWAP, "AAPL US Equity", id)
            .with_fields(["VWAP"])
            .with_options(["VWAP_START_TIME=09:00"]),
    )
    .unwrap();
    session.subscribe(list).await.unwrap();

    let status = session.next_event().await.unwrap();
    assert_eq!(status.event_type, EventType::SubscriptionStatus);
    assert!(status.has_message_type(Names::SUBSCRIPTION_STARTED));
    assert!(status.is_for(id));

    for _ in 0..3 {
        let data = session.next_event().await.unwrap();
        assert_eq!(data.event_type, EventType::SubscriptionData);
        assert!(data.is_for(id));
        assert!(get_f64(&data.messages[0].body, "VWAP").unwrap() > 0.0);
    }

    session.unsubscribe(&[id]).await.unwrap();
    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_subscription_terminates_after_max_ticks() {
    let mut session = start(SimConfig {
        max_ticks: Some(2),
        ..config()
    })
    .await;
    session.open_service(Services::MKTDATA).await.unwrap();

    let id = CorrelationId::new(42);
    let mut list = SubscriptionList::new();
    list.add(Subscription::new(Services::MKTDATA, "IBM US Equity", id))
        .unwrap();
    session.subscribe(list).await.unwrap();
    assert!(session.subscription(id).is_some());

    let mut data = 0;
    loop {
        let event = session.next_event().await.unwrap();
        if event.has_message_type(Names::SUBSCRIPTION_TERMINATED) {
            break;
        }
        if event.event_type == EventType::SubscriptionData {
            data += 1;
        }
    }
    assert_eq!(data, 2);
    assert!(session.subscription(id).is_none());

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_service_rejected() {
    let mut session = start(config()).await;
    let result = session.open_service("//nope").await;
    assert!(matches!(
        result,
        Err(meridian_gateway::SessionError::ServiceUnavailable { .. })
    ));
    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_tcp_end_to_end() {
    let _ = env_logger::try_init();
    let listener = bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(serve_tcp(listener, config()));

    let options = SessionOptions::new("127.0.0.1", port);
    let mut session: TcpSession = Session::connect(&options).await.unwrap();
    session.open_service(Services::REFDATA).await.unwrap();

    let events = session
        .send_request(&historical(&["IBM US Equity", "SPX Index"]))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(events.len(), 2);
    assert!(events[1].is_final_response());

    session.stop().await.unwrap();
    server.abort();
}

#[tokio::test]
async fn test_tcp_client_dropped_while_streaming() {
    let _ = env_logger::try_init();
    let listener = bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let gateway = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let link = TcpLink::<Event, ClientFrame>::from_stream(stream, 64).unwrap();
        SimGateway::new(SimConfig {
            tick_interval: Duration::from_millis(2),
            ..config()
        })
        .serve(link)
        .await
    });

    let options = SessionOptions::new("127.0.0.1", port);
    let mut session: TcpSession = Session::connect(&options).await.unwrap();
    session.open_service(Services::MKTDATA).await.unwrap();
    let mut list = SubscriptionList::new();
    list.add(Subscription::new(
        Services::MKTDATA,
        "IBM US Equity",
        CorrelationId::new(1),
    ))
    .unwrap();
    session.subscribe(list).await.unwrap();
    for _ in 0..3 {
        session.next_event().await.unwrap();
    }

    // No stop frame: the socket just goes away mid-stream
    drop(session);

    let result = tokio::time::timeout(Duration::from_secs(5), gateway)
        .await
        .expect("gateway should notice the disconnect")
        .unwrap();
    assert!(result.is_ok(), "{:?}", result);
}
