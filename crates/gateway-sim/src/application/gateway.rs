use crate::application::reference::{self, request_failure};
use crate::application::streams::StreamRegistry;
use crate::application::study;
use crate::error::{Result, SimError};
use crate::model::MarketModel;
use chrono::NaiveDate;
use log::{debug, info, warn};
use meridian_core::{CorrelationId, Event, Request, Subscription};
use meridian_gateway::messages::status;
use meridian_gateway::transport::channel::{ChannelLink, DEFAULT_CAPACITY};
use meridian_gateway::{ClientFrame, GatewayLink, Operations, Services};
use std::collections::HashSet;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Simulated gateway settings
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Interval between subscription ticks
    pub tick_interval: Duration,

    /// Data events per subscription before it is terminated; unlimited when `None`
    pub max_ticks: Option<u64>,

    /// Services that can be opened
    pub services: Vec<String>,

    /// Capacity of each direction of an in-process link
    pub channel_capacity: usize,

    /// Date of point-in-time reference fields; today when `None`
    pub as_of: Option<NaiveDate>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            max_ticks: None,
            services: Services::all().iter().map(|s| s.to_string()).collect(),
            channel_capacity: DEFAULT_CAPACITY,
            as_of: None,
        }
    }
}

/// Events produced by one client frame
#[derive(Debug, Default)]
pub struct FrameOutcome {
    pub events: Vec<Event>,
    /// The client asked to end the session
    pub stop: bool,
}

/// Gateway state for one client connection
pub struct SimGateway {
    config: SimConfig,
    model: MarketModel,
    /// Services this client has opened
    opened: HashSet<String>,
    streams: StreamRegistry,
}

impl SimGateway {
    pub fn new(config: SimConfig) -> Self {
        let model = match config.as_of {
            Some(date) => MarketModel::new(date),
            None => MarketModel::standard(),
        };
        Self::with_model(config, model)
    }

    pub fn with_model(config: SimConfig, model: MarketModel) -> Self {
        let streams = StreamRegistry::new(config.max_ticks);
        Self {
            config,
            model,
            opened: HashSet::new(),
            streams,
        }
    }

    pub fn model(&self) -> &MarketModel {
        &self.model
    }

    pub fn active_streams(&self) -> usize {
        self.streams.len()
    }

    /// Apply one client frame
    pub fn handle_frame(&mut self, frame: ClientFrame) -> FrameOutcome {
        debug!("<- {}", frame.as_str());
        let mut outcome = FrameOutcome::default();
        match frame {
            ClientFrame::OpenService {
                service,
                correlation_id,
            } => {
                let event = if self.config.services.contains(&service) {
                    info!("Service {} opened", service);
                    self.opened.insert(service.clone());
                    status::service_opened(&service, correlation_id)
                } else {
                    warn!("Unknown service {} requested", service);
                    status::service_open_failure(&service, correlation_id, "Service not found")
                };
                outcome.events.push(event);
            }
            ClientFrame::SendRequest {
                correlation_id,
                request,
            } => {
                outcome.events = self.handle_request(correlation_id, &request);
            }
            ClientFrame::Subscribe { subscriptions } => {
                outcome.events = subscriptions
                    .iter()
                    .map(|sub| self.handle_subscribe(sub))
                    .collect();
            }
            ClientFrame::Unsubscribe { correlation_ids } => {
                let cancelled = self.streams.unsubscribe(&correlation_ids);
                debug!("Cancelled {} of {} streams", cancelled, correlation_ids.len());
            }
            ClientFrame::Stop => {
                info!("Client ended the session");
                outcome.stop = true;
            }
        }
        outcome
    }

    fn handle_subscribe(&mut self, subscription: &Subscription) -> Event {
        let open = self.opened.contains(&subscription.service);
        self.streams.subscribe(&self.model, subscription, open)
    }

    fn handle_request(&self, id: CorrelationId, request: &Request) -> Vec<Event> {
        let operation = request.operation();
        let answer = if !self.opened.contains(request.service()) {
            Err(SimError::InvalidArgument(format!(
                "service {} is not open",
                request.service()
            )))
        } else {
            let params = request.params();
            match (request.service(), operation) {
                (Services::REFDATA, Operations::HISTORICAL_DATA) => {
                    reference::historical_data(&self.model, id, params)
                }
                (Services::REFDATA, Operations::REFERENCE_DATA) => {
                    reference::reference_data(&self.model, id, params).map(|e| vec![e])
                }
                (Services::REFDATA, Operations::PORTFOLIO_DATA) => {
                    reference::portfolio_data(&self.model, id, params).map(|e| vec![e])
                }
                (Services::TASVC, Operations::STUDY) => {
                    study::study(&self.model, id, params).map(|e| vec![e])
                }
                (service, operation) => Err(SimError::InvalidArgument(format!(
                    "{} has no operation {}",
                    service, operation
                ))),
            }
        };

        match answer {
            Ok(events) => {
                debug!("{} answered with {} events for {}", operation, events.len(), id);
                events
            }
            Err(e) => {
                warn!("{} failed for {}: {}", operation, id, e);
                vec![request_failure(id, operation, &e)]
            }
        }
    }

    /// Publish one round of subscription data
    pub fn tick(&mut self) -> Vec<Event> {
        self.streams.tick(&self.model)
    }

    /// Serve one client until it stops or disconnects
    pub async fn serve<L: GatewayLink>(mut self, mut link: L) -> Result<()> {
        link.send(status::session_started()).await?;

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = link.next() => {
                    let frame = match frame {
                        Ok(frame) => frame,
                        Err(e) if e.is_disconnect() => {
                            info!("Client disconnected: {}", e);
                            break;
                        }
                        Err(e) => return Err(e.into()),
                    };
                    let outcome = self.handle_frame(frame);
                    if !deliver(&mut link, outcome.events).await? || outcome.stop {
                        break;
                    }
                }
                _ = ticker.tick(), if !self.streams.is_empty() => {
                    let events = self.tick();
                    if !deliver(&mut link, events).await? {
                        break;
                    }
                }
            }
        }

        if let Err(e) = link.close().await {
            debug!("Error closing client link: {}", e);
        }
        Ok(())
    }
}

/// Send events in order; `false` once the client is gone
async fn deliver<L: GatewayLink>(link: &mut L, events: Vec<Event>) -> Result<bool> {
    for event in events {
        match link.send(event).await {
            Ok(()) => {}
            Err(e) if e.is_disconnect() => {
                info!("Client connection lost: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Start a simulated gateway on a background task; returns the client end of its link
pub fn spawn_in_process(
    config: SimConfig,
) -> (ChannelLink<ClientFrame, Event>, JoinHandle<Result<()>>) {
    let (client, server) = ChannelLink::<ClientFrame, Event>::pair(config.channel_capacity);
    let gateway = SimGateway::new(config);
    (client, tokio::spawn(gateway.serve(server)))
}
