//! The example programs, independent of how the session was connected
//!
//! Request programs send their requests one after another and return after
//! the final response of the last one. Subscription programs run until the
//! session ends or `shutdown` resolves.

use crate::config::{ClientConfig, Example};
use crate::error::{CliError, Result};
use crate::handlers::{PagePrinter, ResponsePrinter, TickPrinter};
use crate::print::Output;
use log::info;
use meridian_core::{CorrelationId, Names, Request, Subscription, SubscriptionList, Value};
use meridian_gateway::{Operations, Services, Session, SessionLink};
use meridian_runner::{DispatchStats, Dispatcher, SubscriptionHandler, SubscriptionRouter};
use std::future::Future;

/// Default look-back of technical studies
pub const DEFAULT_STUDY_PERIOD: i32 = 14;

async fn open<L: SessionLink>(session: &mut Session<L>, service: &str) -> Result<()> {
    if session.open_service(service).await? {
        info!("Opened {}", service);
    }
    Ok(())
}

async fn request_once<L: SessionLink>(
    session: &mut Session<L>,
    request: &Request,
    out: &Output,
) -> Result<DispatchStats> {
    let mut dispatcher = Dispatcher::new(ResponsePrinter::new(out.clone()));
    Ok(dispatcher.run_request(session, request).await?)
}

pub async fn historical_data<L: SessionLink>(
    session: &mut Session<L>,
    config: &ClientConfig,
    out: &Output,
) -> Result<DispatchStats> {
    open(session, Services::REFDATA).await?;
    let (start, end) = config.date_range();
    let mut builder = Request::builder(Services::REFDATA, Operations::HISTORICAL_DATA)
        .extend(Names::SECURITIES, config.securities.iter().map(String::as_str))
        .extend(Names::FIELDS, config.fields.iter().map(String::as_str))
        .set(Names::START_DATE, start)
        .set(Names::END_DATE, end);
    // e.g. periodicitySelection=MONTHLY
    for (name, value) in &config.options {
        builder = builder.set(name, value.as_str());
    }
    request_once(session, &builder.build(), out).await
}

pub async fn reference_data<L: SessionLink>(
    session: &mut Session<L>,
    config: &ClientConfig,
    out: &Output,
) -> Result<DispatchStats> {
    open(session, Services::REFDATA).await?;
    let mut builder = Request::builder(Services::REFDATA, Operations::REFERENCE_DATA)
        .extend(Names::SECURITIES, config.securities.iter().map(String::as_str))
        .extend(Names::FIELDS, config.fields.iter().map(String::as_str));
    for (name, value) in &config.options {
        builder = builder.row(
            Names::OVERRIDES,
            [
                (Names::FIELD_ID, Value::from(name.as_str())),
                (Names::VALUE, Value::from(value.as_str())),
            ],
        );
    }
    request_once(session, &builder.build(), out).await
}

pub async fn portfolio_data<L: SessionLink>(
    session: &mut Session<L>,
    config: &ClientConfig,
    out: &Output,
) -> Result<DispatchStats> {
    open(session, Services::REFDATA).await?;
    let request = Request::builder(Services::REFDATA, Operations::PORTFOLIO_DATA)
        .extend(Names::SECURITIES, config.securities.iter().map(String::as_str))
        .extend(Names::FIELDS, config.fields.iter().map(String::as_str))
        .build();
    request_once(session, &request, out).await
}

/// One study request per security and study name (`-f`)
pub async fn technical_analysis<L: SessionLink>(
    session: &mut Session<L>,
    config: &ClientConfig,
    out: &Output,
) -> Result<DispatchStats> {
    let period = match config.option("period") {
        Some(text) => text
            .parse::<i32>()
            .map_err(|_| CliError::InvalidOption(format!("period={}", text)))?,
        None => DEFAULT_STUDY_PERIOD,
    };
    open(session, Services::TASVC).await?;

    let (start, end) = config.date_range();
    let mut dispatcher = Dispatcher::new(ResponsePrinter::new(out.clone()));
    for security in &config.securities {
        for study in &config.fields {
            let request = Request::builder(Services::TASVC, Operations::STUDY)
                .set(Names::SECURITY, security.as_str())
                .set(Names::STUDY, study.as_str())
                .set(Names::PERIOD, period)
                .set(Names::START_DATE, start.as_str())
                .set(Names::END_DATE, end.as_str())
                .build();
            out.line(format!("{} {} ({})", study, security, period))?;
            dispatcher.run_request(session, &request).await?;
        }
    }
    Ok(dispatcher.stats())
}

async fn run_streams<L, F>(
    session: &mut Session<L>,
    service: &str,
    streams: Vec<(Subscription, Box<dyn SubscriptionHandler>)>,
    shutdown: F,
) -> Result<DispatchStats>
where
    L: SessionLink,
    F: Future<Output = ()>,
{
    open(session, service).await?;

    let mut list = SubscriptionList::new();
    let mut router = SubscriptionRouter::new();
    for (subscription, handler) in streams {
        router.register(subscription.correlation_id, handler);
        list.add(subscription).map_err(meridian_gateway::SessionError::from)?;
    }
    session.subscribe(list).await?;

    let mut dispatcher = Dispatcher::new(router);
    Ok(dispatcher.run_subscriptions(session, shutdown).await?)
}

/// One VWAP subscription per security; tokens are 1, 2, ...
pub async fn vwap_subscription<L, F>(
    session: &mut Session<L>,
    config: &ClientConfig,
    out: &Output,
    shutdown: F,
) -> Result<DispatchStats>
where
    L: SessionLink,
    F: Future<Output = ()>,
{
    let options: Vec<String> = config
        .options
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    let streams = config
        .securities
        .iter()
        .enumerate()
        .map(|(i, security)| {
            let id = CorrelationId::new(i as u64 + 1);
            let subscription = Subscription::new(Services::MKTVWAP, security.as_str(), id)
                .with_fields(config.fields.iter().cloned())
                .with_options(options.iter().cloned());
            let handler: Box<dyn SubscriptionHandler> =
                Box::new(TickPrinter::new(security.as_str(), out.clone()));
            (subscription, handler)
        })
        .collect();
    run_streams(session, Services::MKTVWAP, streams, shutdown).await
}

/// One page subscription per topic (`-t`); tokens are 1, 2, ...
pub async fn page_data<L, F>(
    session: &mut Session<L>,
    config: &ClientConfig,
    out: &Output,
    shutdown: F,
) -> Result<DispatchStats>
where
    L: SessionLink,
    F: Future<Output = ()>,
{
    let streams = config
        .topics
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            let id = CorrelationId::new(i as u64 + 1);
            let subscription = Subscription::new(Services::PAGEDATA, topic.as_str(), id);
            let handler: Box<dyn SubscriptionHandler> =
                Box::new(PagePrinter::new(topic.as_str(), out.clone()));
            (subscription, handler)
        })
        .collect();
    run_streams(session, Services::PAGEDATA, streams, shutdown).await
}

/// Run the program `config.example`
pub async fn run<L, F>(
    session: &mut Session<L>,
    config: &ClientConfig,
    out: &Output,
    shutdown: F,
) -> Result<DispatchStats>
where
    L: SessionLink,
    F: Future<Output = ()>,
{
    match config.example {
        Example::VwapSubscription => vwap_subscription(session, config, out, shutdown).await,
        Example::PageData => page_data(session, config, out, shutdown).await,
        example => {
            // Request programs stop at the final response or at `shutdown`
            tokio::select! {
                biased;
                _ = shutdown => {
                    info!("{} interrupted", example.name());
                    Err(CliError::Interrupted)
                }
                result = request_program(session, config, out) => result,
            }
        }
    }
}

async fn request_program<L: SessionLink>(
    session: &mut Session<L>,
    config: &ClientConfig,
    out: &Output,
) -> Result<DispatchStats> {
    match config.example {
        Example::HistoricalData => historical_data(session, config, out).await,
        Example::ReferenceData => reference_data(session, config, out).await,
        Example::PortfolioData => portfolio_data(session, config, out).await,
        Example::TechnicalAnalysis => technical_analysis(session, config, out).await,
        Example::VwapSubscription | Example::PageData => Err(CliError::InvalidOption(format!(
            "{} is a subscription program",
            config.example.name()
        ))),
    }
}
