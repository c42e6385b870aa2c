//! VWAP subscriptions; Ctrl-C to stop

#[tokio::main(flavor = "current_thread")]
async fn main() {
    meridian_cli::run_main(meridian_cli::Example::VwapSubscription).await
}
