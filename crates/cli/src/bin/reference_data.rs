//! Reference data with overrides and bulk fields

#[tokio::main(flavor = "current_thread")]
async fn main() {
    meridian_cli::run_main(meridian_cli::Example::ReferenceData).await
}
