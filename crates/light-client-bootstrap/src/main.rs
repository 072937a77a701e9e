use clap::Parser;

#[tokio::main]
async fn main() {
    let args = light_client_bootstrap::arguments::Arguments::parse();
    let obs_config = observe::Config::new(
        &args.logging.log_filter,
        args.logging.log_stderr_threshold,
        args.logging.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    tracing::info!("running light client bootstrap with validated arguments:\n{}", args);

    if let Err(err) = light_client_bootstrap::run(args).await {
        let retryable = err
            .downcast_ref::<light_client_bootstrap::Error>()
            .is_some_and(light_client_bootstrap::Error::is_retryable);
        tracing::error!(?err, retryable, "bootstrap failed");
        std::process::exit(1);
    }
}
