use std::sync::Arc;

use lambda_http::{run, service_fn, Error, Request};
use mila_api_lambda::function_handler;
use mila_shared::{telemetry, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Config first so a local .env can set RUST_LOG.
    let config = Config::from_env();
    telemetry::init_tracing();

    let state = Arc::new(AppState::from_config(config).await);

    run(service_fn(move |event: Request| {
        let state = state.clone();
        async move { function_handler(event, state).await }
    }))
    .await
}
