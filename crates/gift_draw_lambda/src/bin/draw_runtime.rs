use chrono::Utc;
use gift_draw_lambda::adapters::dynamodb::DynamoEntryStore;
use gift_draw_lambda::config::RuntimeConfig;
use gift_draw_lambda::handlers::api::{
    error_response, handle_api_event, ApiGatewayResponse, HandlerConfig,
};
use gift_draw_lambda::runtime::contract::ReasonCode;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    dynamodb_client: &aws_sdk_dynamodb::Client,
) -> Result<ApiGatewayResponse, Error> {
    let runtime_config = match RuntimeConfig::from_env() {
        Ok(value) => value,
        Err(error) => {
            tracing::error!(
                component = "api_router",
                event = "misconfiguration",
                error = %error,
            );
            return Ok(error_response(ReasonCode::Misconfiguration, ""));
        }
    };

    let config = HandlerConfig {
        draw: runtime_config.draw,
        event_time: Utc::now().to_rfc3339(),
    };
    let store = DynamoEntryStore::new(runtime_config.entries_table, dynamodb_client.clone());

    Ok(handle_api_event(
        event.payload,
        &config,
        &store,
        &mut rand::thread_rng(),
    ))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&aws_config);

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
        let client = dynamodb_client.clone();
        async move { handle_request(event, &client).await }
    }))
    .await
}
