use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

use telesim::config::Config;
use telesim::provider;
use telesim::server::{router, AppState};
use telesim::store::{BehaviorStore, PromptStore};
use telesim::turn::TurnProcessor;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    // No working provider means the process must not serve traffic.
    let provider = provider::initialize(&config, provider::prompt_for_openai_key)
        .expect("failed to initialize any language model provider");

    let prompts = PromptStore::from_csv_path(&config.prompts_file)
        .expect("failed to load the prompts CSV");
    let behaviors = BehaviorStore::from_csv_path(&config.behavior_file)
        .expect("failed to load the behavior CSV");
    info!(
        "Loaded {} scenarios from {}",
        prompts.total(),
        config.prompts_file
    );

    let state = AppState {
        prompts: Arc::new(prompts),
        behaviors: Arc::new(behaviors),
        turns: Arc::new(TurnProcessor::new(provider)),
        polite_call_limit: config.polite_call_limit,
    };

    let app = router(state);

    info!("Telesim API listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind the API address");
    axum::serve(listener, app).await.expect("server error");
}
