use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use reputation_bot::api::GithubClient;
use reputation_bot::config::{Config, Env};
use reputation_bot::events::Context;
use reputation_bot::webhook;

#[rocket::launch]
async fn rocket() -> _ {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let env = envy::from_env::<Env>().expect("Failed to load environment variables");
    let config = Config::try_from(&env).expect("Invalid configuration");
    tracing::info!(
        repo = %config.repo,
        threshold = config.threshold,
        core_team = ?config.core_team,
        secret = config.webhook_secret.is_some(),
        "starting reputation bot"
    );

    let github = GithubClient::new(env.github_token)
        .await
        .expect("Failed to initialize GitHub client");
    tracing::info!(bot = %github.user_handle, "authenticated against GitHub");

    let context = Context {
        github: Arc::new(github),
        config: Arc::new(config),
    };

    rocket::build()
        .mount("/", rocket::routes![webhook::webhook, webhook::health])
        .manage(context)
}
