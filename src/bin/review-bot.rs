use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use review_bot::bot::BotContext;
use review_bot::config::BotConfig;
use review_bot::github::api::base_github_url;
use review_bot::github::api::client::GithubClient;
use review_bot::github::server::{create_app, create_bot_process, ServerState};
use review_bot::github::{create_github_client, load_bot_user, WebhookSecret};
use review_bot::permissions::CollaboratorPermissionResolver;

#[derive(clap::Parser)]
struct Opts {
    /// Secret used to authenticate webhooks.
    #[arg(long, env = "WEBHOOK_SECRET")]
    webhook_secret: String,

    /// Personal access token of the bot account.
    #[arg(long, env = "GITHUB_TOKEN")]
    token: String,

    /// Base URL of the GitHub API.
    #[arg(long, env = "API_URL", default_value = base_github_url())]
    api_url: String,

    /// Path to the TOML file with the configuration of handled repositories.
    #[arg(long, env = "BOT_CONFIG")]
    config: PathBuf,

    /// Port on which the webhook server listens.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

async fn server(state: ServerState, port: u16) -> anyhow::Result<()> {
    let app = create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    let config = BotConfig::load(&opts.config)
        .with_context(|| format!("Cannot load config from {}", opts.config.display()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot build tokio runtime")?;

    let (client, bot_user) = runtime.block_on(async {
        let client = create_github_client(opts.token, &opts.api_url)?;
        let bot_user = load_bot_user(&client).await?;
        anyhow::Ok((client, bot_user))
    })?;
    tracing::info!("Running as {}", bot_user.username);

    let ctx = BotContext::new(
        GithubClient::new(client.clone(), bot_user),
        Box::new(CollaboratorPermissionResolver::new(client)),
        config,
    );
    let (tx, bot_process) = create_bot_process(Arc::new(ctx));

    let state = ServerState::new(tx, WebhookSecret::new(opts.webhook_secret));
    let server_process = server(state, opts.port);

    runtime.block_on(async move {
        tokio::select! {
            () = bot_process => {
                tracing::warn!("Bot process has ended");
                Ok(())
            },
            res = server_process => {
                tracing::warn!("Server has ended: {res:?}");
                res
            }
        }
    })?;

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    if let Err(error) = try_main(opts) {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
