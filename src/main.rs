//! Gateway authorizer entry point.
//!
//! Reads one gateway invocation event as JSON from stdin, runs the
//! authorizer against it, and writes the decision as JSON to stdout. Any
//! denial is reported as the opaque `Unauthorized` signal on stderr with a
//! non-zero exit code, matching the gateway authorizer contract.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::info;

use gateway_authorizer::{Authorizer, AuthorizerConfig, AuthorizerEvent, IntegrationMode};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "gateway-authorizer")]
#[command(about = "Cookie-based JWT authorizer for API gateway invocations")]
struct Args {
    /// Identity-provider region
    #[arg(long, env = "COGNITO_REGION")]
    region: Option<String>,

    /// Cognito user-pool identifier
    #[arg(long, env = "COGNITO_USER_POOL_ID")]
    user_pool_id: Option<String>,

    /// Application client identifier (expected aud claim)
    #[arg(long, env = "COGNITO_APP_CLIENT_ID")]
    app_client_id: Option<String>,

    /// Gateway integration mode (http-api or rest-api)
    #[arg(long, default_value = "http-api", env = "GATEWAY_INTEGRATION")]
    integration: IntegrationMode,

    /// JWKS cache refresh interval in seconds
    #[arg(long, default_value_t = 3600, env = "JWKS_REFRESH_SECS")]
    jwks_refresh_secs: u64,

    /// Hard staleness bound for serving a cached key set, in seconds
    #[arg(long, default_value_t = 86_400, env = "JWKS_MAX_STALE_SECS")]
    jwks_max_stale_secs: u64,

    /// Clock skew tolerance in seconds for exp validation
    #[arg(long, default_value_t = 30, env = "CLOCK_SKEW_SECS")]
    clock_skew_secs: u64,

    /// Per-call deadline in milliseconds
    #[arg(long, default_value_t = 5_000, env = "AUTHORIZER_DEADLINE_MS")]
    deadline_ms: u64,

    /// Explicit JWKS endpoint, overriding the derived well-known URL
    #[arg(long, env = "JWKS_ENDPOINT")]
    jwks_endpoint: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, env = "AUTH_VERBOSE")]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<AuthorizerConfig> {
        let region = self.region.context("COGNITO_REGION is required")?;
        let user_pool_id = self
            .user_pool_id
            .context("COGNITO_USER_POOL_ID is required")?;
        let app_client_id = self
            .app_client_id
            .context("COGNITO_APP_CLIENT_ID is required")?;

        let mut config = AuthorizerConfig::new(region, user_pool_id, app_client_id);
        config.integration = self.integration;
        config.jwks_refresh_secs = self.jwks_refresh_secs;
        config.jwks_max_stale_secs = self.jwks_max_stale_secs;
        config.clock_skew_secs = self.clock_skew_secs;
        config.deadline_ms = self.deadline_ms;
        config.jwks_endpoint = self.jwks_endpoint;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level))
        .json()
        .init();

    let config = args.into_config()?;

    info!(
        region = %config.region,
        user_pool_id = %config.user_pool_id,
        integration = %config.integration,
        "configuration loaded"
    );

    let authorizer = Authorizer::new(config).context("failed to build authorizer")?;

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("failed to read gateway event from stdin")?;

    let event: AuthorizerEvent =
        serde_json::from_str(&input).context("failed to parse gateway event")?;

    match authorizer.handle(&event).await {
        Ok(decision) => {
            println!("{}", serde_json::to_string(&decision)?);
            Ok(())
        }
        Err(unauthorized) => {
            eprintln!("{unauthorized}");
            std::process::exit(1);
        }
    }
}
