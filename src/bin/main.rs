use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use auth_gateway::{
    DatabaseConfig, DisabledCodeVerifier, DisabledFederatedVerifier, EphemeralKeyProvider,
    FileKeyProvider, KeyProvider, SurrealUserStore, TokenConfig, TokenValidator,
    create_connection, ensure_schema, generate_private_key_pem,
};
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "auth-gateway")]
#[command(about = "Identity and bearer-token issuance service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP authentication service
    Serve {
        /// Bind address, e.g. 0.0.0.0:8080
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[arg(long, default_value = "memory", env = "AUTH_GATEWAY_DB_URL")]
        db_url: String,
        /// Issuer stamped into and expected from tokens
        #[arg(long, default_value = "auth-gateway", env = "AUTH_GATEWAY_ISSUER")]
        issuer: String,
        /// Audience stamped into and expected from tokens
        #[arg(
            long,
            default_value = "auth-gateway-clients",
            env = "AUTH_GATEWAY_AUDIENCE"
        )]
        audience: String,
        /// Token lifetime in seconds
        #[arg(long, default_value_t = 3600, env = "AUTH_GATEWAY_TOKEN_TTL_SECS")]
        token_ttl_secs: u64,
        /// Path to a PEM-encoded RSA private key; omit for a fresh in-memory pair
        #[arg(long, env = "AUTH_GATEWAY_KEY_FILE")]
        key_file: Option<PathBuf>,
    },
    /// Generate a new RSA private key PEM
    GenerateKey {
        /// Output path for the private key
        out: PathBuf,
        #[arg(long, default_value_t = 2048)]
        bits: usize,
    },
    /// Validate a token offline against a key file
    Validate {
        token: String,
        #[arg(long)]
        key_file: PathBuf,
        #[arg(long, default_value = "auth-gateway")]
        issuer: String,
        #[arg(long, default_value = "auth-gateway-clients")]
        audience: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("auth_gateway=info".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            db_url,
            issuer,
            audience,
            token_ttl_secs,
            key_file,
        } => {
            let keys: Arc<dyn KeyProvider> = match key_file {
                Some(path) => {
                    info!("loading signing key from {}", path.display());
                    Arc::new(FileKeyProvider::new(path)?)
                }
                None => {
                    warn!(
                        "no key file configured; using an in-memory key pair \
                         (issued tokens do not survive a restart)"
                    );
                    Arc::new(EphemeralKeyProvider::new()?)
                }
            };

            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            info!("using database url: {}", db_config.url);
            let db = create_connection(db_config).await?;
            ensure_schema(&db).await?;
            let store = Arc::new(SurrealUserStore::new(db));

            let config = TokenConfig {
                issuer,
                audience,
                ttl_seconds: token_ttl_secs,
            };

            let app = auth_gateway::create_service(
                keys,
                store,
                Arc::new(DisabledFederatedVerifier),
                Arc::new(DisabledCodeVerifier),
                config,
            );

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("auth service listening on http://{}", bind);
            axum::serve(listener, app).await?;
        }
        Commands::GenerateKey { out, bits } => {
            let pem = generate_private_key_pem(bits)?;
            std::fs::write(&out, pem)?;

            println!("Private key written to {}", out.display());
            println!();
            println!("Keep this file secret. The matching public key is served at /public-key.");
        }
        Commands::Validate {
            token,
            key_file,
            issuer,
            audience,
        } => {
            let keys: Arc<dyn KeyProvider> = Arc::new(FileKeyProvider::new(key_file)?);
            let validator = TokenValidator::new(keys, TokenConfig::new(issuer, audience));

            match validator.validate(&token) {
                Ok(claims) => {
                    let expires = chrono::DateTime::from_timestamp(claims.exp, 0)
                        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_else(|| claims.exp.to_string());

                    println!("Token is valid.");
                    println!("  Subject:  {}", claims.sub);
                    println!("  Token id: {}", claims.jti);
                    println!("  Expires:  {}", expires);
                }
                Err(e) => {
                    println!("Token rejected: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
