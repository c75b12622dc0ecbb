use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use stoa_auth::{AuthStorage, Credentials};
use stoa_campus::campus::Campus;
use stoa_campus::data_access::DataAccess;
use stoa_messenger::data_access::MessageStore;
use stoa_messenger::messenger::Messenger;
use stoa_web::request_handler::RequestHandler;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    host: String,
    #[arg(short, long)]
    port: u32,
    #[arg(long, help="Port for live message delivery connections")]
    chat_port: u32,
    #[arg(long, id="CONNECTION URL", help="Database connection url. Format: postgresql://[user[:password]@][host][:port][/dbname][?param1=value1&...]")]
    db: Option<String>,
    #[arg(long, help="Run on an in-memory database with demo accounts")]
    mock: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let http_addr = format!("{}:{}", args.host, args.port);
    let chat_addr = format!("{}:{}", args.host, args.chat_port);

    let cancellation_token = make_cancellation_token();

    if args.mock {
        let storage = mock_db::Db::demo().await;
        run_servers(storage, &http_addr, &chat_addr, cancellation_token).await?;
    } else {
        let db_connection = args.db.context("Database connection url must be specified")?;
        let storage = postgres_db::Db::new(&db_connection).await?;
        storage.check_migrations().await?;
        let db_graceful_shutdown = storage.graceful_shutdown(cancellation_token.clone());

        run_servers(storage, &http_addr, &chat_addr, cancellation_token).await?;

        db_graceful_shutdown.await.context("Join error in thread handling database connection shutdown")?;
    }

    Ok(())
}

async fn run_servers<S>(
    storage: S,
    http_addr: &str,
    chat_addr: &str,
    cancellation_token: CancellationToken,
) -> Result<()>
where
    S: DataAccess + MessageStore + AuthStorage,
{
    let campus = Campus::new(storage.clone(), Credentials::new(storage.clone()));
    let messenger = Messenger::new(storage);
    let request_handler = RequestHandler::new(campus, messenger.clone());

    let http_server = async {
        http_server::run_server(http_addr, request_handler, cancellation_token.clone())
            .await
            .with_context(|| format!("Unable to start server at {}", http_addr))
    };
    let chat_socket = async {
        chat_socket::run_chat_socket(chat_addr, messenger, cancellation_token.clone())
            .await
            .with_context(|| format!("Unable to start chat socket at {}", chat_addr))
    };

    tokio::try_join!(http_server, chat_socket)?;
    Ok(())
}

fn make_cancellation_token() -> CancellationToken {
    let cancellation_token = CancellationToken::new();

    let cloned_token = cancellation_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
            },
            Err(err) => {
                tracing::error!("Unable to listen for shutdown signal: {}", err);
            },
        };
        cloned_token.cancel();
    });

    cancellation_token
}
