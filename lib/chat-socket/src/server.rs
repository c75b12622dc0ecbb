use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use stoa_campus::data_access::DataAccess;
use stoa_messenger::data_access::MessageStore;
use stoa_messenger::messenger::Messenger;
use stoa_utils::utils::log_internal_error;

use crate::session;

/// Accepts chat connections until cancelled, one session task per socket.
pub async fn run_chat_socket<S>(
    addr: &str,
    messenger: Messenger<S>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()>
where
    S: DataAccess + MessageStore,
{
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Started chat socket at {addr}");

    loop {
        let (stream, _) = tokio::select! {
            _ = cancellation_token.cancelled() => {
                tracing::info!("Shutting down chat socket...");
                break;
            },
            res = listener.accept() => match res {
                Ok(res) => res,
                Err(e) => {
                    log_internal_error(e);
                    continue;
                },
            }
        };

        let messenger = messenger.clone();

        tokio::spawn(async move {
            if let Err(e) = session::handle_connection(messenger, stream).await {
                log_internal_error(e);
            }
        });
    }
    tracing::info!("Shutting down chat socket...Success");
    Ok(())
}
