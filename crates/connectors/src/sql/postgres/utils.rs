use crate::error::SinkError;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::{error, warn};

/// Connects honoring the `sslmode` of the connection string.
pub(crate) async fn connect_client(url: &str) -> Result<Client, SinkError> {
    let config = url
        .parse::<Config>()
        .map_err(|e| SinkError::Unavailable(format!("invalid Postgres URL: {e}")))?;

    let result = match config.get_ssl_mode() {
        SslMode::Disable => connect_plain(&config).await,
        SslMode::Prefer => match connect_tls(&config).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_plain(&config).await
            }
        },
        _ => connect_tls(&config).await,
    };

    result.map_err(|e| SinkError::Unavailable(format!("cannot connect to Postgres: {e}")))
}

async fn connect_tls(config: &Config) -> Result<Client, SinkError> {
    let connector = TlsConnector::builder()
        .build()
        .map_err(|e| SinkError::Unavailable(format!("TLS setup failed: {e}")))?;
    let (client, connection) = config.connect(MakeTlsConnector::new(connector)).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

async fn connect_plain(config: &Config) -> Result<Client, SinkError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}
