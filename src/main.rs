use anyhow::Result;
use fleetwatch::config::{AppConfig, StreamSource};
use fleetwatch::directory::{DirectoryClient, DirectoryView};
use fleetwatch::feed::MetricsFeed;
use fleetwatch::transport::{SimulatedTransport, StreamTransport, WebSocketTransport};
use fleetwatch::*;
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = AppConfig::load()?;
    tracing::info!("{} {} starting", version::NAME, version::VERSION);

    if app_config.mock_server.enabled {
        let mock = &app_config.mock_server;
        let state = mock::server::MockState::new(mock::default_fleet(), mock.push_interval_ms);
        let addr = format!("{}:{}", mock.host, mock.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Mock backend listening on http://{}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, mock::server::app(state)).await {
                tracing::error!(error = %e, "mock backend stopped");
            }
        });
    }

    let base = app_config.base_url()?;
    let directory = DirectoryClient::new(&base, app_config.client.fetch_timeout_ms)?;
    tracing::info!(url = %directory.url(), "Loading server directory");
    let mut directory_view = DirectoryView::default();
    directory.refresh(&mut directory_view).await;
    print!("{}", presentation::render_directory(&directory_view));

    let close_wait = Duration::from_millis(app_config.stream.close_timeout_ms);
    match app_config.stream.source {
        StreamSource::Websocket => {
            let url = endpoints::metrics_stream_url(&base)?;
            let transport = WebSocketTransport::new(url, app_config.stream.close_timeout_ms);
            run_feed(MetricsFeed::new(transport), close_wait).await
        }
        StreamSource::Simulated => {
            let transport = SimulatedTransport::new(
                mock::default_fleet(),
                app_config.stream.simulated_interval_ms,
            );
            run_feed(MetricsFeed::new(transport), close_wait).await
        }
    }
}

/// Prints the dashboard on every update until Ctrl-C / SIGTERM or the stream drops.
async fn run_feed<T: StreamTransport>(feed: MetricsFeed<T>, close_wait: Duration) -> Result<()> {
    let mut updates = feed.subscribe();
    feed.connect();

    let shutdown = async {
        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().state;
                print!("{}", feed.dashboard());
                if state == stream::ConnectionState::Disconnected {
                    tracing::warn!("Metrics stream ended; reconnection is manual");
                    break;
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal");
                feed.disconnect();
                break;
            }
        }
    }

    feed.shutdown(close_wait).await;
    Ok(())
}
