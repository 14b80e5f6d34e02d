use std::sync::Arc;

use otstatus_widgets::config::status_base_url;
use otstatus_widgets::{
    Document, OnlinePlayers, Page, ServerInfoPanel, SidebarStatus, StatusFetcher, WidgetRenderer,
};
use reqwest::Url;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let base_url = status_base_url();
    let base_url = match Url::parse(&base_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, %base_url, "STATUS_BASE_URL is not a valid URL");
            return;
        }
    };
    let fetcher = match StatusFetcher::from_config() {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!(error = %e, "failed to build status HTTP client");
            return;
        }
    };

    let document = Document::new();
    document.insert(ServerInfoPanel.template(ServerInfoPanel.default_element_id()));
    document.insert(SidebarStatus.template(SidebarStatus.default_element_id()));
    document.insert(OnlinePlayers.template(OnlinePlayers.default_element_id()));

    let page = Page::new(document, Arc::new(fetcher), base_url);

    // Subscribed before any widget mounts, so it sees the provider's first cycle.
    page.channel().subscribe(|event| {
        tracing::info!(
            seq = event.seq,
            online = event.payload.online,
            players = event.payload.players.online,
            peak = event.payload.players.peak,
            uptime_sec = event.payload.server.uptime_sec,
            "status published"
        );
    });

    let widgets: Vec<_> = [
        page.mount(ServerInfoPanel),
        page.mount(SidebarStatus),
        page.mount(OnlinePlayers),
    ]
    .into_iter()
    .flatten()
    .collect();

    shutdown_signal().await;

    for widget in widgets {
        widget.unmount(&page);
    }
    tracing::info!("Status page closed");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
