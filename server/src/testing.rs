use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use otstatus_shared::{
    OnlinePlayer, PlayerCounts, PlayersReport, ServerBlock, StatusReport,
};

use crate::services::status_protocol::{QueryFuture, StatusBackend, StatusQueryError};
use crate::state::AppState;

/// Backend that answers every query with the same reply, or fails when `reachable` is
/// false.
pub(crate) struct FixedBackend {
    pub(crate) reachable: bool,
    info_calls: AtomicUsize,
    players_calls: AtomicUsize,
}

impl FixedBackend {
    pub(crate) fn online() -> Self {
        Self {
            reachable: true,
            info_calls: AtomicUsize::new(0),
            players_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::online()
        }
    }

    pub(crate) fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn players_calls(&self) -> usize {
        self.players_calls.load(Ordering::SeqCst)
    }
}

impl StatusBackend for FixedBackend {
    fn query_info(&self) -> QueryFuture<'_, StatusReport> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        let reply = if self.reachable {
            Ok(StatusReport {
                online: true,
                server: Some(ServerBlock {
                    name: "Forgotten".to_string(),
                    uptime_sec: 3661,
                    ..ServerBlock::default()
                }),
                players: Some(PlayerCounts {
                    online: 5,
                    peak: 12,
                    max: 100,
                }),
                motd: Some("Welcome".to_string()),
                ..StatusReport::default()
            })
        } else {
            Err(StatusQueryError::EmptyResponse)
        };
        Box::pin(async move { reply })
    }

    fn query_players(&self) -> QueryFuture<'_, PlayersReport> {
        self.players_calls.fetch_add(1, Ordering::SeqCst);
        let reply = if self.reachable {
            Ok(PlayersReport {
                online: true,
                error: None,
                players: PlayerCounts {
                    online: 1,
                    peak: 12,
                    max: 100,
                },
                list: vec![OnlinePlayer {
                    name: "Alice".to_string(),
                    level: 120,
                }],
            })
        } else {
            Err(StatusQueryError::NoLengthHeader)
        };
        Box::pin(async move { reply })
    }
}

pub(crate) async fn spawn_test_server(
    backend: Arc<FixedBackend>,
) -> (SocketAddr, AppState, tokio::task::JoinHandle<()>) {
    let state = AppState::with_min_interval(backend, std::time::Duration::from_secs(15));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let app = crate::app::build_app(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });
    (addr, state, handle)
}
