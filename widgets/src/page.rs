use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use otstatus_shared::StatusEvent;
use reqwest::Url;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::channel::{BroadcastChannel, SubscriptionToken};
use crate::config::{DATA_ENDPOINT, DATA_INTERVAL_MS};
use crate::dom::{Document, Element, SharedElement, lock};
use crate::election::ElectionFlag;
use crate::fetcher::StatusSource;
use crate::poller::StatusPoller;
use crate::render::WidgetRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetRole {
    /// Won the election: owns the page's poller and renders from the channel like everyone else.
    Provider,
    /// Renders whatever the provider publishes.
    Subscriber,
}

/// Endpoint and cadence read from a widget's hosting element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub endpoint: String,
    pub interval: Duration,
}

impl WidgetConfig {
    pub fn read(root: &Element, renderer: &dyn WidgetRenderer, base_url: &Url) -> Self {
        let raw_endpoint = root
            .data(DATA_ENDPOINT)
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .unwrap_or(renderer.default_endpoint());
        let endpoint = match base_url.join(raw_endpoint) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(
                    error = %e,
                    endpoint = raw_endpoint,
                    widget = renderer.kind(),
                    "widget endpoint does not resolve against the page base URL"
                );
                raw_endpoint.to_string()
            }
        };

        let interval = root
            .data(DATA_INTERVAL_MS)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|value| *value > 0)
            .map(Duration::from_millis)
            .unwrap_or_else(|| renderer.default_interval());

        Self { endpoint, interval }
    }
}

/// A widget attached to a page.
#[derive(Debug)]
pub struct MountedWidget {
    pub kind: &'static str,
    pub element_id: String,
    pub role: WidgetRole,
    pub config: WidgetConfig,
    token: SubscriptionToken,
    poller: Option<JoinHandle<()>>,
}

impl MountedWidget {
    pub fn is_provider(&self) -> bool {
        self.role == WidgetRole::Provider
    }

    /// Stop rendering into this widget. A provider's poller keeps running: leadership is
    /// never handed off while the page lives.
    pub fn unmount(self, page: &Page) {
        page.channel.unsubscribe(self.token);
        if self.poller.is_some() {
            debug!(widget = self.kind, "provider unmounted; poller keeps serving the page");
        }
    }
}

/// Per-page coordination: one election, one channel, one status source, many widgets.
#[derive(Clone)]
pub struct Page {
    document: Document,
    election: ElectionFlag,
    channel: BroadcastChannel,
    source: Arc<dyn StatusSource>,
    base_url: Url,
}

impl Page {
    pub fn new(document: Document, source: Arc<dyn StatusSource>, base_url: Url) -> Self {
        Self::with_coordination(
            document,
            source,
            base_url,
            ElectionFlag::new(),
            BroadcastChannel::new(),
        )
    }

    pub fn with_coordination(
        document: Document,
        source: Arc<dyn StatusSource>,
        base_url: Url,
        election: ElectionFlag,
        channel: BroadcastChannel,
    ) -> Self {
        Self {
            document,
            election,
            channel,
            source,
            base_url,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn election(&self) -> &ElectionFlag {
        &self.election
    }

    pub fn channel(&self) -> &BroadcastChannel {
        &self.channel
    }

    pub fn mount<R: WidgetRenderer>(&self, renderer: R) -> Option<MountedWidget> {
        let element_id = renderer.default_element_id();
        self.mount_at(renderer, element_id)
    }

    /// Attach `renderer` to the element `element_id`.
    ///
    /// Returns `None` when the element is not on the page. The election is decided here,
    /// synchronously, before anything is spawned; the winner starts the page's poller on
    /// the current Tokio runtime. Outside a runtime the winner keeps the provider role
    /// but nothing polls, and an error is logged.
    pub fn mount_at<R: WidgetRenderer>(
        &self,
        renderer: R,
        element_id: &str,
    ) -> Option<MountedWidget> {
        let Some(root) = self.document.get(element_id) else {
            debug!(widget = renderer.kind(), element_id, "widget root not on page; skipping");
            return None;
        };

        let config = WidgetConfig::read(&lock(&root), &renderer, &self.base_url);
        let role = if self.election.try_become_provider() {
            WidgetRole::Provider
        } else {
            WidgetRole::Subscriber
        };
        let kind = renderer.kind();

        let view = WidgetView {
            renderer: Arc::new(renderer),
            root,
            last_seq: Arc::new(Mutex::new(None)),
        };
        let token = self.channel.subscribe(move |event| view.apply(event));

        let poller = if role == WidgetRole::Provider {
            match tokio::runtime::Handle::try_current() {
                Ok(_) => Some(
                    StatusPoller::new(Arc::clone(&self.source), self.channel.clone())
                        .start(config.endpoint.clone(), config.interval),
                ),
                Err(e) => {
                    error!(
                        error = %e,
                        widget = kind,
                        element_id,
                        "no Tokio runtime; provider cannot start polling"
                    );
                    None
                }
            }
        } else {
            None
        };

        info!(
            widget = kind,
            element_id,
            role = ?role,
            endpoint = %config.endpoint,
            interval_ms = config.interval.as_millis() as u64,
            "widget mounted"
        );

        Some(MountedWidget {
            kind,
            element_id: element_id.to_string(),
            role,
            config,
            token,
            poller,
        })
    }
}

struct WidgetView<R> {
    renderer: Arc<R>,
    root: SharedElement,
    last_seq: Arc<Mutex<Option<u64>>>,
}

impl<R: WidgetRenderer> WidgetView<R> {
    fn apply(&self, event: &StatusEvent) {
        let mut last_seq = lock(&self.last_seq);
        if !event.is_newer_than(*last_seq) {
            debug!(
                widget = self.renderer.kind(),
                seq = event.seq,
                last_seq = ?*last_seq,
                "ignoring out-of-order status event"
            );
            return;
        }
        *last_seq = Some(event.seq);

        let mut root = lock(&self.root);
        self.renderer.render(&mut root, &event.payload, Local::now());
    }
}
