//! Page-side status synchronization for the server status widgets.
//!
//! Every widget mounted on a [`Page`] takes part in a one-shot election. The winner starts
//! the page's only [`StatusPoller`]; every widget, the winner included, renders whatever
//! the poller publishes on the page's [`BroadcastChannel`].

pub mod channel;
pub mod config;
pub mod dom;
pub mod election;
pub mod fetcher;
pub mod page;
pub mod poller;
pub mod render;

#[cfg(test)]
mod testing;

pub use channel::{BroadcastChannel, SubscriptionToken};
pub use dom::{Document, Element};
pub use election::ElectionFlag;
pub use fetcher::{FetchError, StatusFetcher, StatusSource};
pub use page::{MountedWidget, Page, WidgetConfig, WidgetRole};
pub use poller::StatusPoller;
pub use render::{OnlinePlayers, ServerInfoPanel, SidebarStatus, WidgetRenderer};
