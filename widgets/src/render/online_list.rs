use std::time::Duration;

use chrono::{DateTime, Local};
use otstatus_shared::StatusPayload;

use super::{WidgetRenderer, clock_text, or_dash};
use crate::config::{ONLINE_LIST_POLL_INTERVAL_SECS, PLAYERS_PATH};
use crate::dom::Element;

const NO_PLAYERS: &str = "No players online";
const OFFLINE_ROW: &str = "—";
/// Players are online but the payload carries no names (a `/server_status/` reply).
const UNLISTED_ROW: &str = "-";

/// Who-is-online panel: status dot, summary line and the ranked player table.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlinePlayers;

impl WidgetRenderer for OnlinePlayers {
    fn kind(&self) -> &'static str {
        "online-players"
    }

    fn default_element_id(&self) -> &'static str {
        "online-panel"
    }

    fn default_endpoint(&self) -> &'static str {
        PLAYERS_PATH
    }

    fn default_interval(&self) -> Duration {
        Duration::from_secs(ONLINE_LIST_POLL_INTERVAL_SECS)
    }

    fn template(&self, id: &str) -> Element {
        Element::new(id)
            .with_slot(".js-summary")
            .with_slot(".js-updated")
            .with_table(".js-rows")
    }

    fn render(&self, root: &mut Element, payload: &StatusPayload, now: DateTime<Local>) {
        root.set_class("on", payload.online);
        root.set_class("off", !payload.online);

        if !payload.online {
            root.set_text(".js-summary", "Server offline");
            root.set_rows(".js-rows", vec![vec![OFFLINE_ROW.to_string()]]);
            root.set_text(".js-updated", format!("Updated {}", clock_text(now)));
            return;
        }

        root.set_text(
            ".js-summary",
            format!(
                "Online: {}  Record: {}",
                payload.players.online, payload.players.peak
            ),
        );

        let rows = if payload.list.is_empty() && payload.players.online == 0 {
            vec![vec![NO_PLAYERS.to_string()]]
        } else if payload.list.is_empty() {
            vec![vec![UNLISTED_ROW.to_string()]]
        } else {
            payload
                .list
                .iter()
                .enumerate()
                .map(|(idx, player)| {
                    vec![
                        (idx + 1).to_string(),
                        or_dash(&player.name).to_string(),
                        player.level.to_string(),
                    ]
                })
                .collect()
        };
        root.set_rows(".js-rows", rows);
        root.set_text(".js-updated", format!("Updated {}", clock_text(now)));
    }
}
