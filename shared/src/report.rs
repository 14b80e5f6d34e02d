use serde::{Deserialize, Serialize};

use crate::status::{MapInfo, OnlinePlayer, PlayerCounts, Rates};

/// Body of `GET /server_status/`, decoded from the game server's TSQP "info" block.
///
/// An unreachable server is reported as `{"online": false, "error": "..."}` with every
/// other block omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusReport {
    pub online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<PlayerCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monsters: Option<TotalBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npcs: Option<TotalBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<Rates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerBlock {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub uptime_sec: u64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub software: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub client: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnerBlock {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TotalBlock {
    #[serde(default)]
    pub total: u32,
}

impl StatusReport {
    pub fn offline(error: impl Into<String>) -> Self {
        Self {
            online: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Body of `GET /server_players/`, decoded from the binary player-list status request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayersReport {
    pub online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub players: PlayerCounts,
    #[serde(default)]
    pub list: Vec<OnlinePlayer>,
}

impl PlayersReport {
    pub fn offline(error: impl Into<String>) -> Self {
        Self {
            online: false,
            error: Some(error.into()),
            players: PlayerCounts::default(),
            list: Vec::new(),
        }
    }
}
