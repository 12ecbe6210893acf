use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 推送频道。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubChannel {
    Tanks,
    Controls,
    Alerts,
    Electrical,
}

impl HubChannel {
    pub const ALL: [HubChannel; 4] = [
        HubChannel::Tanks,
        HubChannel::Controls,
        HubChannel::Alerts,
        HubChannel::Electrical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HubChannel::Tanks => "tanks",
            HubChannel::Controls => "controls",
            HubChannel::Alerts => "alerts",
            HubChannel::Electrical => "electrical",
        }
    }
}

impl fmt::Display for HubChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HubChannel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        HubChannel::ALL
            .into_iter()
            .find(|channel| channel.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown channel: {value}"))
    }
}

/// 推送消息：频道 + 事件名 + 任意载荷。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    pub channel: HubChannel,
    pub event: String,
    pub payload: serde_json::Value,
}
