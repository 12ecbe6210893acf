use crate::{HubChannel, HubMessage};
use serde::Serialize;
use std::collections::BTreeSet;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// 遥测推送中心。克隆后共享同一发送端。
#[derive(Clone)]
pub struct TelemetryHub {
    sender: broadcast::Sender<HubMessage>,
}

impl TelemetryHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 发布消息，返回收到消息的订阅者数量。无订阅者不是错误。
    pub fn publish<P: Serialize>(&self, channel: HubChannel, event: &str, payload: &P) -> usize {
        let payload = match serde_json::to_value(payload) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target: "van.realtime", channel = %channel, event = %event, "payload encode failed: {}", err);
                return 0;
            }
        };
        van_telemetry::record_hub_message();
        let receivers = self
            .sender
            .send(HubMessage {
                channel,
                event: event.to_string(),
                payload,
            })
            .unwrap_or(0);
        debug!(target: "van.realtime", channel = %channel, event = %event, receivers = receivers, "hub_published");
        receivers
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            channels: BTreeSet::new(),
        }
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256)
    }
}

/// 单个订阅者：只接收已加入频道的消息。
pub struct Subscription {
    receiver: broadcast::Receiver<HubMessage>,
    channels: BTreeSet<HubChannel>,
}

impl Subscription {
    /// 加入频道，返回此前是否未加入。
    pub fn join(&mut self, channel: HubChannel) -> bool {
        self.channels.insert(channel)
    }

    pub fn leave(&mut self, channel: HubChannel) -> bool {
        self.channels.remove(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = HubChannel> + '_ {
        self.channels.iter().copied()
    }

    /// 等待下一条已加入频道的消息。发布端全部关闭时返回 `None`。
    pub async fn recv(&mut self) -> Option<HubMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if self.channels.contains(&message.channel) => return Some(message),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "van.realtime", skipped = skipped, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
