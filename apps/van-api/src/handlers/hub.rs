//! 实时推送通道
//!
//! - GET /hubs/telemetry（WebSocket）
//!
//! 客户端发送 `{"action":"subscribe","channel":"tanks"}` 加入频道，
//! `unsubscribe` 退出；每条指令回复一个 `HubReply`。
//! 服务端推送 `{"channel","event","payload"}`，仅限已加入的频道。

use crate::AppState;
use api_contract::{HubAction, HubCommand, HubReply};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tracing::{debug, info, warn};
use van_realtime::{HubChannel, Subscription};

pub async fn telemetry_hub(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let subscription = state.hub.subscribe();
    ws.on_upgrade(move |socket| serve_socket(socket, subscription))
}

async fn serve_socket(mut socket: WebSocket, mut subscription: Subscription) {
    info!(target: "van.realtime", "hub_client_connected");
    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = apply_command(&mut subscription, &text);
                    if !send_json(&mut socket, &reply).await {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(target: "van.realtime", "hub socket error: {}", err);
                    break;
                }
            },
            outgoing = subscription.recv() => match outgoing {
                Some(message) => {
                    if !send_json(&mut socket, &message).await {
                        break;
                    }
                }
                None => break,
            },
        }
    }
    info!(target: "van.realtime", "hub_client_disconnected");
}

/// 解析并执行一条客户端指令。
pub fn apply_command(subscription: &mut Subscription, text: &str) -> HubReply {
    let command: HubCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(err) => {
            return HubReply {
                ok: false,
                action: String::new(),
                channel: String::new(),
                error: Some(format!("invalid command: {err}")),
            };
        }
    };
    let action = match command.action {
        HubAction::Subscribe => "subscribe",
        HubAction::Unsubscribe => "unsubscribe",
    };
    let channel = match command.channel.parse::<HubChannel>() {
        Ok(channel) => channel,
        Err(err) => {
            return HubReply {
                ok: false,
                action: action.to_string(),
                channel: command.channel,
                error: Some(err),
            };
        }
    };
    match command.action {
        HubAction::Subscribe => subscription.join(channel),
        HubAction::Unsubscribe => subscription.leave(channel),
    };
    debug!(target: "van.realtime", action = action, channel = %channel, "hub_command");
    HubReply {
        ok: true,
        action: action.to_string(),
        channel: channel.to_string(),
        error: None,
    }
}

async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> bool {
    let text = match serde_json::to_string(value) {
        Ok(text) => text,
        Err(err) => {
            warn!(target: "van.realtime", "hub message encode failed: {}", err);
            return true;
        }
    };
    socket.send(Message::Text(text)).await.is_ok()
}
