use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};
use van_plugin::PluginError;
use van_telemetry::{record_plugin_call_failure, record_plugin_timeout};

/// 带超时的插件调用；失败或超时记录日志后返回 `None`。
pub(crate) async fn bounded<T, F>(
    timeout: Duration,
    plugin: &str,
    operation: &'static str,
    target: &str,
    call: F,
) -> Option<T>
where
    F: Future<Output = Result<T, PluginError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            record_plugin_call_failure();
            error!(
                target: "van.service",
                plugin = %plugin,
                operation = operation,
                id = %target,
                "plugin call failed: {}",
                err
            );
            None
        }
        Err(_) => {
            record_plugin_timeout();
            let err = PluginError::Timeout(format!("{}ms", timeout.as_millis()));
            warn!(
                target: "van.service",
                plugin = %plugin,
                operation = operation,
                id = %target,
                "{}",
                err
            );
            None
        }
    }
}
