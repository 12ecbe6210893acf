//! HTTP 响应辅助函数
//!
//! 所有响应使用统一的 `ApiResponse` 格式：
//! - 成功：`success` / `created`
//! - 失败：`ServiceError` 按类型映射状态码与错误码，内部错误只在日志中保留细节

use api_contract::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use van_service::ServiceError;

/// 200 成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// 201 创建成功响应
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error(message: impl Into<String>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", message.into())),
    )
        .into_response()
}

/// 服务错误响应
pub fn service_error(err: ServiceError) -> Response {
    match err {
        ServiceError::NotFound(what) => not_found_error(format!("{what} not found")),
        ServiceError::Validation(message) => bad_request_error(message),
        ServiceError::NotReady(what) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::error(
                "SERVICE.NOT_READY",
                format!("{what} not ready"),
            )),
        )
            .into_response(),
        ServiceError::Storage(detail) => {
            error!(target: "van.api", "request failed: {}", detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(
                    "INTERNAL.ERROR",
                    "internal server error",
                )),
            )
                .into_response()
        }
    }
}

/// 把服务结果转换为 200 响应或错误响应
pub fn respond<T: Serialize>(result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(data) => success(data),
        Err(err) => service_error(err),
    }
}
