use actix_web::{HttpResponse, error::InternalError};

use crate::models::{ApiResponse, ErrorCode};

/// 解析路径中的正整数 ID
pub fn parse_positive_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}

pub fn invalid_path_param(param: &str) -> actix_web::Error {
    InternalError::from_response(
        format!("invalid path parameter: {param}"),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            format!("Invalid path parameter '{param}': expected a positive integer"),
        )),
    )
    .into()
}

/// 定义从路径参数安全提取 i64 ID 的提取器
///
/// 生成的类型既可以直接作为 handler 参数，也可以放进 `web::Path<(A, B)>` 元组中使用。
#[macro_export]
macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl actix_web::FromRequest for $name {
            type Error = actix_web::Error;
            type Future = std::future::Ready<Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                _payload: &mut actix_web::dev::Payload,
            ) -> Self::Future {
                std::future::ready(
                    req.match_info()
                        .get($param)
                        .and_then($crate::utils::extractor::parse_positive_id)
                        .map($name)
                        .ok_or_else(|| $crate::utils::extractor::invalid_path_param($param)),
                )
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                $crate::utils::extractor::parse_positive_id(&raw)
                    .map($name)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!(
                            "invalid path parameter '{}': {raw}",
                            $param
                        ))
                    })
            }
        }
    };
}

define_safe_i64_extractor!(SafeUserIdI64, "user_id");
define_safe_i64_extractor!(SafeSubjectIdI64, "subject_id");
define_safe_i64_extractor!(SafeClassIdI64, "class_id");
define_safe_i64_extractor!(SafeStudentIdI64, "student_id");
