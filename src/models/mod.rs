//! 数据模型定义
//!
//! 按资源划分的业务实体、请求与响应结构，以及统一的 API 错误码。

pub mod classes;
pub mod common;
pub mod dashboard;
pub mod enrollments;
pub mod subjects;
pub mod users;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

use serde::{Deserialize, Serialize};

/// API 业务错误码
///
/// 0 为成功；1xxx 通用错误；2xxx 用户；3xxx 课程；4xxx 班级；5xxx 选课。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    RateLimitExceeded = 1029,

    // 用户
    UserNotFound = 2000,
    UserAlreadyExists = 2001,
    UserNameInvalid = 2002,
    UserEmailInvalid = 2003,
    UserEmailAlreadyExists = 2004,
    UserCreationFailed = 2005,
    UserUpdateFailed = 2006,
    UserDeleteFailed = 2007,
    CanNotDeleteCurrentUser = 2008,

    // 课程
    SubjectNotFound = 3000,
    SubjectAlreadyExists = 3001,
    SubjectInvalid = 3002,
    SubjectInUse = 3003,

    // 班级
    ClassNotFound = 4000,
    ClassAlreadyExists = 4001,
    ClassCreationFailed = 4002,
    ClassUpdateFailed = 4003,
    ClassDeleteFailed = 4004,
    ClassPermissionDenied = 4005,
    ClassInvalid = 4006,
    ClassInviteCodeGenerationFailed = 4007,

    // 选课
    EnrollmentNotFound = 5000,
    ClassInviteCodeInvalid = 5001,
    ClassInviteCodeMismatch = 5002,
    ClassNotAcceptingEnrollment = 5003,
    ClassFull = 5004,
    ClassAlreadyJoined = 5005,
    ClassJoinFailed = 5006,
}
