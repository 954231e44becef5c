//! 邀请码加入班级的准入检查
//!
//! 检查按固定顺序短路执行：
//!
//! 1. 规范化邀请码，长度不是 6 位时拒绝
//! 2. 没有学生身份时拒绝
//! 3. 邀请码与班级不一致时拒绝
//! 4. 班级不是 active 状态时拒绝
//! 5. 有人数上限且已满时拒绝
//!
//! 3 之后的判断基于调用方读到的班级快照，真正写入时存储层会在事务内再检查一次。

use std::fmt;

use actix_web::http::StatusCode;
use tracing::{error, info};

use crate::errors::ClassroomError;
use crate::models::ErrorCode;
use crate::models::classes::entities::ClassOffering;
use crate::models::enrollments::entities::{Enrollment, EnrollmentOutcome};
use crate::storage::Storage;
use crate::utils::invite_code;

#[derive(Debug, Clone)]
pub enum AdmissionError {
    InvalidCodeFormat,
    UnauthenticatedActor,
    CodeMismatch,
    ClassNotAcceptingEnrollment,
    ClassFull,
    AlreadyEnrolled,
    PersistenceError(ClassroomError),
}

impl AdmissionError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AdmissionError::InvalidCodeFormat => ErrorCode::ClassInviteCodeInvalid,
            AdmissionError::UnauthenticatedActor => ErrorCode::Unauthorized,
            AdmissionError::CodeMismatch => ErrorCode::ClassInviteCodeMismatch,
            AdmissionError::ClassNotAcceptingEnrollment => ErrorCode::ClassNotAcceptingEnrollment,
            AdmissionError::ClassFull => ErrorCode::ClassFull,
            AdmissionError::AlreadyEnrolled => ErrorCode::ClassAlreadyJoined,
            AdmissionError::PersistenceError(ClassroomError::NotFound(_)) => {
                ErrorCode::ClassNotFound
            }
            AdmissionError::PersistenceError(_) => ErrorCode::ClassJoinFailed,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionError::InvalidCodeFormat | AdmissionError::CodeMismatch => {
                StatusCode::BAD_REQUEST
            }
            AdmissionError::UnauthenticatedActor => StatusCode::UNAUTHORIZED,
            AdmissionError::ClassNotAcceptingEnrollment
            | AdmissionError::ClassFull
            | AdmissionError::AlreadyEnrolled => StatusCode::CONFLICT,
            AdmissionError::PersistenceError(ClassroomError::NotFound(_)) => StatusCode::NOT_FOUND,
            AdmissionError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// 面向用户的提示，不包含存储层细节
impl fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AdmissionError::InvalidCodeFormat => "Invite code must be 6 letters or digits",
            AdmissionError::UnauthenticatedActor => "You must be signed in to join a class",
            AdmissionError::CodeMismatch => "Invite code does not match this class",
            AdmissionError::ClassNotAcceptingEnrollment => {
                "This class is not accepting new students"
            }
            AdmissionError::ClassFull => "This class is full",
            AdmissionError::AlreadyEnrolled => "You have already joined this class",
            AdmissionError::PersistenceError(ClassroomError::NotFound(_)) => "Class not found",
            AdmissionError::PersistenceError(_) => "Failed to join class, please try again later",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for AdmissionError {}

/// 通过检查后要写入的选课记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub class_id: i64,
    pub student_id: i64,
}

/// 班级当前是否开放加入
pub fn can_join(class: &ClassOffering) -> bool {
    class.is_accepting_enrollment() && class.has_room()
}

/// 只做检查，不访问存储
pub fn check_admission(
    raw_code: &str,
    class: &ClassOffering,
    student_id: Option<i64>,
) -> Result<Admission, AdmissionError> {
    let code = invite_code::normalize(raw_code);
    if !invite_code::is_well_formed(&code) {
        return Err(AdmissionError::InvalidCodeFormat);
    }

    let student_id = student_id.ok_or(AdmissionError::UnauthenticatedActor)?;

    if code != class.invite_code {
        return Err(AdmissionError::CodeMismatch);
    }
    if !class.is_accepting_enrollment() {
        return Err(AdmissionError::ClassNotAcceptingEnrollment);
    }
    if !class.has_room() {
        return Err(AdmissionError::ClassFull);
    }

    Ok(Admission {
        class_id: class.id,
        student_id,
    })
}

/// 检查通过后写入选课记录，失败不重试
pub async fn admit(
    storage: &dyn Storage,
    raw_code: &str,
    class: &ClassOffering,
    student_id: Option<i64>,
) -> Result<Enrollment, AdmissionError> {
    let admission = check_admission(raw_code, class, student_id)?;

    let outcome = storage
        .create_enrollment(admission.class_id, admission.student_id)
        .await
        .map_err(|e| {
            error!("Failed to create enrollment: {}", e);
            AdmissionError::PersistenceError(e)
        })?;

    match outcome {
        EnrollmentOutcome::Created(enrollment) => {
            info!(
                "Student {} joined class {}",
                admission.student_id, admission.class_id
            );
            Ok(enrollment)
        }
        EnrollmentOutcome::ClassInactive => Err(AdmissionError::ClassNotAcceptingEnrollment),
        EnrollmentOutcome::ClassFull => Err(AdmissionError::ClassFull),
        EnrollmentOutcome::AlreadyEnrolled => Err(AdmissionError::AlreadyEnrolled),
        EnrollmentOutcome::ClassNotFound => Err(AdmissionError::PersistenceError(
            ClassroomError::not_found(format!("Class {} no longer exists", admission.class_id)),
        )),
    }
}
