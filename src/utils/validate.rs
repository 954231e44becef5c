use chrono::{NaiveTime, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::classes::entities::ClassSchedule;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}$").expect("Invalid email regex")
});

static SUBJECT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid subject code regex"));

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

pub fn validate_user_name(name: &str) -> Result<(), &'static str> {
    // 姓名长度：2 <= x <= 50
    let len = char_len(name);
    if !(2..=50).contains(&len) {
        return Err("Name length must be between 2 and 50 characters");
    }
    Ok(())
}

pub fn validate_class_name(name: &str) -> Result<(), &'static str> {
    let len = char_len(name);
    if len < 2 {
        return Err("Class name must be at least 2 characters");
    }
    if len > 50 {
        return Err("Class name must be at most 50 characters");
    }
    Ok(())
}

pub fn validate_subject_name(name: &str) -> Result<(), &'static str> {
    if char_len(name) < 3 {
        return Err("Subject name must be at least 3 characters");
    }
    Ok(())
}

pub fn validate_subject_code(code: &str) -> Result<(), &'static str> {
    if char_len(code) < 5 {
        return Err("Subject code must be at least 5 characters");
    }
    if !SUBJECT_CODE_RE.is_match(code.trim()) {
        return Err("Subject code must contain only letters, numbers, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_subject_description(description: &str) -> Result<(), &'static str> {
    if char_len(description) < 5 {
        return Err("Subject description must be at least 5 characters");
    }
    Ok(())
}

pub fn validate_department(department: &str) -> Result<(), &'static str> {
    if char_len(department) < 2 {
        return Err("Department must be at least 2 characters");
    }
    Ok(())
}

/// 校验上课时间：星期可解析，时间为 HH:MM，且结束晚于开始
pub fn validate_schedules(schedules: &[ClassSchedule]) -> Result<(), String> {
    for (index, schedule) in schedules.iter().enumerate() {
        schedule
            .day
            .parse::<Weekday>()
            .map_err(|_| format!("Schedule #{}: invalid day '{}'", index + 1, schedule.day))?;

        let start = NaiveTime::parse_from_str(&schedule.start_time, "%H:%M").map_err(|_| {
            format!(
                "Schedule #{}: start time '{}' must be HH:MM",
                index + 1,
                schedule.start_time
            )
        })?;
        let end = NaiveTime::parse_from_str(&schedule.end_time, "%H:%M").map_err(|_| {
            format!(
                "Schedule #{}: end time '{}' must be HH:MM",
                index + 1,
                schedule.end_time
            )
        })?;

        if end <= start {
            return Err(format!(
                "Schedule #{}: end time must be after start time",
                index + 1
            ));
        }
    }
    Ok(())
}
