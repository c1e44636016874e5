use crate::error::{AppError, AppResult};

/// 手机号最少位数（仅数字）
pub const MIN_PHONE_DIGITS: usize = 7;

/// 只保留数字
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 规范化并校验手机号
pub fn normalize_and_validate_phone(phone: &str) -> AppResult<String> {
    let digits = normalize_phone(phone);
    if digits.len() < MIN_PHONE_DIGITS {
        return Err(AppError::ValidationError(
            "Phone number looks invalid".to_string(),
        ));
    }
    Ok(digits)
}
