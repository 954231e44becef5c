use rand::Rng;

/// 邀请码长度（规范化之后）
pub const INVITE_CODE_LEN: usize = 6;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// 生成班级邀请码：3 位大写字母 + 3 位数字，如 `QWE482`
///
/// 不做重复检查，需要唯一时由调用方处理。
pub fn generate() -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(INVITE_CODE_LEN);
    for _ in 0..3 {
        code.push(LETTERS[rng.random_range(0..LETTERS.len())] as char);
    }
    for _ in 0..3 {
        code.push(DIGITS[rng.random_range(0..DIGITS.len())] as char);
    }
    code
}

/// 规范化用户输入的邀请码：去掉所有非 ASCII 字母数字字符并转为大写
///
/// 不会失败，输入不足时可能返回少于 6 位的结果。
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// 规范化后的邀请码长度是否合法
pub fn is_well_formed(normalized: &str) -> bool {
    normalized.len() == INVITE_CODE_LEN
}
