pub mod password;
pub mod url_validator;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use xxhash_rust::xxh64::xxh64;

/// 短码长度上限，超过即拒绝（不进缓存、不查库）
pub const MAX_CODE_LEN: usize = 64;

/// splash 确认标记的有效期（秒）
const SPLASH_ACK_TTL_SECS: i64 = 300;

/// 校验短码格式：非空、长度受限、仅字母数字以及 - _
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// 签发 splash 确认标记：`{expiry}.{sig}`
///
/// 标记只用于跳过插页，不是安全边界。
pub fn issue_splash_ack(scope: &str, code: &str, seed: &str, now: DateTime<Utc>) -> String {
    let expires = now.timestamp() + SPLASH_ACK_TTL_SECS;
    let sig = ack_signature(scope, code, seed, expires);
    format!("{}.{}", expires, URL_SAFE_NO_PAD.encode(sig.to_be_bytes()))
}

/// 校验 splash 确认标记（过期或签名不符则拒绝）
pub fn verify_splash_ack(
    token: &str,
    scope: &str,
    code: &str,
    seed: &str,
    now: DateTime<Utc>,
) -> bool {
    let Some((expires_str, sig_b64)) = token.split_once('.') else {
        return false;
    };
    let Ok(expires) = expires_str.parse::<i64>() else {
        return false;
    };
    if expires <= now.timestamp() {
        return false;
    }
    let Ok(sig_bytes) = URL_SAFE_NO_PAD.decode(sig_b64) else {
        return false;
    };
    sig_bytes == ack_signature(scope, code, seed, expires).to_be_bytes()
}

fn ack_signature(scope: &str, code: &str, seed: &str, expires: i64) -> u64 {
    xxh64(format!("{}:{}:{}:{}", scope, code, expires, seed).as_bytes(), 0)
}
