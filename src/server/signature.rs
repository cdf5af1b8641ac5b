//! # Webhook 签名
//!
//! GitHub 在 `X-Hub-Signature-256` 头中携带 `sha256=<hex>`，
//! 即以共享密钥对原始请求体做的 HMAC-SHA256。

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// 计算 `sha256=<hex>` 形式的签名
#[cfg(test)]
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!("{}{}", PREFIX, hex::encode(mac.finalize().into_bytes())))
}

/// 校验签名头；比较为常量时间
pub fn verify(secret: &str, header: &str, body: &[u8]) -> bool {
    let Some(hex_sig) = header.trim().strip_prefix(PREFIX) else {
        tracing::warn!("webhook signature missing 'sha256=' prefix");
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        tracing::warn!("webhook signature is not valid hex");
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
