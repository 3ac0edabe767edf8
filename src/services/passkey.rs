use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const LOGIN_CONTEXT: &[u8] = b"rent-ledger-login";

fn login_tag(secret: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(LOGIN_CONTEXT);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Compare a submitted password with the configured passkey in constant time.
pub fn verify_passkey(expected: &str, candidate: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let Some(expected_tag) = login_tag(expected) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(candidate.as_bytes()) else {
        return false;
    };
    mac.update(LOGIN_CONTEXT);
    mac.verify_slice(&expected_tag).is_ok()
}
