// SPDX-License-Identifier: MIT

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Build the `Authorization` header value for a request.
///
/// The signed message is `METHOD + path_and_query + body`, matching the
/// control plane's own HMAC auth scheme: uppercase HTTP method, the raw
/// request path (including query string, no scheme/host), and the literal
/// request body (empty string for bodyless requests).
pub fn sign(api_key: &str, secret: &str, method: &str, path_and_query: &str, body: &str) -> String {
    let message = format!("{}{}{}", method.to_uppercase(), path_and_query, body);
    // `secret` is an operator-configured string; HMAC key length is
    // unbounded for Sha1, so this never fails.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(message.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("ApiKey {}:{}", api_key, digest)
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
