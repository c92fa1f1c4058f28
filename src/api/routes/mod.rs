//! API Routes
//!
//! Route handlers organized by functionality.

pub mod alerts;
pub mod cost;
pub mod glossary;
pub mod health;
pub mod ocr;
pub mod translate;

use axum::http::HeaderMap;

/// Resolve the caller identity used as the rate-limit key
///
/// Prefers the first `X-Forwarded-For` hop, then `X-Real-IP`. Without a
/// proxy header every caller shares the `"local"` bucket.
pub fn caller_id(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }

    "local".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("10.0.0.1, 10.0.0.2"),
        );
        assert_eq!(caller_id(&headers), "10.0.0.1");
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.5"));
        assert_eq!(caller_id(&headers), "192.168.1.5");
    }

    #[test]
    fn test_local_default() {
        assert_eq!(caller_id(&HeaderMap::new()), "local");
    }
}
