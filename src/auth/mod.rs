//! Bearer-secret gate for the reporting endpoint
//!
//! Two terminal failure modes, deliberately indistinct beyond their status:
//! a missing server-side secret is a configuration fault (500), anything
//! else - absent header, wrong scheme, wrong secret - is unauthorized (401).

use axum::http::{header, HeaderMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportAuthError {
    #[error("analytics secret not configured")]
    Unconfigured,
    #[error("invalid credential")]
    Invalid,
}

pub fn authorize_report(headers: &HeaderMap, secret: Option<&str>) -> Result<(), ReportAuthError> {
    let secret = match secret {
        Some(s) if !s.is_empty() => s,
        _ => return Err(ReportAuthError::Unconfigured),
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match provided {
        Some(value) if value == format!("Bearer {}", secret) => Ok(()),
        _ => Err(ReportAuthError::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn valid_credential_passes() {
        let headers = headers_with("Bearer hunter2");
        assert_eq!(authorize_report(&headers, Some("hunter2")), Ok(()));
    }

    #[test]
    fn missing_secret_is_a_configuration_fault() {
        // Even a "correct" guess cannot pass an unconfigured gate.
        let headers = headers_with("Bearer hunter2");
        assert_eq!(
            authorize_report(&headers, None),
            Err(ReportAuthError::Unconfigured)
        );
        assert_eq!(
            authorize_report(&headers, Some("")),
            Err(ReportAuthError::Unconfigured)
        );
    }

    #[test]
    fn wrong_credential_is_unauthorized() {
        let headers = headers_with("Bearer wrong");
        assert_eq!(
            authorize_report(&headers, Some("hunter2")),
            Err(ReportAuthError::Invalid)
        );
    }

    #[test]
    fn missing_header_is_unauthorized() {
        assert_eq!(
            authorize_report(&HeaderMap::new(), Some("hunter2")),
            Err(ReportAuthError::Invalid)
        );
    }

    #[test]
    fn scheme_must_be_bearer() {
        let headers = headers_with("Basic hunter2");
        assert_eq!(
            authorize_report(&headers, Some("hunter2")),
            Err(ReportAuthError::Invalid)
        );
    }
}
