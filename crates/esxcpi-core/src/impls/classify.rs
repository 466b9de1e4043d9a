//! レスポンス分類
//!
//! HTTP レスポンスのボディは 1 回だけ読み、次のどれか 1 つに振り分ける:
//! 成功（2xx、ボディを返す）、ビジネスエラー（非 2xx で構造化エラーボディ）、
//! トランスポートエラー（それ以外）。

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::domain::{ApiError, CloudError};

pub fn classify(status: u16, body: Bytes) -> Result<Bytes, CloudError> {
    if (200..300).contains(&status) {
        return Ok(body);
    }

    match serde_json::from_slice::<ApiError>(&body) {
        Ok(api) => Err(CloudError::business(api, status)),
        Err(_) => Err(CloudError::Transport {
            http_status: Some(status),
            raw_body: String::from_utf8_lossy(&body).into_owned(),
        }),
    }
}

/// 成功ボディをデコード。`T` に合わないボディはローカルの障害
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, CloudError> {
    serde_json::from_slice(body)
        .map_err(|e| CloudError::internal(format!("esxcloud: failed to decode response: {e}")))
}

/// レスポンスが得られなかったリクエスト
pub fn unreachable(err: impl std::fmt::Display) -> CloudError {
    CloudError::Transport {
        http_status: None,
        raw_body: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;
    use rstest::rstest;

    #[rstest]
    #[case::ok(200)]
    #[case::created(201)]
    #[case::no_content(204)]
    fn success_passes_body_through(#[case] status: u16) {
        let body = Bytes::from_static(b"not even json");
        assert_eq!(classify(status, body.clone()).unwrap(), body);
    }

    #[rstest]
    #[case::not_found(404)]
    #[case::bad_request(400)]
    #[case::server_error(500)]
    fn structured_body_is_business(#[case] status: u16) {
        let body = Bytes::from_static(br#"{"code":"VmNotFound","message":"no such vm","data":{"id":"vm-1"}}"#);
        match classify(status, body).unwrap_err() {
            CloudError::Business {
                code,
                message,
                data,
                http_status,
            } => {
                assert_eq!(code, "VmNotFound");
                assert_eq!(message, "no such vm");
                assert_eq!(data["id"], "vm-1");
                assert_eq!(http_status, status);
            }
            other => panic!("expected business error, got {other:?}"),
        }
    }

    #[rstest]
    #[case::html(502, "<html>Bad Gateway</html>")]
    #[case::empty(404, "")]
    #[case::json_without_code(500, r#"{"message":"oops"}"#)]
    fn unstructured_body_is_transport(#[case] status: u16, #[case] body: &'static str) {
        let err = classify(status, Bytes::from_static(body.as_bytes())).unwrap_err();
        assert_eq!(
            err,
            CloudError::Transport {
                http_status: Some(status),
                raw_body: body.to_string(),
            }
        );
    }

    #[test]
    fn bad_success_body_is_internal() {
        let err = decode::<Task>(b"{\"unexpected\":true}").unwrap_err();
        assert!(matches!(err, CloudError::Internal { .. }));
    }

    #[test]
    fn unreachable_has_no_status() {
        let err = unreachable("connection refused");
        assert!(matches!(err, CloudError::Transport { http_status: None, .. }));
        assert!(!err.is_not_found());
    }
}
