/// API Gatewayレスポンス構築
///
/// ハンドラーの結果をHTTPステータスとJSONボディに変換する。
/// ステータスコードへの変換はこの境界でのみ行う。
use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::{Body, Response};
use serde_json::Value;

use crate::domain::{LookupOutcome, SendOutcome};

/// JSONボディのレスポンスを作成
pub fn json_response(status_code: u16, body: &Value) -> Result<Response<Body>, lambda_http::http::Error> {
    Response::builder()
        .status(status_code)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::Text(body.to_string()))
}

/// 参照結果をレスポンスに変換
pub fn lookup_response(outcome: &LookupOutcome) -> Result<Response<Body>, lambda_http::http::Error> {
    json_response(outcome.status_code(), &outcome.body())
}

/// 送信結果をレスポンスに変換
pub fn send_response(outcome: &SendOutcome) -> Result<Response<Body>, lambda_http::http::Error> {
    json_response(outcome.status_code(), &outcome.body())
}
