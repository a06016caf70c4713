/// API Gatewayリクエストからの値の取り出し
use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::{Body, Request, RequestExt};

/// パスパラメータ `{id}` を取得
pub fn path_id(request: &Request) -> Option<String> {
    request
        .path_parameters()
        .first("id")
        .map(|id| id.to_string())
}

/// Content-Typeヘッダーを取得
pub fn content_type(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

/// リクエストボディをバイト列のまま取得
///
/// 文字列としての解釈は呼び出し側で行う（不正なUTF-8を置換せずに検出するため）。
pub fn body_bytes(request: &Request) -> &[u8] {
    match request.body() {
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes.as_slice(),
        _ => &[],
    }
}
