/// メッセージ送信（POST /messages）の結果
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// キューが受け付けた（キューが付与したメッセージID）
    Accepted(String),
    /// JSON以外のContent-Type
    UnsupportedMediaType(String),
    /// ボディが空
    EmptyBody,
    /// ボディがUTF-8として不正
    InvalidEncoding,
    /// キュー送信失敗
    Fault(String),
}

impl SendOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            SendOutcome::Accepted(_) => 200,
            SendOutcome::EmptyBody | SendOutcome::InvalidEncoding => 400,
            SendOutcome::UnsupportedMediaType(_) => 415,
            SendOutcome::Fault(_) => 500,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            SendOutcome::Accepted(message_id) => json!({
                "status": "success",
                "message": "Message accepted",
                "messageId": message_id,
            }),
            SendOutcome::UnsupportedMediaType(content_type) => json!({
                "status": "fail",
                "message": format!("Unsupported content type '{}'", content_type),
            }),
            SendOutcome::EmptyBody => json!({
                "status": "fail",
                "message": "Request body is empty",
            }),
            SendOutcome::InvalidEncoding => json!({
                "status": "fail",
                "message": "Request body is not valid UTF-8",
            }),
            SendOutcome::Fault(description) => json!({
                "status": "fail",
                "message": description,
            }),
        }
    }
}
