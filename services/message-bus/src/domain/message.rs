/// メッセージモデル
///
/// キューから受信したボディをデコードし、メッセージテーブルに保存する単位。
/// `id` がテーブルのパーティションキーとなる。
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// メッセージボディのデコードエラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// JSONとして解析できない、またはフィールドの型が不正
    #[error("Malformed message body: {0}")]
    Malformed(String),

    /// 必須フィールドが欠落
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// idが空文字列
    #[error("Empty message id")]
    EmptyId,
}

/// 保存対象のメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// 呼び出し元が付与する一意なID（主キー）
    pub id: String,
    /// 不透明なペイロード
    pub message: String,
}

/// デコード時の中間表現
///
/// フィールド欠落を serde のエラー文字列ではなく `MissingField` として区別するため、
/// いったん Option で受ける。未知のフィールドは無視する。
#[derive(Deserialize)]
struct RawMessage {
    id: Option<String>,
    message: Option<String>,
}

impl Message {
    /// 新しいMessageを作成
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }

    /// キューのボディ文字列からMessageをデコード
    ///
    /// # 戻り値
    /// * `Ok(Message)` - `id` と `message` がともに文字列として存在する場合
    /// * `Err(DecodeError)` - それ以外
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        // 配列形式 ["id", "message"] も serde の構造体としては解析できてしまうため弾く
        if !value.is_object() {
            return Err(DecodeError::Malformed("expected a JSON object".to_string()));
        }

        let raw: RawMessage =
            serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let id = raw.id.ok_or(DecodeError::MissingField("id"))?;
        let message = raw.message.ok_or(DecodeError::MissingField("message"))?;

        if id.is_empty() {
            return Err(DecodeError::EmptyId);
        }

        Ok(Self { id, message })
    }
}
