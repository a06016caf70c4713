/// メッセージ参照の結果
///
/// 業務上の結果をタグ付きで表し、HTTPステータスへの変換は境界でのみ行う。
use serde_json::{json, Value};

use super::message::Message;

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// メッセージが見つかった
    Found(Message),
    /// 該当行なし
    NotFound(String),
    /// idが空または欠落
    InvalidInput(String),
    /// ストアアクセス中の予期しない障害
    Fault(String),
}

impl LookupOutcome {
    /// HTTPステータスコード
    ///
    /// 空IDは400、該当なしは404とする。
    pub fn status_code(&self) -> u16 {
        match self {
            LookupOutcome::Found(_) => 200,
            LookupOutcome::InvalidInput(_) => 400,
            LookupOutcome::NotFound(_) => 404,
            LookupOutcome::Fault(_) => 500,
        }
    }

    /// レスポンスボディ
    ///
    /// 成功時は保存された行そのもの、失敗時は `{"data": {"status": "fail", "message": ...}}`。
    pub fn body(&self) -> Value {
        match self {
            LookupOutcome::Found(message) => json!({
                "id": message.id,
                "message": message.message,
            }),
            LookupOutcome::NotFound(id) | LookupOutcome::InvalidInput(id) => {
                Self::fail_body(format!("No message found with id = '{}'", id))
            }
            LookupOutcome::Fault(description) => Self::fail_body(description.clone()),
        }
    }

    fn fail_body(message: String) -> Value {
        json!({
            "data": {
                "status": "fail",
                "message": message,
            }
        })
    }
}
