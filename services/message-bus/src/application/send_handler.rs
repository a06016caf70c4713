/// メッセージ送信ハンドラー
///
/// POST /messages のボディをそのままキューに送る。ペイロードの検証は行わず、
/// 不正なペイロードはインジェストワーカー側で失敗しデッドレターキューに移る。
use tracing::{info, warn};

use crate::domain::SendOutcome;
use crate::infrastructure::MessageQueue;

/// 受け付けるContent-Type
const JSON_CONTENT_TYPE: &str = "application/json";

pub struct SendHandler<MQ>
where
    MQ: MessageQueue,
{
    queue: MQ,
    queue_url: String,
}

impl<MQ> SendHandler<MQ>
where
    MQ: MessageQueue,
{
    /// 新しいSendHandlerを作成
    pub fn new(queue: MQ, queue_url: impl Into<String>) -> Self {
        Self {
            queue,
            queue_url: queue_url.into(),
        }
    }

    /// リクエストボディをキューに送信
    ///
    /// # 引数
    /// * `content_type` - Content-Typeヘッダー（未指定はJSONとみなす）
    /// * `body` - リクエストボディ（UTF-8でなければ置換せず400とする）
    pub async fn send(&self, content_type: Option<&str>, body: &[u8]) -> SendOutcome {
        if let Some(content_type) = content_type {
            if !Self::is_json(content_type) {
                return SendOutcome::UnsupportedMediaType(content_type.to_string());
            }
        }

        let Ok(body) = std::str::from_utf8(body) else {
            return SendOutcome::InvalidEncoding;
        };

        if body.trim().is_empty() {
            return SendOutcome::EmptyBody;
        }

        match self.queue.send(&self.queue_url, body).await {
            Ok(message_id) => {
                info!(message_id = %message_id, body_length = body.len(), "メッセージをキューに送信");
                SendOutcome::Accepted(message_id)
            }
            Err(err) => {
                warn!(error = %err, "メッセージ送信失敗");
                SendOutcome::Fault(err.to_string())
            }
        }
    }

    /// `application/json; charset=utf-8` のようなパラメータ付きも許可する
    fn is_json(content_type: &str) -> bool {
        content_type
            .split(';')
            .next()
            .map(|media_type| media_type.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
            .unwrap_or(false)
    }
}
