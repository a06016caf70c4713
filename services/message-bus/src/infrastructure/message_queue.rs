//! SQS操作モジュール
//!
//! メッセージキューに対する2つの操作を提供する。
//! - 処理済みメッセージの削除（ACK）
//! - POST /messages からのメッセージ送信

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client as SqsClient;
use thiserror::Error;
use tracing::{debug, warn};

/// キュー操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueueError {
    /// 削除に失敗
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// 送信に失敗
    #[error("Send error: {0}")]
    SendError(String),
}

/// メッセージキューの抽象
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// 受信ハンドルを使ってメッセージを削除する
    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError>;

    /// ボディをそのままキューに送信し、キューが付与したメッセージIDを返す
    async fn send(&self, queue_url: &str, body: &str) -> Result<String, QueueError>;
}

/// MessageQueueのSQS実装
#[derive(Debug, Clone)]
pub struct SqsMessageQueue {
    client: SqsClient,
}

impl SqsMessageQueue {
    /// 新しいSqsMessageQueueを作成
    pub fn new(client: SqsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageQueue for SqsMessageQueue {
    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| {
                let detail = DisplayErrorContext(&e).to_string();
                warn!(queue_url = queue_url, error = %detail, "SQS DeleteMessageエラー");
                QueueError::DeleteError(detail)
            })?;

        Ok(())
    }

    async fn send(&self, queue_url: &str, body: &str) -> Result<String, QueueError> {
        let output = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                let detail = DisplayErrorContext(&e).to_string();
                warn!(queue_url = queue_url, error = %detail, "SQS SendMessageエラー");
                QueueError::SendError(detail)
            })?;

        let message_id = output.message_id().unwrap_or("unknown").to_string();
        debug!(queue_url = queue_url, message_id = %message_id, "SQS SendMessage成功");

        Ok(message_id)
    }
}
