/// インジェストワーカー
///
/// SQSイベントソースから受け取ったレコードを1件ずつ処理する。
/// デコード → upsert → 削除（ACK）の順に進み、失敗したレコードは削除せず
/// `batchItemFailures` で報告して再配信させる。再配信が上限に達すると
/// キューがデッドレターキューへ移す。
use aws_lambda_events::event::sqs::{SqsEvent, SqsMessage};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::{DecodeError, Envelope, InvocationResult, Message, QueueRef, QueueRefError};
use crate::infrastructure::{MessageQueue, MessageStore, StoreError};

/// 受信回数を表すSQSシステム属性
const APPROXIMATE_RECEIVE_COUNT: &str = "ApproximateReceiveCount";

/// SQSレコードからエンベロープを組み立てる際のエラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvelopeError {
    #[error("Missing messageId in record")]
    MissingMessageId,

    #[error("Missing body in record")]
    MissingBody,

    #[error("Missing receiptHandle in record")]
    MissingReceiptHandle,

    #[error("Cannot resolve queue: {0}")]
    UnresolvableQueue(String),
}

impl From<QueueRefError> for EnvelopeError {
    fn from(err: QueueRefError) -> Self {
        EnvelopeError::UnresolvableQueue(err.to_string())
    }
}

/// 1件のエンベロープ処理のエラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IngestionError {
    /// エンベロープ自体が不完全
    #[error("Invalid envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    /// ボディのデコード失敗
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// ストアから応答を得られなかった
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// ストアが非成功ステータスを返した
    #[error("Store rejected put with status {status_code}: {detail}")]
    StoreRejected { status_code: u16, detail: String },
}

/// 成功時の処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessAction {
    /// 保存した。`acknowledged` が false の場合は削除に失敗しており、再配信されうる
    Stored { acknowledged: bool },
}

/// バッチ処理の集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    /// 保存まで完了したレコード数
    pub stored_count: usize,
    /// 保存したがキューからの削除に失敗したレコード数（`stored_count` に含む）
    pub unacknowledged_count: usize,
    /// 失敗したレコード数
    pub failure_count: usize,
    /// 失敗したが messageId がなく報告できなかったレコード数
    pub unreportable_count: usize,
    /// 再配信させるメッセージID
    pub failed_message_ids: Vec<String>,
}

impl IngestionSummary {
    /// 呼び出し結果に変換
    ///
    /// messageId のない失敗レコードは個別に報告できないため、バッチ全体を失敗させる。
    pub fn into_invocation_result(self) -> InvocationResult {
        let total = self.stored_count + self.failure_count;

        if self.failure_count == 0 {
            InvocationResult::success(format!("Stored {} message(s)", self.stored_count))
        } else {
            InvocationResult::failure(
                format!("{} of {} message(s) failed", self.failure_count, total),
                self.failed_message_ids,
                self.unreportable_count > 0,
            )
        }
    }
}

/// SQSメッセージをメッセージテーブルに取り込むワーカー
pub struct IngestionWorker<MS, MQ>
where
    MS: MessageStore,
    MQ: MessageQueue,
{
    store: MS,
    queue: MQ,
    /// キューの maxReceiveCount
    max_receive_count: u32,
    /// 削除先キューURLの上書き（未設定ならeventSourceArnから導出）
    queue_url_override: Option<String>,
}

impl<MS, MQ> IngestionWorker<MS, MQ>
where
    MS: MessageStore,
    MQ: MessageQueue,
{
    /// 新しいIngestionWorkerを作成
    pub fn new(store: MS, queue: MQ, max_receive_count: u32) -> Self {
        Self {
            store,
            queue,
            max_receive_count,
            queue_url_override: None,
        }
    }

    /// 削除先キューURLを固定する
    pub fn with_queue_url(mut self, queue_url: impl Into<String>) -> Self {
        self.queue_url_override = Some(queue_url.into());
        self
    }

    /// SQSイベント全体を処理
    ///
    /// レコードは配信順に逐次処理し、互いの成否に影響しない。
    pub async fn process_event(&self, event: &SqsEvent) -> IngestionSummary {
        let record_count = event.records.len();
        info!(record_count = record_count, "SQSイベント処理開始");

        let mut summary = IngestionSummary::default();

        for record in &event.records {
            match self.process_record(record).await {
                Ok(ProcessAction::Stored { acknowledged }) => {
                    summary.stored_count += 1;
                    if !acknowledged {
                        summary.unacknowledged_count += 1;
                    }
                }
                Err(err) => {
                    summary.failure_count += 1;
                    match &record.message_id {
                        Some(message_id) => summary.failed_message_ids.push(message_id.clone()),
                        None => {
                            error!(error = %err, "messageIdのないレコードが失敗（バッチ全体を再配信）");
                            summary.unreportable_count += 1;
                        }
                    }
                }
            }
        }

        info!(
            stored_count = summary.stored_count,
            unacknowledged_count = summary.unacknowledged_count,
            failure_count = summary.failure_count,
            unreportable_count = summary.unreportable_count,
            "SQSイベント処理完了"
        );

        summary
    }

    /// 単一レコードを処理
    async fn process_record(&self, record: &SqsMessage) -> Result<ProcessAction, IngestionError> {
        let envelope = match self.envelope_from_record(record) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(
                    message_id = record.message_id.as_deref().unwrap_or("unknown"),
                    error = %err,
                    "不完全なレコード"
                );
                return Err(err.into());
            }
        };

        let result = self.process_envelope(&envelope).await;

        if let Err(err) = &result {
            if envelope.is_final_attempt(self.max_receive_count) {
                error!(
                    message_id = %envelope.message_id,
                    receive_count = envelope.receive_count,
                    max_receive_count = self.max_receive_count,
                    error = %err,
                    "メッセージ処理失敗（デッドレターキューへ移動予定）"
                );
            } else {
                warn!(
                    message_id = %envelope.message_id,
                    receive_count = envelope.receive_count,
                    max_receive_count = self.max_receive_count,
                    error = %err,
                    "メッセージ処理失敗（再配信待ち）"
                );
            }
        }

        result
    }

    /// SQSレコードからエンベロープを組み立てる
    pub fn envelope_from_record(&self, record: &SqsMessage) -> Result<Envelope, EnvelopeError> {
        let message_id = record
            .message_id
            .clone()
            .ok_or(EnvelopeError::MissingMessageId)?;
        let body = record.body.clone().ok_or(EnvelopeError::MissingBody)?;
        let receipt_handle = record
            .receipt_handle
            .clone()
            .ok_or(EnvelopeError::MissingReceiptHandle)?;

        let queue = match (&self.queue_url_override, &record.event_source_arn) {
            (Some(url), _) => QueueRef::from_url(url.clone()),
            (None, Some(arn)) => QueueRef::from_arn(arn)?,
            (None, None) => {
                return Err(EnvelopeError::UnresolvableQueue(
                    "no eventSourceArn and no configured queue URL".to_string(),
                ));
            }
        };

        // 属性がない場合は初回配信として扱う
        let receive_count = record
            .attributes
            .get(APPROXIMATE_RECEIVE_COUNT)
            .and_then(|count| count.parse::<u32>().ok())
            .unwrap_or(1);

        Ok(Envelope {
            message_id,
            body,
            receipt_handle,
            queue,
            receive_count,
        })
    }

    /// エンベロープを処理
    ///
    /// # 処理フロー
    /// 1. ボディをMessageにデコード
    /// 2. ストアにupsertし、応答ステータスを検査
    /// 3. 成功時のみ受信ハンドルでキューから削除
    ///
    /// 削除の失敗は保存済みなので失敗扱いにしない（upsertは冪等で再配信は安全）。
    pub async fn process_envelope(&self, envelope: &Envelope) -> Result<ProcessAction, IngestionError> {
        let message = Message::decode(&envelope.body)?;
        debug!(message_id = %envelope.message_id, id = %message.id, "メッセージをデコード");

        let receipt = self.store.put(&message).await?;
        if !receipt.is_success() {
            return Err(IngestionError::StoreRejected {
                status_code: receipt.status_code,
                detail: receipt.detail.unwrap_or_default(),
            });
        }

        info!(
            message_id = %envelope.message_id,
            id = %message.id,
            status_code = receipt.status_code,
            "メッセージを保存"
        );

        let acknowledged = match self
            .queue
            .delete(envelope.queue.url(), &envelope.receipt_handle)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    message_id = %envelope.message_id,
                    id = %message.id,
                    error = %err,
                    "メッセージ削除失敗（保存済み、再配信の可能性あり）"
                );
                false
            }
        };

        Ok(ProcessAction::Stored { acknowledged })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::message_queue::tests::MockMessageQueue;
    use crate::infrastructure::message_store::tests::MockMessageStore;
    use crate::infrastructure::QueueError;
    use serde_json::{json, Value};

    const QUEUE_ARN: &str = "arn:aws:sqs:eu-west-1:123456789012:MessageQueue";
    const QUEUE_URL: &str = "https://sqs.eu-west-1.amazonaws.com/123456789012/MessageQueue";

    // ==================== テストヘルパー ====================

    fn create_test_worker(
        max_receive_count: u32,
    ) -> (
        IngestionWorker<MockMessageStore, MockMessageQueue>,
        MockMessageStore,
        MockMessageQueue,
    ) {
        let store = MockMessageStore::new();
        let queue = MockMessageQueue::new();
        let worker = IngestionWorker::new(store.clone(), queue.clone(), max_receive_count);
        (worker, store, queue)
    }

    fn record_json(message_id: &str, body: &str, receipt_handle: &str) -> Value {
        json!({
            "messageId": message_id,
            "receiptHandle": receipt_handle,
            "body": body,
            "attributes": {
                "ApproximateReceiveCount": "1",
                "SentTimestamp": "1700000000000"
            },
            "messageAttributes": {},
            "md5OfBody": "",
            "eventSource": "aws:sqs",
            "eventSourceARN": QUEUE_ARN,
            "awsRegion": "eu-west-1"
        })
    }

    fn sqs_event(records: Vec<Value>) -> SqsEvent {
        serde_json::from_value(json!({ "Records": records })).unwrap()
    }

    fn envelope(body: &str) -> Envelope {
        Envelope {
            message_id: "msg-1".to_string(),
            body: body.to_string(),
            receipt_handle: "rh-1".to_string(),
            queue: QueueRef::from_url(QUEUE_URL),
            receive_count: 1,
        }
    }

    // ==================== process_envelope ====================

    #[tokio::test]
    async fn test_success_stores_and_acknowledges_once() {
        let (worker, store, queue) = create_test_worker(1);

        let action = worker
            .process_envelope(&envelope(r#"{"id":"a1","message":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(action, ProcessAction::Stored { acknowledged: true });
        assert_eq!(store.row("a1"), Some(Message::new("a1", "hello")));
        // 受信ハンドル（ボディではない）で一度だけ削除する
        assert_eq!(
            queue.deleted(),
            vec![(QUEUE_URL.to_string(), "rh-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let (worker, store, queue) = create_test_worker(3);
        let env = envelope(r#"{"id":"a1","message":"hello"}"#);

        worker.process_envelope(&env).await.unwrap();
        worker.process_envelope(&env).await.unwrap();

        assert_eq!(store.row_count(), 1);
        assert_eq!(store.row("a1").unwrap().message, "hello");
        assert_eq!(queue.deleted().len(), 2);
    }

    #[tokio::test]
    async fn test_redelivery_keeps_latest_message() {
        let (worker, store, _) = create_test_worker(3);

        worker
            .process_envelope(&envelope(r#"{"id":"a1","message":"first"}"#))
            .await
            .unwrap();
        worker
            .process_envelope(&envelope(r#"{"id":"a1","message":"second"}"#))
            .await
            .unwrap();

        assert_eq!(store.row_count(), 1);
        assert_eq!(store.row("a1").unwrap().message, "second");
    }

    #[tokio::test]
    async fn test_decode_failure_does_not_acknowledge() {
        let (worker, store, queue) = create_test_worker(1);

        for body in [
            "not json",
            r#"{"message":"hello"}"#,
            r#"{"id":"a1"}"#,
            r#"{"id":1,"message":"hello"}"#,
            "",
        ] {
            let result = worker.process_envelope(&envelope(body)).await;
            assert!(matches!(result, Err(IngestionError::Decode(_))), "body: {body}");
        }

        assert_eq!(store.put_calls(), 0);
        assert!(queue.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_store_rejected_status_does_not_acknowledge() {
        let (worker, store, queue) = create_test_worker(1);
        store.set_next_put_status(500);

        let result = worker
            .process_envelope(&envelope(r#"{"id":"a1","message":"hello"}"#))
            .await;

        assert!(matches!(
            result,
            Err(IngestionError::StoreRejected { status_code: 500, .. })
        ));
        assert!(queue.deleted().is_empty());
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_store_error_does_not_acknowledge() {
        let (worker, store, queue) = create_test_worker(1);
        store.set_next_error(StoreError::WriteError("timeout".to_string()));

        let result = worker
            .process_envelope(&envelope(r#"{"id":"a1","message":"hello"}"#))
            .await;

        assert_eq!(
            result.unwrap_err(),
            IngestionError::Store(StoreError::WriteError("timeout".to_string()))
        );
        assert!(queue.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_after_store_is_still_stored() {
        let (worker, store, queue) = create_test_worker(1);
        queue.set_next_error(QueueError::DeleteError("ReceiptHandleIsInvalid".to_string()));

        let action = worker
            .process_envelope(&envelope(r#"{"id":"a1","message":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(action, ProcessAction::Stored { acknowledged: false });
        assert!(store.row("a1").is_some());
    }

    // ==================== envelope_from_record ====================

    #[test]
    fn test_envelope_from_record_derives_queue_url() {
        let (worker, _, _) = create_test_worker(1);
        let event = sqs_event(vec![record_json("msg-1", "{}", "rh-1")]);

        let envelope = worker.envelope_from_record(&event.records[0]).unwrap();

        assert_eq!(envelope.message_id, "msg-1");
        assert_eq!(envelope.receipt_handle, "rh-1");
        assert_eq!(envelope.queue.url(), QUEUE_URL);
        assert_eq!(envelope.receive_count, 1);
    }

    #[test]
    fn test_envelope_from_record_uses_configured_queue_url() {
        let (worker, _, _) = create_test_worker(1);
        let worker = worker.with_queue_url("https://sqs.example/override");
        let event = sqs_event(vec![record_json("msg-1", "{}", "rh-1")]);

        let envelope = worker.envelope_from_record(&event.records[0]).unwrap();

        assert_eq!(envelope.queue.url(), "https://sqs.example/override");
    }

    #[test]
    fn test_envelope_from_record_reads_receive_count() {
        let (worker, _, _) = create_test_worker(1);
        let mut record = record_json("msg-1", "{}", "rh-1");
        record["attributes"]["ApproximateReceiveCount"] = json!("4");
        let event = sqs_event(vec![record]);

        let envelope = worker.envelope_from_record(&event.records[0]).unwrap();

        assert_eq!(envelope.receive_count, 4);
    }

    #[test]
    fn test_envelope_from_record_missing_receipt_handle() {
        let (worker, _, _) = create_test_worker(1);
        let mut record = record_json("msg-1", "{}", "rh-1");
        record.as_object_mut().unwrap().remove("receiptHandle");
        let event = sqs_event(vec![record]);

        assert_eq!(
            worker.envelope_from_record(&event.records[0]).unwrap_err(),
            EnvelopeError::MissingReceiptHandle
        );
    }

    #[test]
    fn test_envelope_from_record_unresolvable_queue() {
        let (worker, _, _) = create_test_worker(1);
        let mut record = record_json("msg-1", "{}", "rh-1");
        record["eventSourceARN"] = json!("not-an-arn");
        let event = sqs_event(vec![record]);

        assert!(matches!(
            worker.envelope_from_record(&event.records[0]),
            Err(EnvelopeError::UnresolvableQueue(_))
        ));
    }

    // ==================== process_event ====================

    #[tokio::test]
    async fn test_process_event_all_success() {
        let (worker, store, queue) = create_test_worker(1);
        let event = sqs_event(vec![
            record_json("msg-1", r#"{"id":"a1","message":"hello"}"#, "rh-1"),
            record_json("msg-2", r#"{"id":"a2","message":"world"}"#, "rh-2"),
        ]);

        let summary = worker.process_event(&event).await;

        assert_eq!(summary.stored_count, 2);
        assert_eq!(summary.failure_count, 0);
        assert_eq!(store.row_count(), 2);
        assert_eq!(queue.deleted().len(), 2);

        let result = summary.into_invocation_result();
        assert_eq!(result.status_code, 200);
        assert!(!result.has_failures());
    }

    #[tokio::test]
    async fn test_process_event_reports_only_failed_records() {
        let (worker, store, queue) = create_test_worker(1);
        let event = sqs_event(vec![
            record_json("msg-1", r#"{"id":"a1","message":"hello"}"#, "rh-1"),
            record_json("msg-2", "broken", "rh-2"),
            record_json("msg-3", r#"{"id":"a3","message":"!"}"#, "rh-3"),
        ]);

        let summary = worker.process_event(&event).await;

        assert_eq!(summary.stored_count, 2);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.failed_message_ids, vec!["msg-2".to_string()]);
        assert_eq!(store.row_count(), 2);

        let deleted_handles: Vec<String> =
            queue.deleted().into_iter().map(|(_, handle)| handle).collect();
        assert_eq!(deleted_handles, vec!["rh-1".to_string(), "rh-3".to_string()]);

        let result = summary.into_invocation_result();
        assert_eq!(result.status_code, 500);
        assert_eq!(result.batch_item_failures.len(), 1);
        assert_eq!(result.batch_item_failures[0].item_identifier, "msg-2");
    }

    #[tokio::test]
    async fn test_process_event_record_without_message_id() {
        let (worker, _, queue) = create_test_worker(1);
        let mut record = record_json("msg-1", r#"{"id":"a1","message":"hello"}"#, "rh-1");
        record.as_object_mut().unwrap().remove("messageId");
        let event = sqs_event(vec![record]);

        let summary = worker.process_event(&event).await;

        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.unreportable_count, 1);
        assert!(summary.failed_message_ids.is_empty());
        assert!(queue.deleted().is_empty());

        // 空の batchItemFailures は全件成功と解釈されるため、バッチ全体を失敗させる
        let result = summary.into_invocation_result();
        assert_eq!(result.status_code, 500);
        assert!(result.fails_whole_batch());
    }

    #[tokio::test]
    async fn test_process_event_unreportable_failure_alongside_reportable() {
        let (worker, _, _) = create_test_worker(1);
        let mut record = record_json("msg-1", r#"{"id":"a1","message":"hello"}"#, "rh-1");
        record.as_object_mut().unwrap().remove("messageId");
        let event = sqs_event(vec![
            record,
            record_json("msg-2", "broken", "rh-2"),
            record_json("msg-3", r#"{"id":"a3","message":"!"}"#, "rh-3"),
        ]);

        let summary = worker.process_event(&event).await;

        assert_eq!(summary.stored_count, 1);
        assert_eq!(summary.failure_count, 2);
        assert_eq!(summary.unreportable_count, 1);

        let result = summary.into_invocation_result();
        assert_eq!(result.status_code, 500);
        let identifiers: Vec<&str> = result
            .batch_item_failures
            .iter()
            .map(|failure| failure.item_identifier.as_str())
            .collect();
        assert_eq!(identifiers, vec!["msg-2", ""]);
    }

    #[tokio::test]
    async fn test_process_event_counts_unacknowledged_records() {
        let (worker, _, queue) = create_test_worker(1);
        queue.set_next_error(QueueError::DeleteError("ReceiptHandleIsInvalid".to_string()));
        let event = sqs_event(vec![
            record_json("msg-1", r#"{"id":"a1","message":"hello"}"#, "rh-1"),
            record_json("msg-2", r#"{"id":"a2","message":"world"}"#, "rh-2"),
        ]);

        let summary = worker.process_event(&event).await;

        assert_eq!(summary.stored_count, 2);
        assert_eq!(summary.unacknowledged_count, 1);
        assert_eq!(summary.failure_count, 0);
        assert_eq!(summary.into_invocation_result().status_code, 200);
    }

    #[tokio::test]
    async fn test_process_event_empty() {
        let (worker, _, _) = create_test_worker(1);

        let summary = worker.process_event(&sqs_event(vec![])).await;

        assert_eq!(summary, IngestionSummary::default());
        assert_eq!(summary.into_invocation_result().status_code, 200);
    }

    #[test]
    fn test_ingestion_error_display() {
        let error = IngestionError::StoreRejected {
            status_code: 400,
            detail: "ValidationException".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Store rejected put with status 400: ValidationException"
        );
        assert_eq!(
            IngestionError::Decode(DecodeError::MissingField("id")).to_string(),
            "Decode error: Missing field: id"
        );
    }
}
