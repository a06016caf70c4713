/// Ingestion Lambdaの呼び出し結果
///
/// 業務上の失敗もランタイムのクラッシュとして扱われないよう、
/// 常にこの構造化オブジェクトを返却する。`batchItemFailures` は
/// イベントソースマッピングの ReportBatchItemFailures が解釈する。
use aws_lambda_events::event::sqs::{BatchItemFailure, SqsEvent};
use serde::{Deserialize, Serialize};

/// バッチ全体を失敗させる識別子
///
/// ReportBatchItemFailures は空や未知の itemIdentifier を含む応答を
/// バッチ全体の失敗として扱い、全レコードを再配信する。
pub const WHOLE_BATCH_IDENTIFIER: &str = "";

/// 結果ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Success,
    Fail,
}

/// `body` に埋め込むステータスとメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationBody {
    pub status: InvocationStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    /// JSON文字列化した `InvocationBody`
    pub body: String,
    pub batch_item_failures: Vec<BatchItemFailure>,
}

impl InvocationResult {
    /// 全レコード成功
    pub fn success(message: impl Into<String>) -> Self {
        Self::build(200, InvocationStatus::Success, message.into(), Vec::new())
    }

    /// 一部または全レコード失敗
    ///
    /// `whole_batch` が true の場合は識別できない失敗があるため、
    /// バッチ全体を再配信させる識別子を追加する。
    pub fn failure(
        message: impl Into<String>,
        failed_message_ids: Vec<String>,
        whole_batch: bool,
    ) -> Self {
        let mut failures: Vec<BatchItemFailure> = failed_message_ids
            .into_iter()
            .map(|item_identifier| BatchItemFailure { item_identifier })
            .collect();
        if whole_batch {
            failures.push(BatchItemFailure {
                item_identifier: WHOLE_BATCH_IDENTIFIER.to_string(),
            });
        }
        Self::build(500, InvocationStatus::Fail, message.into(), failures)
    }

    /// イベント内の全レコードを失敗とする
    ///
    /// 設定読み込み失敗などでレコードを処理できなかった場合に使う。
    /// messageId のないレコードがあればバッチ全体を失敗させる。
    pub fn all_failed(event: &SqsEvent, message: impl Into<String>) -> Self {
        let message_ids: Vec<String> = event
            .records
            .iter()
            .filter_map(|record| record.message_id.clone())
            .collect();
        let whole_batch = message_ids.len() < event.records.len();
        Self::failure(message, message_ids, whole_batch)
    }

    fn build(
        status_code: u16,
        status: InvocationStatus,
        message: String,
        batch_item_failures: Vec<BatchItemFailure>,
    ) -> Self {
        let body = serde_json::to_string(&InvocationBody { status, message }).unwrap_or_default();
        Self {
            status_code,
            body,
            batch_item_failures,
        }
    }

    /// 失敗レコードがあるか
    pub fn has_failures(&self) -> bool {
        !self.batch_item_failures.is_empty()
    }

    /// バッチ全体の再配信を要求しているか
    pub fn fails_whole_batch(&self) -> bool {
        self.batch_item_failures
            .iter()
            .any(|failure| failure.item_identifier == WHOLE_BATCH_IDENTIFIER)
    }
}
