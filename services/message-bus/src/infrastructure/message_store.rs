/// DynamoDBでメッセージを管理するためのメッセージストア
///
/// テーブルは文字列型のパーティションキー `id` を持つ。書き込みは常に
/// 条件なしの put_item（upsert）で、同じ `id` の再配信は上書きになる。
use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::domain::Message;

/// ストア操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// DynamoDBへの書き込みに失敗（応答ステータスを得られなかった）
    #[error("Write error: {0}")]
    WriteError(String),

    /// DynamoDBからの読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// 行のシリアライズ/デシリアライズに失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// put操作の応答
///
/// 障害が発生しなかった場合でも、呼び出し側はステータスを検査して成否を判断する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    /// HTTP相当のステータスコード
    pub status_code: u16,
    /// 失敗時のサービス側エラー詳細
    pub detail: Option<String>,
}

impl PutReceipt {
    /// 200応答
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            detail: None,
        }
    }

    /// サービスが拒否した応答
    pub fn rejected(status_code: u16, detail: impl Into<String>) -> Self {
        Self {
            status_code,
            detail: Some(detail.into()),
        }
    }

    /// 2xxかどうか
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// メッセージ永続化の抽象
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// `message.id` をキーにupsertする
    ///
    /// # 戻り値
    /// * `Ok(PutReceipt)` - サービスから応答を得た（成否はステータスで判断）
    /// * `Err(StoreError)` - 応答を得られなかった
    async fn put(&self, message: &Message) -> Result<PutReceipt, StoreError>;

    /// IDでメッセージを取得
    ///
    /// # 戻り値
    /// * 見つかった場合は`Ok(Some(Message))`
    /// * 見つからなかった場合は`Ok(None)`
    /// * 失敗時は`Err(StoreError)`
    async fn get(&self, id: &str) -> Result<Option<Message>, StoreError>;
}

/// MessageStoreのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoMessageStore {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoMessageStore {
    /// 新しいDynamoMessageStoreを作成
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// テーブル名を取得
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Messageを属性マップに変換
    fn to_item(message: &Message) -> Result<HashMap<String, AttributeValue>, StoreError> {
        serde_dynamo::to_item(message).map_err(|e| StoreError::SerializationError(e.to_string()))
    }

    /// 属性マップをMessageに変換
    fn from_item(item: HashMap<String, AttributeValue>) -> Result<Message, StoreError> {
        serde_dynamo::from_item(item).map_err(|e| StoreError::SerializationError(e.to_string()))
    }
}

#[async_trait]
impl MessageStore for DynamoMessageStore {
    async fn put(&self, message: &Message) -> Result<PutReceipt, StoreError> {
        let item = Self::to_item(message)?;

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(id = %message.id, table = %self.table_name, "put_item成功");
                Ok(PutReceipt::ok())
            }
            // サービスが応答を返した失敗はステータス付きの応答として扱う
            Err(SdkError::ServiceError(context)) => {
                let status_code = context.raw().status().as_u16();
                Ok(PutReceipt::rejected(status_code, context.err().to_string()))
            }
            Err(err) => Err(StoreError::WriteError(
                DisplayErrorContext(&err).to_string(),
            )),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Message>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::ReadError(DisplayErrorContext(&e).to_string()))?;

        match output.item {
            Some(item) => Ok(Some(Self::from_item(item)?)),
            None => Ok(None),
        }
    }
}
