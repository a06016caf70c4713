/// メッセージ参照ハンドラー
///
/// GET /messages/{id} で呼び出され、ストアに保存されたメッセージを返す。
/// ストアの障害を含め、すべての結果をLookupOutcomeとして返す。
use tracing::{debug, warn};

use crate::domain::LookupOutcome;
use crate::infrastructure::MessageStore;

pub struct LookupHandler<MS>
where
    MS: MessageStore,
{
    store: MS,
}

impl<MS> LookupHandler<MS>
where
    MS: MessageStore,
{
    /// 新しいLookupHandlerを作成
    pub fn new(store: MS) -> Self {
        Self { store }
    }

    /// IDでメッセージを参照
    ///
    /// # 引数
    /// * `id` - パスパラメータから取り出したID（欠落時はNone）
    pub async fn lookup(&self, id: Option<&str>) -> LookupOutcome {
        let id = id.unwrap_or_default();
        if id.is_empty() {
            debug!("空のIDで参照");
            return LookupOutcome::InvalidInput(id.to_string());
        }

        match self.store.get(id).await {
            Ok(Some(message)) => LookupOutcome::Found(message),
            Ok(None) => {
                debug!(id = id, "メッセージが見つかりません");
                LookupOutcome::NotFound(id.to_string())
            }
            Err(err) => {
                warn!(id = id, error = %err, "メッセージ参照失敗");
                LookupOutcome::Fault(err.to_string())
            }
        }
    }
}
