/// キューエンベロープ
///
/// 1回の処理試行の間だけIngestionWorkerが所有する、キュー配信の単位。
/// `receipt_handle` は現在のリース所有の証明で、削除（ACK）に必須。
use super::queue_ref::QueueRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// キューが付与したメッセージID（部分失敗の報告に使用）
    pub message_id: String,
    /// シリアライズされたメッセージ
    pub body: String,
    /// 受信ハンドル
    pub receipt_handle: String,
    /// 削除先キュー
    pub queue: QueueRef,
    /// 受信回数（ApproximateReceiveCount）
    pub receive_count: u32,
}

impl Envelope {
    /// 受信回数が上限に達しているか
    ///
    /// この試行が失敗すると、キューはエンベロープをデッドレターキューへ移す。
    pub fn is_final_attempt(&self, max_receive_count: u32) -> bool {
        self.receive_count >= max_receive_count
    }
}
