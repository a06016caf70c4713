/// SQSメッセージ取り込みLambda関数
///
/// メッセージキューのイベントソースマッピングから呼び出され、
/// 各レコードをメッセージテーブルに保存してキューから削除する。
/// 失敗したレコードは batchItemFailures で返し再配信させる
/// （イベントソースマッピングで ReportBatchItemFailures を有効にすること）。
use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use message_bus::application::IngestionWorker;
use message_bus::domain::InvocationResult;
use message_bus::infrastructure::{
    init_logging, ConfigError, DynamoMessageStore, MessageBusConfig, SqsMessageQueue,
};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

type Worker = IngestionWorker<DynamoMessageStore, SqsMessageQueue>;

/// IngestionWorkerの静的インスタンス
///
/// Lambda warm start時にAWSクライアントを再利用する。
static WORKER: OnceCell<Worker> = OnceCell::const_new();

/// IngestionWorkerを取得（初期化されていなければ初期化）
async fn get_worker() -> Result<&'static Worker, ConfigError> {
    WORKER
        .get_or_try_init(|| async {
            let config = MessageBusConfig::from_env().await?;
            let settings = config.settings();

            let store = DynamoMessageStore::new(
                config.dynamodb().clone(),
                settings.table_name()?.to_string(),
            );
            let queue = SqsMessageQueue::new(config.sqs().clone());

            info!(
                table = store.table_name(),
                max_receive_count = settings.max_receive_count(),
                "IngestionWorkerを初期化"
            );

            let mut worker = IngestionWorker::new(store, queue, settings.max_receive_count());
            if let Some(queue_url) = settings.queue_url_override() {
                worker = worker.with_queue_url(queue_url);
            }
            Ok(worker)
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // Lambda関数を初期化して実行
    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. IngestionWorkerを取得（初回のみ設定読み込み）
/// 2. 全レコードを逐次処理
/// 3. 処理結果を構造化オブジェクトで返却
///
/// 失敗はすべて戻り値で表し、ランタイムにはエラーを返さない。
async fn handler(event: LambdaEvent<SqsEvent>) -> Result<InvocationResult, Error> {
    let event = event.payload;

    let result = match get_worker().await {
        Ok(worker) => worker.process_event(&event).await.into_invocation_result(),
        Err(err) => config_error_result(&event, &err),
    };

    if result.has_failures() {
        warn!(
            failure_count = result.batch_item_failures.len(),
            whole_batch = result.fails_whole_batch(),
            "失敗レコードを再配信"
        );
    }

    Ok(result)
}

/// 設定エラー時の結果（全レコードを再配信させる）
fn config_error_result(event: &SqsEvent, err: &ConfigError) -> InvocationResult {
    error!(error = %err, "設定読み込み失敗");
    InvocationResult::all_failed(event, format!("Configuration error: {}", err))
}
