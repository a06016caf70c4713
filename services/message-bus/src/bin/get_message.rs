/// メッセージ参照HTTP Lambdaエントリポイント
///
/// API Gateway の GET /messages/{id} を処理し、保存されたメッセージを返却する。
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use message_bus::application::LookupHandler;
use message_bus::domain::LookupOutcome;
use message_bus::infrastructure::{
    init_logging, lookup_response, path_id, ConfigError, DynamoMessageStore, MessageBusConfig,
};
use tokio::sync::OnceCell;
use tracing::{error, info};

/// LookupHandlerの静的インスタンス
static LOOKUP_HANDLER: OnceCell<LookupHandler<DynamoMessageStore>> = OnceCell::const_new();

/// LookupHandlerを取得（初期化されていなければ初期化）
async fn get_lookup_handler() -> Result<&'static LookupHandler<DynamoMessageStore>, ConfigError> {
    LOOKUP_HANDLER
        .get_or_try_init(|| async {
            let config = MessageBusConfig::from_env().await?;
            let table_name = config.settings().table_name()?.to_string();
            Ok(LookupHandler::new(DynamoMessageStore::new(
                config.dynamodb().clone(),
                table_name,
            )))
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    run(service_fn(handler)).await
}

/// HTTPリクエストハンドラー
///
/// 設定エラーを含むすべての失敗を構造化されたJSONレスポンスに変換する。
async fn handler(request: Request) -> Result<Response<Body>, Error> {
    let id = path_id(&request);
    info!(id = id.as_deref().unwrap_or(""), "メッセージ参照リクエスト受信");

    let outcome = match get_lookup_handler().await {
        Ok(lookup_handler) => lookup_handler.lookup(id.as_deref()).await,
        Err(err) => {
            error!(error = %err, "設定読み込み失敗");
            LookupOutcome::Fault(err.to_string())
        }
    };

    info!(status_code = outcome.status_code(), "メッセージ参照レスポンス送信");

    Ok(lookup_response(&outcome)?)
}
