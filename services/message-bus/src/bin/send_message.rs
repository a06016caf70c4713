/// メッセージ送信HTTP Lambdaエントリポイント
///
/// API Gateway の POST /messages を処理し、ボディをそのままメッセージキューへ送る。
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use message_bus::application::SendHandler;
use message_bus::domain::SendOutcome;
use message_bus::infrastructure::{
    body_bytes, content_type, init_logging, send_response, ConfigError, MessageBusConfig,
    SqsMessageQueue,
};
use tokio::sync::OnceCell;
use tracing::{error, info};

/// SendHandlerの静的インスタンス
static SEND_HANDLER: OnceCell<SendHandler<SqsMessageQueue>> = OnceCell::const_new();

/// SendHandlerを取得（初期化されていなければ初期化）
async fn get_send_handler() -> Result<&'static SendHandler<SqsMessageQueue>, ConfigError> {
    SEND_HANDLER
        .get_or_try_init(|| async {
            let config = MessageBusConfig::from_env().await?;
            let queue_url = config.settings().queue_url()?.to_string();
            Ok(SendHandler::new(
                SqsMessageQueue::new(config.sqs().clone()),
                queue_url,
            ))
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
async fn handler(request: Request) -> Result<Response<Body>, Error> {
    let outcome = match get_send_handler().await {
        Ok(send_handler) => {
            send_handler
                .send(content_type(&request), body_bytes(&request))
                .await
        }
        Err(err) => {
            error!(error = %err, "設定読み込み失敗");
            SendOutcome::Fault(err.to_string())
        }
    };

    info!(status_code = outcome.status_code(), "メッセージ送信レスポンス送信");

    Ok(send_response(&outcome)?)
}
