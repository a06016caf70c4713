/// メッセージバス設定
///
/// 環境変数:
/// - MESSAGE_TABLE_NAME: メッセージ保存用DynamoDBテーブル名
/// - MESSAGE_QUEUE_URL: メッセージキューURL（send_messageでは必須、consumerでは削除先の上書き）
/// - MESSAGE_MAX_RECEIVE_COUNT: デッドレターキューへ移るまでの最大受信回数（デフォルト: 1）
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_sqs::Client as SqsClient;
use thiserror::Error;

/// テーブル名の環境変数
pub const MESSAGE_TABLE_NAME_ENV: &str = "MESSAGE_TABLE_NAME";
/// キューURLの環境変数
pub const MESSAGE_QUEUE_URL_ENV: &str = "MESSAGE_QUEUE_URL";
/// 最大受信回数の環境変数
pub const MESSAGE_MAX_RECEIVE_COUNT_ENV: &str = "MESSAGE_MAX_RECEIVE_COUNT";

/// キュー定義の maxReceiveCount と合わせる
pub const DEFAULT_MAX_RECEIVE_COUNT: u32 = 1;

/// 設定のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// 環境変数から読み込んだ値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBusSettings {
    table_name: Option<String>,
    queue_url: Option<String>,
    max_receive_count: u32,
}

impl MessageBusSettings {
    /// 環境変数から設定を読み込む
    ///
    /// 必須かどうかはLambdaごとに異なるため、欠落はアクセサで検出する。
    /// ここで失敗するのは値が不正な場合のみ。
    pub fn from_env() -> Result<Self, ConfigError> {
        let table_name = read_non_empty(MESSAGE_TABLE_NAME_ENV);
        let queue_url = read_non_empty(MESSAGE_QUEUE_URL_ENV);

        let max_receive_count = match read_non_empty(MESSAGE_MAX_RECEIVE_COUNT_ENV) {
            Some(value) => match value.parse::<u32>() {
                Ok(count) if count > 0 => count,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: MESSAGE_MAX_RECEIVE_COUNT_ENV.to_string(),
                        value,
                    });
                }
            },
            None => DEFAULT_MAX_RECEIVE_COUNT,
        };

        Ok(Self {
            table_name,
            queue_url,
            max_receive_count,
        })
    }

    /// テーブル名を取得（未設定ならエラー）
    pub fn table_name(&self) -> Result<&str, ConfigError> {
        self.table_name
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(MESSAGE_TABLE_NAME_ENV.to_string()))
    }

    /// キューURLを取得（未設定ならエラー）
    pub fn queue_url(&self) -> Result<&str, ConfigError> {
        self.queue_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(MESSAGE_QUEUE_URL_ENV.to_string()))
    }

    /// キューURLの上書き設定
    pub fn queue_url_override(&self) -> Option<&str> {
        self.queue_url.as_deref()
    }

    /// 最大受信回数
    pub fn max_receive_count(&self) -> u32 {
        self.max_receive_count
    }
}

fn read_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// AWSクライアントと設定値をまとめたもの
///
/// Lambda実行環境ごとに一度だけ作成し、ハンドラー間で共有する。
#[derive(Debug, Clone)]
pub struct MessageBusConfig {
    dynamodb: DynamoDbClient,
    sqs: SqsClient,
    settings: MessageBusSettings,
}

impl MessageBusConfig {
    /// 環境からAWS設定を読み込み、クライアントを作成する
    ///
    /// AWS認証情報とリージョンはaws-configにより自動読み込み
    pub async fn from_env() -> Result<Self, ConfigError> {
        let settings = MessageBusSettings::from_env()?;
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        Ok(Self {
            dynamodb: DynamoDbClient::new(&aws_config),
            sqs: SqsClient::new(&aws_config),
            settings,
        })
    }

    /// DynamoDBクライアントへの参照を取得
    pub fn dynamodb(&self) -> &DynamoDbClient {
        &self.dynamodb
    }

    /// SQSクライアントへの参照を取得
    pub fn sqs(&self) -> &SqsClient {
        &self.sqs
    }

    pub fn settings(&self) -> &MessageBusSettings {
        &self.settings
    }
}
