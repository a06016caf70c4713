/// SQSキュー参照
///
/// メッセージ削除（ACK）に使うキューURLを表す。SQSイベントのレコードには
/// キューURLが含まれないため、`eventSourceArn` から組み立てる。
use thiserror::Error;

/// キュー参照の解決エラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueueRefError {
    /// ARNの形式が不正
    #[error("Invalid SQS queue ARN: {0}")]
    InvalidArn(String),
}

/// キューURL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRef {
    url: String,
}

impl QueueRef {
    /// キューURLから直接作成
    pub fn from_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// SQSキューARNからキューURLを導出
    ///
    /// `arn:<partition>:sqs:<region>:<account>:<name>` を
    /// `https://sqs.<region>.<domain>/<account>/<name>` に変換する。
    pub fn from_arn(arn: &str) -> Result<Self, QueueRefError> {
        let parts: Vec<&str> = arn.split(':').collect();

        if parts.len() != 6 || parts[0] != "arn" || parts[2] != "sqs" {
            return Err(QueueRefError::InvalidArn(arn.to_string()));
        }

        let (partition, region, account, name) = (parts[1], parts[3], parts[4], parts[5]);
        if region.is_empty() || account.is_empty() || name.is_empty() {
            return Err(QueueRefError::InvalidArn(arn.to_string()));
        }

        let domain = match partition {
            "aws-cn" => "amazonaws.com.cn",
            _ => "amazonaws.com",
        };

        Ok(Self {
            url: format!("https://sqs.{}.{}/{}/{}", region, domain, account, name),
        })
    }

    /// キューURLを取得
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_arn() {
        let queue =
            QueueRef::from_arn("arn:aws:sqs:eu-west-1:123456789012:MessageBusStack-MessageQueue")
                .unwrap();
        assert_eq!(
            queue.url(),
            "https://sqs.eu-west-1.amazonaws.com/123456789012/MessageBusStack-MessageQueue"
        );
    }

    #[test]
    fn test_from_arn_china_partition() {
        let queue = QueueRef::from_arn("arn:aws-cn:sqs:cn-north-1:123456789012:queue").unwrap();
        assert_eq!(
            queue.url(),
            "https://sqs.cn-north-1.amazonaws.com.cn/123456789012/queue"
        );
    }

    #[test]
    fn test_from_arn_rejects_other_service() {
        let result = QueueRef::from_arn("arn:aws:sns:eu-west-1:123456789012:topic");
        assert!(matches!(result, Err(QueueRefError::InvalidArn(_))));
    }

    #[test]
    fn test_from_arn_rejects_garbage() {
        assert!(QueueRef::from_arn("").is_err());
        assert!(QueueRef::from_arn("not-an-arn").is_err());
        assert!(QueueRef::from_arn("arn:aws:sqs:eu-west-1::queue").is_err());
    }

    #[test]
    fn test_from_url() {
        let queue = QueueRef::from_url("https://sqs.eu-west-1.amazonaws.com/1/q");
        assert_eq!(queue.url(), "https://sqs.eu-west-1.amazonaws.com/1/q");
    }
}
