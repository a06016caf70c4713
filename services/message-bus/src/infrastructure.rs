// Infrastructure layer modules
pub mod api_request;
pub mod api_response;
pub mod config;
pub mod logging;
pub mod message_queue;
pub mod message_store;

// Re-exports
pub use api_request::{body_bytes, content_type, path_id};
pub use api_response::{json_response, lookup_response, send_response};
pub use config::{ConfigError, MessageBusConfig, MessageBusSettings};
pub use logging::init_logging;
pub use message_queue::{MessageQueue, QueueError, SqsMessageQueue};
pub use message_store::{DynamoMessageStore, MessageStore, PutReceipt, StoreError};
