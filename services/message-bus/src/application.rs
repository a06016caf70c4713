// アプリケーション層モジュール
pub mod ingestion_worker;
pub mod lookup_handler;
pub mod send_handler;

// 再エクスポート
pub use ingestion_worker::{
    EnvelopeError, IngestionError, IngestionSummary, IngestionWorker, ProcessAction,
};
pub use lookup_handler::LookupHandler;
pub use send_handler::SendHandler;
