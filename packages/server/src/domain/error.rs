//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("emoji must not be empty")]
    EmptyEmoji,

    #[error("emoji is too long ({actual} bytes, max {max})")]
    EmojiTooLong { max: usize, actual: usize },
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// 一意制約違反
    #[error("conflict: {0}")]
    Conflict(String),

    /// ストレージ側の障害
    #[error("storage failure: {0}")]
    Storage(String),
}

/// MessagePusher 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// Hub が繰り返し停止したため登録できなかった
    #[error("hub for meeting {0} is unavailable")]
    HubUnavailable(i64),
}
