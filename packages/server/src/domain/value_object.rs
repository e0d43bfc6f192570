//! 値オブジェクト
//!
//! 識別子はすべて永続化層の整数キーを包む newtype です。
//! 接続 ID のみプロセス内で生成される UUID を使います。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id!(
    /// ミーティング ID
    MeetingId
);
integer_id!(
    /// ユーザー ID
    UserId
);
integer_id!(
    /// メッセージ ID
    MessageId
);
integer_id!(
    /// 添付ファイル ID
    AttachmentId
);
integer_id!(
    /// リアクション ID
    ReactionId
);

/// ライブ接続の ID
///
/// 同じユーザーが同じミーティングに複数の接続を持てるため、
/// Hub のメンバーはユーザー ID ではなくこの ID で区別します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// リアクションの絵文字
///
/// ## 不変条件
///
/// - 空白のみ・空文字列は不可
/// - UTF-8 で 64 バイト以下
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Emoji(String);

impl Emoji {
    pub const MAX_BYTES: usize = 64;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyEmoji);
        }
        if trimmed.len() > Self::MAX_BYTES {
            return Err(ValueObjectError::EmojiTooLong {
                max: Self::MAX_BYTES,
                actual: trimmed.len(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Emoji {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Emoji> for String {
    fn from(emoji: Emoji) -> Self {
        emoji.0
    }
}

impl fmt::Display for Emoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_id_roundtrips_value() {
        // テスト項目: 整数 ID が値を保持し、Display で数値として表示される
        // given (前提条件):
        let meeting_id = MeetingId::new(7);

        // when (操作):
        let displayed = meeting_id.to_string();

        // then (期待する結果):
        assert_eq!(meeting_id.value(), 7);
        assert_eq!(displayed, "7");
        assert_eq!(MeetingId::from(7), meeting_id);
    }

    #[test]
    fn test_integer_id_serializes_transparently() {
        // テスト項目: 整数 ID が JSON 上では素の数値として表現される
        // given (前提条件):
        let user_id = UserId::new(42);

        // when (操作):
        let json = serde_json::to_string(&user_id).unwrap();

        // then (期待する結果):
        assert_eq!(json, "42");
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 生成される接続 ID が毎回異なる
        // given (前提条件):

        // when (操作):
        let first = ConnectionId::generate();
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
    }

    #[test]
    fn test_emoji_valid() {
        // テスト項目: 通常の絵文字は受け付けられ、前後の空白は取り除かれる
        // given (前提条件):
        let raw = " 👍 ".to_string();

        // when (操作):
        let emoji = Emoji::new(raw);

        // then (期待する結果):
        assert_eq!(emoji.unwrap().as_str(), "👍");
    }

    #[test]
    fn test_emoji_empty_rejected() {
        // テスト項目: 空白のみの絵文字はエラーになる
        // given (前提条件):
        let raw = "   ".to_string();

        // when (操作):
        let result = Emoji::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyEmoji));
    }

    #[test]
    fn test_emoji_too_long_rejected() {
        // テスト項目: 64 バイトを超える絵文字はエラーになる
        // given (前提条件):
        let raw = "x".repeat(Emoji::MAX_BYTES + 1);

        // when (操作):
        let result = Emoji::new(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::EmojiTooLong {
                max: Emoji::MAX_BYTES,
                actual: Emoji::MAX_BYTES + 1,
            })
        );
    }
}
