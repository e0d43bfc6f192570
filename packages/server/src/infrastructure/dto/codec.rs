//! Protocol codec
//!
//! 受信フレームは2段階でデコードします。
//!
//! 1. `{"type": string, "data": any}` の封筒として解析
//! 2. `type` に対応する形で `data` を解析
//!
//! 未知の `type` はエラーではなく `InboundFrame::Unrecognized` として返し、
//! 応答（`UNKNOWN_TYPE`）を返すかどうかは呼び出し側が決めます。

use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::Frame;

use super::websocket::{
    ErrorBody, ErrorCode, HistoryPayload, MessagePayload, OutboundFrame, ReactionPayload,
    TypingPayload,
};

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// デコード済みの受信フレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Message(MessagePayload),
    Reaction(ReactionPayload),
    Typing(TypingPayload),
    History(HistoryPayload),
    Unrecognized(String),
}

/// 認識できる受信フレームの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Message,
    Reaction,
    Typing,
    History,
}

impl FrameKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "message" => Some(FrameKind::Message),
            "reaction" => Some(FrameKind::Reaction),
            "typing" => Some(FrameKind::Typing),
            "history" => Some(FrameKind::History),
            _ => None,
        }
    }

    fn invalid_data_code(self) -> ErrorCode {
        match self {
            FrameKind::Message => ErrorCode::InvalidMessageData,
            FrameKind::Reaction => ErrorCode::InvalidReactionData,
            FrameKind::Typing => ErrorCode::InvalidTypingData,
            FrameKind::History => ErrorCode::InvalidHistoryData,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameKind::Message => "message",
            FrameKind::Reaction => "reaction",
            FrameKind::Typing => "typing",
            FrameKind::History => "history",
        };
        f.write_str(name)
    }
}

/// 受信フレームのデコードエラー
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// 封筒として解析できない
    #[error("invalid frame envelope: {0}")]
    InvalidFormat(#[source] serde_json::Error),

    /// `data` が `type` に対応する形ではない
    #[error("invalid {kind} data: {source}")]
    InvalidData {
        kind: FrameKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ProtocolError::InvalidFormat(_) => ErrorCode::InvalidFormat,
            ProtocolError::InvalidData { kind, .. } => kind.invalid_data_code(),
        }
    }

    /// 送信者に返すエラー応答
    pub fn to_error_body(&self) -> ErrorBody {
        let details = match self {
            ProtocolError::InvalidFormat(source) => source.to_string(),
            ProtocolError::InvalidData { source, .. } => source.to_string(),
        };
        ErrorBody::new(self.code(), details)
    }
}

/// 受信フレームをデコード
pub fn decode_frame(bytes: &[u8]) -> Result<InboundFrame, ProtocolError> {
    let envelope: RawEnvelope =
        serde_json::from_slice(bytes).map_err(ProtocolError::InvalidFormat)?;

    let Some(kind) = FrameKind::parse(&envelope.kind) else {
        return Ok(InboundFrame::Unrecognized(envelope.kind));
    };

    let frame = match kind {
        FrameKind::Message => InboundFrame::Message(parse_data(kind, envelope.data)?),
        FrameKind::Reaction => InboundFrame::Reaction(parse_data(kind, envelope.data)?),
        FrameKind::Typing => InboundFrame::Typing(parse_data(kind, envelope.data)?),
        FrameKind::History => InboundFrame::History(parse_data(kind, envelope.data)?),
    };
    Ok(frame)
}

fn parse_data<T: DeserializeOwned>(kind: FrameKind, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidData { kind, source })
}

/// 送信フレームをエンコード
///
/// 結果は受信者間で共有できる `Frame`（`Arc<str>`）です。
pub fn encode_frame(frame: &OutboundFrame) -> Result<Frame, serde_json::Error> {
    serde_json::to_string(frame).map(Frame::from)
}
