//! 制御メッセージ（JSON テキスト）
//!
//! どちらの方向も `{"action": "...", "param": {...}}` の形をとる。
//!
//! | 方向 | action | param |
//! |------|--------|-------|
//! | 送信 | `handshake` | `{version, lab}` |
//! | 送信 | `sim_start` | 入力パラメータ |
//! | 送信 | `sim_estimate` | 入力パラメータ |
//! | 送信 | `sim_abort` | `{}` |
//! | 受信 | `status` | `{message}` |
//! | 受信 | `error` | `{message}` |
//! | 受信 | `sim_completed` | なし |
//! | 受信 | `sim_failed` | `{message}` |

use alloc::string::{String, ToString};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use simlab_wire::DecodeError;

use crate::error::ProtocolError;

/// クライアントが送る制御メッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "param", rename_all = "snake_case")]
pub enum ClientAction {
    Handshake { version: String, lab: String },
    /// 本実行を開始する
    SimStart(Map<String, Value>),
    /// 補間（推定）を要求する
    SimEstimate(Map<String, Value>),
    SimAbort {},
}

impl ClientAction {
    /// 送信用の JSON テキストにする
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::InvalidParams(e.to_string()))
    }
}

/// サーバーから届く制御メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Status(String),
    Error(String),
    SimCompleted,
    SimFailed(String),
    /// 知らない action（ログに残して無視する）
    Unknown(String),
}

#[derive(Deserialize)]
struct Envelope {
    action: String,
    #[serde(default)]
    param: Value,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct MessageParam {
    message: String,
}

impl ServerMessage {
    /// 受信テキストを解釈する
    ///
    /// `param.message` が無い・型が違う場合は空文字列として扱う。
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(DecodeError::bad_json)?;
        let message = || {
            serde_json::from_value::<MessageParam>(envelope.param.clone())
                .unwrap_or_default()
                .message
        };

        Ok(match envelope.action.as_str() {
            "status" => ServerMessage::Status(message()),
            "error" => ServerMessage::Error(message()),
            "sim_completed" => ServerMessage::SimCompleted,
            "sim_failed" => ServerMessage::SimFailed(message()),
            _ => ServerMessage::Unknown(envelope.action.clone()),
        })
    }
}
