//! セッションのエラー型

use alloc::string::String;

use thiserror::Error;

/// コマンド（begin_simulation / abort など）の同期エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// チャンネルがまだ開いていない
    #[error("Channel is not connected")]
    NotConnected,
    /// チャンネルは閉じている（connect で再接続が必要）
    #[error("Channel is closed")]
    ChannelClosed,
    /// パラメータを制御メッセージにできない
    #[error("Invalid simulation parameters: {0}")]
    InvalidParams(String),
    /// 設定 JSON が不正
    #[error("Invalid session config: {0}")]
    InvalidConfig(String),
}

/// 保留中のシミュレーションが失敗として終わった理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// abort で中止した
    #[error("Simulation cancelled")]
    Cancelled,
    /// 別のシミュレーションの開始で置き換えられた
    #[error("Simulation superseded by a newer request")]
    Superseded,
    /// サーバーが sim_failed を返した
    #[error("Simulation failed: {0}")]
    Failed(String),
    /// チャンネルが閉じた
    #[error("Channel closed while simulation was pending")]
    ChannelClosed,
    /// チャンネルでエラーが起きた
    #[error("Channel error: {0}")]
    ChannelError(String),
}
