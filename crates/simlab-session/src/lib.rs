//! # simlab-session
//!
//! ラボセッションの状態機械。
//!
//! 1 本の双方向チャンネル（WebSocket）上で、制御メッセージ（JSON テキスト）と
//! バイナリフレーム（設定・データ）を多重化する。実際の送受信は呼び出し側が行い、
//! このクレートは「送るべきテキスト」を返し、「受け取ったもの」を処理するだけ。
//!
//! ## 接続状態
//!
//! ```text
//! Connecting → Open   (on_open: handshake を送る)
//!            → Closed (on_close / on_channel_error)
//! Closed → Connecting (connect: 再接続)
//! ```
//!
//! ## シミュレーションモード
//!
//! ```text
//! Idle → Interpolating  (begin_simulation: 補間)
//! Idle → Running        (begin_simulation: 本実行)
//!
//! Interpolating → Idle  次のデータフレームで完了（1 回だけ）
//! Running → Running     データフレームごとに途中経過
//! Running → Idle        sim_completed で完了（最後のスナップショット付き）
//! any → Idle            sim_failed / チャンネルエラー / abort / 別の開始
//! ```
//!
//! 2 つのモードは同時に保留されない。新しく開始すると、保留中のものは
//! 先に `SimulationError::Superseded` で終わらせる。

#![no_std]
extern crate alloc;

pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod session;

pub use config::SessionConfig;
pub use error::{ProtocolError, SimulationError};
pub use handler::{InterpolationHandler, RunHandler, SimulationRequest, Snapshot};
pub use message::{ClientAction, ServerMessage};
pub use session::{ConnectionState, FrameOutcome, ServerEvent, SessionProtocol, SimulationMode};

/// handshake で送るプロトコルバージョン
pub const DEFAULT_PROTOCOL_VERSION: &str = "2";

/// カイ二乗に上乗せする理論値の相対不確かさ
pub const DEFAULT_FIT_UNCERTAINTY: f64 = simlab_histogram::DEFAULT_UNCERTAINTY;
