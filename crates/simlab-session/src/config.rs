//! セッション設定
//!
//! デプロイごとに異なるワイヤ形式の選択と、handshake で送る識別子を持つ。
//! JS 側からは JSON 文字列で渡される。
//!
//! ```json
//! {
//!   "protocol_version": "2",
//!   "lab_id": "3f1c...",
//!   "frame_layout": "reserved_header",
//!   "reference_format": "compact",
//!   "fit_uncertainty": 0.05,
//!   "image_mime": "image/png"
//! }
//! ```
//!
//! 省略したキーはデフォルト値になる。

use alloc::string::{String, ToString};

use serde::{Deserialize, Serialize};
use simlab_histogram::{ReferenceFormat, DEFAULT_IMAGE_MIME};
use simlab_wire::FrameLayout;

use crate::error::ProtocolError;
use crate::{DEFAULT_FIT_UNCERTAINTY, DEFAULT_PROTOCOL_VERSION};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// handshake で送るバージョン文字列
    pub protocol_version: String,
    /// handshake で送るラボ/セッションの識別子
    pub lab_id: String,
    /// バイナリフレーム先頭の予約ヘッダーの有無
    pub frame_layout: FrameLayout,
    /// 設定フレーム内の参照レコードの形式
    pub reference_format: ReferenceFormat,
    /// カイ二乗の相対不確かさ
    pub fit_uncertainty: f64,
    /// 画像 blob の MIME タイプ
    pub image_mime: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            protocol_version: String::from(DEFAULT_PROTOCOL_VERSION),
            lab_id: String::new(),
            frame_layout: FrameLayout::default(),
            reference_format: ReferenceFormat::default(),
            fit_uncertainty: DEFAULT_FIT_UNCERTAINTY,
            image_mime: String::from(DEFAULT_IMAGE_MIME),
        }
    }
}

impl SessionConfig {
    /// JSON 文字列から読む
    ///
    /// # エラー
    /// - `ProtocolError::InvalidConfig`: JSON が壊れている、型が合わない、不確かさが負
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let config: SessionConfig = serde_json::from_str(text)
            .map_err(|e| ProtocolError::InvalidConfig(e.to_string()))?;
        if !(config.fit_uncertainty >= 0.0) {
            return Err(ProtocolError::InvalidConfig(String::from(
                "fit_uncertainty must be non-negative",
            )));
        }
        Ok(config)
    }
}
