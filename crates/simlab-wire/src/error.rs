//! simlab-wire エラー型

use alloc::string::String;

use thiserror::Error;

/// バイナリフレームのデコードエラー
///
/// いずれも現在のフレームに対してのみ致命的。呼び出し側はフレームを破棄し、
/// チャンネルはそのまま維持する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// バッファの終端を越えて読もうとした
    #[error("Buffer truncated: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    Truncated {
        /// 読み出し開始位置
        offset: usize,
        /// 必要なバイト数
        needed: usize,
        /// 残りバイト数
        remaining: usize,
    },
    /// JSON のパースに失敗
    #[error("Malformed JSON payload: {0}")]
    BadJson(String),
    /// 未知のフレーム種別
    #[error("Unknown frame kind: 0x{0:02x}")]
    UnknownFrameKind(u8),
    /// 埋め込まれたヒストグラムの id が外側のレコードと一致しない
    #[error("Histogram id mismatch: expected {expected:?}, found {found:?}")]
    IdMismatch {
        /// 期待した id
        expected: String,
        /// 実際にデコードした id
        found: String,
    },
    /// メタデータに必須フィールドがない
    #[error("Missing field in metadata: {0}")]
    MissingField(&'static str),
}

impl DecodeError {
    /// JSON エラーから `BadJson` を作る
    pub fn bad_json(err: impl core::fmt::Display) -> Self {
        use alloc::string::ToString;
        DecodeError::BadJson(err.to_string())
    }
}
