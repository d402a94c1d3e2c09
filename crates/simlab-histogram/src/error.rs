//! ヒストグラム操作のエラー型

use alloc::string::String;

use simlab_wire::DecodeError;
use thiserror::Error;

/// 差分更新の失敗
///
/// どの場合もレコードは変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// コピー更新なのに id が異なる
    #[error("Histogram id mismatch: record {expected:?}, update {found:?}")]
    IdentityMismatch { expected: String, found: String },
    /// コピー更新なのにビン数が異なる
    #[error("Bin count mismatch for {id:?}: record has {expected}, update has {found}")]
    BinCountMismatch { id: String, expected: u32, found: u32 },
    /// 更新ペイロードのデコード失敗
    #[error("Update decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// 適合度計算の失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FitError {
    /// ビン数が一致しない
    #[error("Cannot compare histograms with {theory} and {data} bins")]
    ShapeMismatch { theory: u32, data: u32 },
    /// 両方のヒストグラムが空のビンがある（比較が定義されない）
    #[error("Both histograms are empty at bin {bin}")]
    BothEmpty { bin: usize },
}
