//! # simlab-histogram
//!
//! ヒストグラムのデータモデル。
//!
//! シミュレーション結果の `HistogramRecord` と、比較対象の実験データを埋め込んだ
//! `ReferenceRecord` を定義する。`no_std` + `alloc` 環境（WASM を含む）で動作する。
//!
//! ## ビンの並び
//!
//! ```text
//! 1 ビン = 6 × f64 LE
//!   [y, y_err_plus, y_err_minus, x, x_err_plus, x_err_minus]
//! ```
//!
//! ビンは位置で対応付ける。同じ id の参照ヒストグラムとは i 番目同士を比較する。
//!
//! ## ヒストグラム本体の Wire Format
//!
//! ```text
//! [id: string]          ← id ヒントがない場合のみ
//! [bin_count: u32 LE]
//! [event_count: u32 LE]
//! [bins: bin_count × 6 × f64 LE]
//! ```

#![no_std]
extern crate alloc;

mod bounds;
mod error;
mod fit;
mod record;
mod reference;

pub use bounds::{Bounds, LOG_SCALE_FLOOR};
pub use error::{FitError, UpdateError};
pub use fit::DEFAULT_UNCERTAINTY;
pub use record::{Bin, HistogramRecord, VALUES_PER_BIN};
pub use reference::{
    write_reference, ObservableInfo, ReferenceFormat, ReferenceImages, ReferenceMetadata,
    ReferenceRecord, DEFAULT_IMAGE_MIME,
};
