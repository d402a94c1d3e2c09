//! # simlab-wire
//!
//! シミュレーションラボのバイナリワイヤフォーマット実装。
//!
//! サーバーから WebSocket で届くバイナリフレームを読み出す `ByteCursor` と、
//! 同じ形式を書き出す `ByteWriter`（サーバー実装・テスト用）を提供する。
//!
//! ## フレームの Wire Format
//!
//! ```text
//! [reserved: u32 LE][reserved: u32 LE]   ← FrameLayout::ReservedHeader の場合のみ
//! [frame_kind: u8]                       ← 0x01 = 設定フレーム, 0x02 = データフレーム
//! [num_histograms: u32 LE][reserved: u32 LE]
//! [entry × num_histograms]
//! ```
//!
//! ## 文字列・blob のパディング
//!
//! ```text
//! string: [len: u16 LE][bytes × len][pad]   pad = (8 - (len + 2) % 8) % 8
//! blob:   [len: u32 LE][bytes × len][pad]   pad = (8 - (len + 4) % 8) % 8
//! ```
//!
//! 送信側は固定ストライドのライターを使うため、各フィールドは 8 バイト境界に揃う。
//! パディング計算を一つでも誤ると以降のオフセットがすべてずれるので注意。

#![no_std]
extern crate alloc;

pub mod cursor;
pub mod error;
pub mod frame;
pub mod writer;

pub use cursor::ByteCursor;
pub use error::DecodeError;
pub use frame::{FrameHeader, FrameKind, FrameLayout, TableHeader};
pub use writer::ByteWriter;

/// 文字列・blob の後ろに入るパディング長を計算する
///
/// # 引数
/// - `prefixed_len`: 長さプレフィックスを含めたバイト数（`len + 2` または `len + 4`）
///
/// # 例
/// ```
/// use simlab_wire::padding_for;
/// assert_eq!(padding_for(2), 6);   // 空文字列
/// assert_eq!(padding_for(8), 0);
/// assert_eq!(padding_for(13), 3);
/// ```
pub const fn padding_for(prefixed_len: usize) -> usize {
    (8 - prefixed_len % 8) % 8
}
