//! フレームヘッダー
//!
//! ## Wire Format
//! ```text
//! ReservedHeader: [reserved: u32 LE][reserved: u32 LE][kind: u8][payload...]
//! Plain:          [kind: u8][payload...]
//!
//! payload: [num_histograms: u32 LE][reserved: u32 LE][entries...]
//! ```
//!
//! 予約ヘッダーの有無はサーバーの実装ごとに異なるため、
//! 中身を見て推測せず、デプロイ設定（`FrameLayout`）で明示的に選ぶ。

use serde::{Deserialize, Serialize};

use crate::cursor::ByteCursor;
use crate::error::DecodeError;

/// バイナリフレームの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// 設定フレーム: 追跡するヒストグラムと参照データの全定義
    Configuration = 0x01,
    /// データフレーム: 既知のヒストグラムのビン内容の差分更新
    Data = 0x02,
}

impl FrameKind {
    /// 種別バイトから判定する
    pub fn from_byte(byte: u8) -> Result<Self, DecodeError> {
        match byte {
            0x01 => Ok(FrameKind::Configuration),
            0x02 => Ok(FrameKind::Data),
            other => Err(DecodeError::UnknownFrameKind(other)),
        }
    }

    pub fn as_byte(&self) -> u8 {
        *self as u8
    }
}

/// フレーム先頭のレイアウト（デプロイごとの設定）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameLayout {
    /// 種別バイトから始まる
    #[default]
    Plain,
    /// 種別バイトの前に 8 バイト（u32 × 2）の予約ヘッダーがある
    ReservedHeader,
}

impl FrameLayout {
    /// 予約ヘッダーの長さ
    pub const RESERVED_HEADER_LEN: usize = 8;

    /// 種別バイトまでを含むヘッダー長
    pub fn header_len(&self) -> usize {
        match self {
            FrameLayout::Plain => 1,
            FrameLayout::ReservedHeader => Self::RESERVED_HEADER_LEN + 1,
        }
    }
}

/// デコード済みのフレーム先頭
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: FrameKind,
    /// 予約ヘッダーの値（`FrameLayout::Plain` では `None`）
    pub reserved: Option<(u32, u32)>,
}

impl FrameHeader {
    pub fn new(kind: FrameKind) -> Self {
        FrameHeader { kind, reserved: None }
    }

    /// フレーム先頭を読み、カーソルをペイロードの先頭に置く
    pub fn read(cursor: &mut ByteCursor<'_>, layout: FrameLayout) -> Result<Self, DecodeError> {
        let reserved = match layout {
            FrameLayout::Plain => None,
            FrameLayout::ReservedHeader => Some(cursor.read_u32_pair()?),
        };
        let kind = FrameKind::from_byte(cursor.read_u8()?)?;
        Ok(FrameHeader { kind, reserved })
    }
}

/// 設定・データ両フレームのペイロード先頭（件数 + 予約）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableHeader {
    pub count: u32,
    pub reserved: u32,
}

impl TableHeader {
    pub fn new(count: u32) -> Self {
        TableHeader { count, reserved: 0 }
    }

    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let (count, reserved) = cursor.read_u32_pair()?;
        Ok(TableHeader { count, reserved })
    }
}
