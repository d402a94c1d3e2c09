//! ヒストグラムレコード
//!
//! 観測量ごとのビン列とメタデータ。ビン列は自分で所有し、
//! 変更は `apply_update` による一括置き換えだけで行う。

use alloc::string::String;
use alloc::vec::Vec;

use serde::Serialize;
use simlab_wire::{ByteCursor, ByteWriter, DecodeError};

use crate::error::UpdateError;

/// 1 ビンあたりの f64 の数
pub const VALUES_PER_BIN: usize = 6;

/// 1 つのビン（y と x、それぞれ非対称な上下の誤差付き）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bin {
    pub y: f64,
    pub y_err_plus: f64,
    pub y_err_minus: f64,
    pub x: f64,
    pub x_err_plus: f64,
    pub x_err_minus: f64,
}

impl Bin {
    /// ワイヤ上の並び `[y, y+, y-, x, x+, x-]` から作る
    pub fn from_array(v: [f64; VALUES_PER_BIN]) -> Self {
        Bin {
            y: v[0],
            y_err_plus: v[1],
            y_err_minus: v[2],
            x: v[3],
            x_err_plus: v[4],
            x_err_minus: v[5],
        }
    }

    /// ワイヤ上の並びに戻す
    pub fn to_array(&self) -> [f64; VALUES_PER_BIN] {
        [
            self.y,
            self.y_err_plus,
            self.y_err_minus,
            self.x,
            self.x_err_plus,
            self.x_err_minus,
        ]
    }

    fn from_chunk(chunk: &[f64]) -> Self {
        let mut v = [0.0; VALUES_PER_BIN];
        v.copy_from_slice(chunk);
        Self::from_array(v)
    }
}

/// デコード済みのヒストグラム本体（適用前の一時値）
struct DecodedBody {
    id: String,
    bins: Vec<Bin>,
    event_count: u64,
}

impl DecodedBody {
    fn read(cursor: &mut ByteCursor<'_>, id_hint: Option<&str>) -> Result<Self, DecodeError> {
        let id = match id_hint {
            Some(id) => String::from(id),
            None => cursor.read_string()?,
        };
        let bin_count = cursor.read_u32()? as usize;
        let event_count = u64::from(cursor.read_u32()?);
        let values = cursor.read_f64_array(bin_count.saturating_mul(VALUES_PER_BIN))?;
        let bins = values.chunks_exact(VALUES_PER_BIN).map(Bin::from_chunk).collect();

        Ok(DecodedBody { id, bins, event_count })
    }
}

/// 観測量 1 つ分のヒストグラム
///
/// ## 不変条件
/// - `bin_count() == bins().len()`（ビン数はビン列の長さそのもの）
/// - `is_empty()` は一度も更新が適用されていない間だけ true
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramRecord {
    id: String,
    bins: Vec<Bin>,
    event_count: u64,
    interpolated: bool,
    is_empty: bool,
}

impl HistogramRecord {
    /// 空のレコードを作る（ビンはゼロ埋め、`is_empty() == true`）
    pub fn empty(id: impl Into<String>, bin_count: u32) -> Self {
        HistogramRecord {
            id: id.into(),
            bins: alloc::vec![Bin::default(); bin_count as usize],
            event_count: 0,
            interpolated: false,
            is_empty: true,
        }
    }

    /// 値を直接与えて作る（サーバー実装・テスト用）
    pub fn from_bins(id: impl Into<String>, bins: Vec<Bin>, event_count: u64) -> Self {
        HistogramRecord {
            id: id.into(),
            bins,
            event_count,
            interpolated: false,
            is_empty: false,
        }
    }

    /// バッファからヒストグラム全体をデコードする
    ///
    /// # 引数
    /// - `id_hint`: `None` の場合は先頭の id 文字列も読む
    pub fn decode_full(
        cursor: &mut ByteCursor<'_>,
        id_hint: Option<&str>,
    ) -> Result<Self, DecodeError> {
        let body = DecodedBody::read(cursor, id_hint)?;
        Ok(HistogramRecord {
            id: body.id,
            bins: body.bins,
            event_count: body.event_count,
            interpolated: false,
            is_empty: false,
        })
    }

    /// 差分更新を適用する
    ///
    /// 更新ペイロードは一時領域に全部デコードしてから検証するため、
    /// 失敗してもレコードは一切変更されない。一方、カーソルはエントリ末尾まで
    /// 進むので、後続エントリのデコードはずれない。
    ///
    /// # 引数
    /// - `id_hint`: `None` の場合はペイロード先頭の id 文字列を読む
    /// - `expect_copy`: true なら id とビン数が現在の値と一致しなければならない
    /// - `interpolated`: 補間結果による更新か
    ///
    /// # エラー
    /// - `UpdateError::IdentityMismatch` / `UpdateError::BinCountMismatch`: コピー更新の不一致
    /// - `UpdateError::Decode`: ペイロードが途中で切れている
    pub fn apply_update(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        id_hint: Option<&str>,
        expect_copy: bool,
        interpolated: bool,
    ) -> Result<(), UpdateError> {
        let body = DecodedBody::read(cursor, id_hint)?;

        if expect_copy {
            if body.id != self.id {
                return Err(UpdateError::IdentityMismatch {
                    expected: self.id.clone(),
                    found: body.id,
                });
            }
            if body.bins.len() != self.bins.len() {
                return Err(UpdateError::BinCountMismatch {
                    id: self.id.clone(),
                    expected: self.bin_count(),
                    found: body.bins.len() as u32,
                });
            }
        }

        self.id = body.id;
        self.bins = body.bins;
        self.event_count = body.event_count;
        self.interpolated = interpolated;
        self.is_empty = false;
        Ok(())
    }

    /// ヒストグラム本体を書き出す（`decode_full` の逆）
    pub fn encode(&self, w: &mut ByteWriter, include_id: bool) {
        if include_id {
            w.write_string(&self.id);
        }
        w.write_u32(self.bin_count());
        w.write_u32(u32::try_from(self.event_count).unwrap_or(u32::MAX));
        for bin in &self.bins {
            w.write_f64_slice(&bin.to_array());
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bin_count(&self) -> u32 {
        self.bins.len() as u32
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn bin(&self, index: usize) -> Option<&Bin> {
        self.bins.get(index)
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn is_interpolated(&self) -> bool {
        self.interpolated
    }

    /// 一度も更新が適用されていないか
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }
}
