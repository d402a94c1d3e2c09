//! バイトカーソル（デコーダ）
//!
//! 不変のバイト列に対する逐次読み出し器。読み出し位置は単調増加し、
//! 各メソッドはドキュメントに書かれたバイト数だけを消費する。
//! 終端を越える読み出しは `DecodeError::Truncated` になり、位置は進まない。

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use base64::Engine as _;
use serde_json::Value;

use crate::error::DecodeError;
use crate::padding_for;

/// 逐次読み出しカーソル
///
/// 整数はすべてリトルエンディアンで送られてくる。
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// バッファの先頭から読み出すカーソルを作る
    pub fn new(buf: &'a [u8]) -> Self {
        ByteCursor { buf, pos: 0 }
    }

    /// 現在の読み出し位置
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 残りバイト数
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// すべて読み切ったか
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// `n` バイトを切り出して位置を進める
    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// `n` バイト読み飛ばす
    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// 連続する 2 つの u32 を読む（テーブルヘッダーや予約ヘッダー用）
    pub fn read_u32_pair(&mut self) -> Result<(u32, u32), DecodeError> {
        let first = self.read_u32()?;
        let second = self.read_u32()?;
        Ok((first, second))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(f64::from_le_bytes(raw))
    }

    /// `n` 個の f64 を読む（`8n` バイト、パディングなし）
    ///
    /// 長さが残りバイト数を超える場合はメモリを確保する前に失敗する。
    pub fn read_f64_array(&mut self, n: usize) -> Result<Vec<f64>, DecodeError> {
        let needed = n.checked_mul(8).ok_or(DecodeError::Truncated {
            offset: self.pos,
            needed: usize::MAX,
            remaining: self.remaining(),
        })?;
        let bytes = self.take(needed)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect())
    }

    /// 長さ付き文字列を読む
    ///
    /// ## Wire Format
    /// ```text
    /// [len: u16 LE][bytes × len][pad: (8 - (len + 2) % 8) % 8]
    /// ```
    ///
    /// 各バイトは UTF-8 ではなく Latin-1 の 1 コードポイントとして解釈する。
    /// 途中で失敗した場合、位置は呼び出し前に戻る。
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let start = self.pos;
        let result = self.read_padded(2).map(latin1_to_string);
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    /// 長さ付き blob を読み、base64 の data URI に変換する
    ///
    /// ## Wire Format
    /// ```text
    /// [len: u32 LE][bytes × len][pad: (8 - (len + 4) % 8) % 8]
    /// ```
    ///
    /// 戻り値は `"data:<mime>;base64,<b64>"`。
    pub fn read_blob_as_data_uri(&mut self, mime: &str) -> Result<String, DecodeError> {
        let start = self.pos;
        let result = self.read_padded(4).map(|bytes| {
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            format!("data:{};base64,{}", mime, encoded)
        });
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    /// 文字列として埋め込まれた JSON を読む
    ///
    /// 空文字列は「値なし」として `Ok(None)` を返す（エラーではない）。
    pub fn read_json(&mut self) -> Result<Option<Value>, DecodeError> {
        let text = self.read_string()?;
        if text.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(DecodeError::bad_json)
    }

    /// 長さプレフィックス（2 or 4 バイト）付きの本体を読み、パディングを読み飛ばす
    fn read_padded(&mut self, prefix_len: usize) -> Result<&'a [u8], DecodeError> {
        let len = match prefix_len {
            2 => self.read_u16()? as usize,
            _ => self.read_u32()? as usize,
        };
        let body = self.take(len)?;
        self.skip(padding_for(len + prefix_len))?;
        Ok(body)
    }
}

/// Latin-1 バイト列を文字列に変換する（1 バイト = 1 コードポイント）
fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
