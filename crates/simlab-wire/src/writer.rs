//! バイトライター（エンコーダ）
//!
//! `ByteCursor` と対になる書き出し器。サーバー側の実装やテストで
//! バイト単位で正確なフレームを組み立てるために使う。

use alloc::string::String;
use alloc::vec::Vec;

use serde_json::Value;

use crate::frame::{FrameHeader, FrameLayout, TableHeader};
use crate::padding_for;

/// 逐次書き出しバッファ
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter { buf: Vec::with_capacity(capacity) }
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_f64(&mut self, v: f64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_f64_slice(&mut self, values: &[f64]) -> &mut Self {
        for v in values {
            self.write_f64(*v);
        }
        self
    }

    /// 長さ付き文字列を書き出す（`ByteCursor::read_string` の逆）
    ///
    /// Latin-1 で表現できない文字（U+0100 以上）は `?` に置き換える。
    /// u16 に収まらない長さは 65535 文字で切り詰める。
    pub fn write_string(&mut self, s: &str) -> &mut Self {
        let bytes: Vec<u8> = s
            .chars()
            .take(u16::MAX as usize)
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect();
        self.write_u16(bytes.len() as u16);
        self.write_padded_body(&bytes, 2)
    }

    /// 長さ付き blob を書き出す（`ByteCursor::read_blob_as_data_uri` の逆）
    pub fn write_blob(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_u32(bytes.len() as u32);
        self.write_padded_body(bytes, 4)
    }

    /// JSON 値を文字列として書き出す。`None` は空文字列になる
    pub fn write_json(&mut self, value: Option<&Value>) -> &mut Self {
        let text = match value {
            Some(v) => serde_json::to_string(v).unwrap_or_default(),
            None => String::new(),
        };
        self.write_string(&text)
    }

    /// フレーム先頭（予約ヘッダー + 種別バイト）を書き出す
    pub fn write_frame_header(&mut self, header: &FrameHeader, layout: FrameLayout) -> &mut Self {
        if layout == FrameLayout::ReservedHeader {
            let (a, b) = header.reserved.unwrap_or((0, 0));
            self.write_u32(a);
            self.write_u32(b);
        }
        self.write_u8(header.kind.as_byte())
    }

    /// テーブルヘッダー（件数 + 予約）を書き出す
    pub fn write_table_header(&mut self, header: &TableHeader) -> &mut Self {
        self.write_u32(header.count);
        self.write_u32(header.reserved)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_padded_body(&mut self, body: &[u8], prefix_len: usize) -> &mut Self {
        self.buf.extend_from_slice(body);
        let pad = padding_for(body.len() + prefix_len);
        self.buf.extend(core::iter::repeat(0u8).take(pad));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::ByteCursor;
    use crate::frame::FrameKind;

    #[test]
    fn test_write_string_layout() {
        let mut w = ByteWriter::new();
        w.write_string("abc");
        assert_eq!(w.as_bytes(), &[3, 0, b'a', b'b', b'c', 0, 0, 0]);
    }

    #[test]
    fn test_write_string_non_latin1_replaced() {
        let mut w = ByteWriter::new();
        w.write_string("a\u{3042}");
        let bytes = w.into_bytes();
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_string().unwrap(), "a?");
    }

    #[test]
    fn test_write_blob_layout() {
        let mut w = ByteWriter::new();
        w.write_blob(&[1, 2, 3, 4]);
        // 4 + 4 = 8 → パディングなし
        assert_eq!(w.len(), 8);
    }

    #[test]
    fn test_write_frame_header_reserved() {
        let header = FrameHeader { kind: FrameKind::Data, reserved: Some((7, 9)) };

        let mut plain = ByteWriter::new();
        plain.write_frame_header(&header, FrameLayout::Plain);
        assert_eq!(plain.as_bytes(), &[0x02]);

        let mut reserved = ByteWriter::new();
        reserved.write_frame_header(&header, FrameLayout::ReservedHeader);
        assert_eq!(reserved.len(), 9);
        assert_eq!(reserved.as_bytes()[8], 0x02);
    }

    #[test]
    fn test_write_json_roundtrip() {
        let value = serde_json::json!({"id": "/obs/pt", "n": 3});
        let mut w = ByteWriter::new();
        w.write_json(Some(&value)).write_json(None);

        let bytes = w.into_bytes();
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_json().unwrap(), Some(value));
        assert_eq!(cursor.read_json().unwrap(), None);
        assert!(cursor.is_exhausted());
    }
}
