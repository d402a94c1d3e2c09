//! 参照レコード（実験データ + 説明メタデータ）
//!
//! 設定フレームで観測量ごとに 1 つ届く。サーバーの種類によって 2 通りの形がある。
//!
//! ## JSON メタデータ形式
//! ```text
//! [config: string (JSON)]
//! [title_image: blob][x_label_image: blob][y_label_image: blob]
//! [reference: ヒストグラム本体（id 付き）]
//! ```
//!
//! ## コンパクト形式
//! ```text
//! [id: string][name: string]
//! [title_image: blob][x_label_image: blob][y_label_image: blob]
//! [reference: ヒストグラム本体（id 付き）]
//! ```
//!
//! どちらの形かはバイト列を見て推測せず、`ReferenceFormat` の設定で決める。

use alloc::string::String;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use simlab_wire::{ByteCursor, ByteWriter, DecodeError};

use crate::record::HistogramRecord;

/// 画像 blob の MIME タイプのデフォルト値
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// 参照レコードのワイヤ形式（デプロイ設定）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFormat {
    /// JSON の設定文字列 + 画像 3 枚 + 参照ヒストグラム
    #[default]
    JsonMetadata,
    /// id + 名前 + 画像 3 枚 + 参照ヒストグラム
    Compact,
}

/// JSON メタデータ形式で届く観測量の説明
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservableInfo {
    pub id: Option<String>,
    pub title: String,
    pub short: String,
    pub group: String,
    #[serde(alias = "desc")]
    pub description: String,
}

/// 形式ごとの説明メタデータ
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceMetadata {
    /// JSON メタデータ形式。`raw` は受け取った JSON そのもの（未知のキーを含む）
    Json { info: ObservableInfo, raw: Option<Value> },
    /// コンパクト形式。名前だけを持つ
    Compact { name: String },
}

impl ReferenceMetadata {
    pub fn format(&self) -> ReferenceFormat {
        match self {
            ReferenceMetadata::Json { .. } => ReferenceFormat::JsonMetadata,
            ReferenceMetadata::Compact { .. } => ReferenceFormat::Compact,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ReferenceMetadata::Json { info, .. } => &info.title,
            ReferenceMetadata::Compact { name } => name,
        }
    }

    /// 短い表示名。JSON 形式で `short` が空ならタイトルを使う
    pub fn short_name(&self) -> &str {
        match self {
            ReferenceMetadata::Json { info, .. } if !info.short.is_empty() => &info.short,
            _ => self.title(),
        }
    }

    pub fn group(&self) -> &str {
        match self {
            ReferenceMetadata::Json { info, .. } => &info.group,
            ReferenceMetadata::Compact { .. } => "",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ReferenceMetadata::Json { info, .. } => &info.description,
            ReferenceMetadata::Compact { .. } => "",
        }
    }
}

/// タイトル・軸ラベルの画像（data URI）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReferenceImages {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl ReferenceImages {
    fn read(cursor: &mut ByteCursor<'_>, mime: &str) -> Result<Self, DecodeError> {
        Ok(ReferenceImages {
            title: cursor.read_blob_as_data_uri(mime)?,
            x_label: cursor.read_blob_as_data_uri(mime)?,
            y_label: cursor.read_blob_as_data_uri(mime)?,
        })
    }
}

/// 参照レコード
///
/// デコード後は変更しない。埋め込みの参照ヒストグラムは比較の基準値。
///
/// ## 不変条件
/// - `reference().id() == id()`
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    id: String,
    metadata: ReferenceMetadata,
    images: ReferenceImages,
    reference: HistogramRecord,
}

impl ReferenceRecord {
    /// 参照レコードを 1 件デコードする
    ///
    /// # エラー
    /// - `DecodeError::Truncated`: バッファ不足
    /// - `DecodeError::BadJson`: 設定 JSON が壊れている
    /// - `DecodeError::IdMismatch`: 外側の id と参照ヒストグラムの id が異なる
    pub fn decode(
        cursor: &mut ByteCursor<'_>,
        format: ReferenceFormat,
        image_mime: &str,
    ) -> Result<Self, DecodeError> {
        let (declared_id, metadata) = match format {
            ReferenceFormat::JsonMetadata => {
                let raw = cursor.read_json()?;
                let info: ObservableInfo = match &raw {
                    Some(v) => serde_json::from_value(v.clone()).map_err(DecodeError::bad_json)?,
                    None => ObservableInfo::default(),
                };
                (info.id.clone(), ReferenceMetadata::Json { info, raw })
            }
            ReferenceFormat::Compact => {
                let id = cursor.read_string()?;
                let name = cursor.read_string()?;
                (Some(id), ReferenceMetadata::Compact { name })
            }
        };

        let images = ReferenceImages::read(cursor, image_mime)?;
        let reference = HistogramRecord::decode_full(cursor, None)?;

        if let Some(expected) = declared_id {
            if expected != reference.id() {
                return Err(DecodeError::IdMismatch {
                    expected,
                    found: String::from(reference.id()),
                });
            }
        }

        Ok(ReferenceRecord {
            id: String::from(reference.id()),
            metadata,
            images,
            reference,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn metadata(&self) -> &ReferenceMetadata {
        &self.metadata
    }

    pub fn images(&self) -> &ReferenceImages {
        &self.images
    }

    /// 比較基準の参照ヒストグラム
    pub fn reference(&self) -> &HistogramRecord {
        &self.reference
    }

    pub fn bin_count(&self) -> u32 {
        self.reference.bin_count()
    }
}

/// 参照レコードを書き出す（`ReferenceRecord::decode` の逆、サーバー実装・テスト用）
///
/// 形式は `metadata` の種類で決まる。
pub fn write_reference(
    w: &mut ByteWriter,
    metadata: &ReferenceMetadata,
    images: [&[u8]; 3],
    reference: &HistogramRecord,
) {
    match metadata {
        ReferenceMetadata::Json { raw, .. } => {
            w.write_json(raw.as_ref());
        }
        ReferenceMetadata::Compact { name } => {
            w.write_string(reference.id());
            w.write_string(name);
        }
    }
    for image in images {
        w.write_blob(image);
    }
    reference.encode(w, true);
}
