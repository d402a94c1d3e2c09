//! ヒストグラムテーブル本体
//!
//! エントリはスロット配列に格納し、id → スロット番号の索引で引く。
//! スロットは設定フレームの間は動かないので、`HistogramHandle` で安定して参照できる。

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use simlab_histogram::{
    HistogramRecord, ReferenceFormat, ReferenceRecord, UpdateError, DEFAULT_IMAGE_MIME,
};
use simlab_wire::{ByteCursor, DecodeError, TableHeader};

use crate::observer::{ObserverId, TableObserver};

/// テーブル内のエントリへの安定したハンドル
///
/// 次の設定フレームで世代が進むと無効になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistogramHandle {
    index: u32,
    generation: u32,
}

/// 1 エントリ（シミュレーション結果 + 参照）
struct Slot {
    record: HistogramRecord,
    reference: ReferenceRecord,
}

/// 設定フレームの処理結果
///
/// 件数は発行した削除・追加通知の数と一致する。フレーム内で id が重複した場合は
/// 置き換えた分も数えるので、`added` はテーブルの件数より多くなる。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigSummary {
    pub removed: usize,
    pub added: usize,
}

/// データフレームの処理結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSummary {
    /// 更新できた id
    pub updated: Vec<String>,
    /// テーブルにない id（読み飛ばした）
    pub skipped_unknown: Vec<String>,
    /// 更新を拒否した id とその理由
    pub rejected: Vec<(String, UpdateError)>,
}

#[derive(Clone, Copy)]
enum Event {
    Added,
    Updated,
    Removed,
}

/// 通知先の登録簿（登録順を保つ）
#[derive(Default)]
struct Observers {
    entries: Vec<(ObserverId, Box<dyn TableObserver>)>,
    next_id: u64,
}

impl Observers {
    fn notify(&mut self, event: Event, slot: &Slot) {
        for (_, observer) in self.entries.iter_mut() {
            match event {
                Event::Added => observer.on_added(&slot.record, &slot.reference),
                Event::Updated => observer.on_updated(&slot.record, &slot.reference),
                Event::Removed => observer.on_removed(&slot.record, &slot.reference),
            }
        }
    }
}

/// id をキーにしたヒストグラムテーブル
///
/// ## 不変条件
/// - 各エントリのレコードのビン数は、対応する参照ヒストグラムのビン数と等しい
pub struct HistogramTable {
    format: ReferenceFormat,
    image_mime: String,
    generation: u32,
    slots: Vec<Slot>,
    index: BTreeMap<String, usize>,
    observers: Observers,
}

impl HistogramTable {
    /// 空のテーブルを作る
    ///
    /// # 引数
    /// - `format`: 設定フレームに入っている参照レコードの形式
    pub fn new(format: ReferenceFormat) -> Self {
        Self::with_image_mime(format, DEFAULT_IMAGE_MIME)
    }

    pub fn with_image_mime(format: ReferenceFormat, image_mime: &str) -> Self {
        HistogramTable {
            format,
            image_mime: String::from(image_mime),
            generation: 0,
            slots: Vec::new(),
            index: BTreeMap::new(),
            observers: Observers::default(),
        }
    }

    /// オブザーバーを登録する
    pub fn subscribe(&mut self, observer: Box<dyn TableObserver>) -> ObserverId {
        let id = ObserverId(self.observers.next_id);
        self.observers.next_id += 1;
        self.observers.entries.push((id, observer));
        id
    }

    /// オブザーバーを解除して返す
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn TableObserver>> {
        let pos = self.observers.entries.iter().position(|(oid, _)| *oid == id)?;
        Some(self.observers.entries.remove(pos).1)
    }

    /// 設定フレームのペイロードを処理する（カーソルはテーブルヘッダーの位置）
    ///
    /// 参照レコードを全件デコードしてからテーブルを作り直す。
    /// デコードに失敗した場合はフレームごと破棄し、テーブルも通知も変化しない。
    pub fn handle_config_frame(
        &mut self,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<ConfigSummary, DecodeError> {
        let header = TableHeader::read(cursor)?;

        let mut references = Vec::new();
        for _ in 0..header.count {
            references.push(ReferenceRecord::decode(cursor, self.format, &self.image_mime)?);
        }

        let mut summary = ConfigSummary { removed: self.clear(), added: 0 };

        for reference in references {
            let record = HistogramRecord::empty(reference.id(), reference.bin_count());
            let slot = Slot { record, reference };

            let pos = match self.index.get(slot.reference.id()) {
                Some(&pos) => {
                    // 同じフレーム内で id が重複した場合は後勝ち
                    tracing::warn!(id = %slot.reference.id(), "duplicate histogram id in configuration frame");
                    self.observers.notify(Event::Removed, &self.slots[pos]);
                    summary.removed += 1;
                    self.slots[pos] = slot;
                    pos
                }
                None => {
                    self.index.insert(String::from(slot.reference.id()), self.slots.len());
                    self.slots.push(slot);
                    self.slots.len() - 1
                }
            };
            self.observers.notify(Event::Added, &self.slots[pos]);
            summary.added += 1;
        }

        tracing::debug!(
            removed = summary.removed,
            added = summary.added,
            generation = self.generation,
            "configuration frame applied"
        );
        Ok(summary)
    }

    /// データフレームのペイロードを処理する（カーソルはテーブルヘッダーの位置）
    ///
    /// エントリ単位の失敗（未知の id、id/ビン数の不一致）は警告を出して次へ進む。
    /// バッファが途中で切れている場合はそこで打ち切り `Err` を返す。
    /// それまでに適用したエントリは更新済みのまま残る。
    ///
    /// # 引数
    /// - `interpolated`: このフレームが補間結果か（レコードのフラグに反映）
    pub fn handle_data_frame(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        interpolated: bool,
    ) -> Result<DataSummary, DecodeError> {
        let header = TableHeader::read(cursor)?;
        let mut summary = DataSummary::default();

        for _ in 0..header.count {
            let id = cursor.read_string()?;

            let Some(&pos) = self.index.get(&id) else {
                // 読み飛ばすために本体をデコードして捨てる
                HistogramRecord::decode_full(cursor, Some(&id))?;
                tracing::warn!(id = %id, "data frame references unknown histogram, skipped");
                summary.skipped_unknown.push(id);
                continue;
            };

            let slot = &mut self.slots[pos];
            match slot.record.apply_update(cursor, Some(&id), true, interpolated) {
                Ok(()) => {
                    self.observers.notify(Event::Updated, &self.slots[pos]);
                    summary.updated.push(id);
                }
                Err(UpdateError::Decode(e)) => return Err(e),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "histogram update rejected");
                    summary.rejected.push((id, e));
                }
            }
        }

        tracing::debug!(
            updated = summary.updated.len(),
            skipped = summary.skipped_unknown.len(),
            rejected = summary.rejected.len(),
            "data frame applied"
        );
        Ok(summary)
    }

    /// 全エントリを削除する（削除通知付き）。削除した件数を返す
    pub fn clear(&mut self) -> usize {
        for slot in &self.slots {
            self.observers.notify(Event::Removed, slot);
        }
        let removed = self.slots.len();
        self.slots.clear();
        self.index.clear();
        self.generation = self.generation.wrapping_add(1);
        removed
    }

    pub fn get(&self, id: &str) -> Option<(&HistogramRecord, &ReferenceRecord)> {
        let pos = *self.index.get(id)?;
        let slot = &self.slots[pos];
        Some((&slot.record, &slot.reference))
    }

    pub fn handle_of(&self, id: &str) -> Option<HistogramHandle> {
        let pos = *self.index.get(id)?;
        Some(HistogramHandle { index: pos as u32, generation: self.generation })
    }

    /// ハンドルで引く。古い世代のハンドルなら `None`
    pub fn get_by_handle(
        &self,
        handle: HistogramHandle,
    ) -> Option<(&HistogramRecord, &ReferenceRecord)> {
        if handle.generation != self.generation {
            return None;
        }
        let slot = self.slots.get(handle.index as usize)?;
        Some((&slot.record, &slot.reference))
    }

    /// 設定フレームでの並び順に列挙する
    pub fn iter(&self) -> impl Iterator<Item = (&HistogramRecord, &ReferenceRecord)> {
        self.slots.iter().map(|s| (&s.record, &s.reference))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn format(&self) -> ReferenceFormat {
        self.format
    }
}
