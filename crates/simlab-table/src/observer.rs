//! テーブル変更の通知先

use simlab_histogram::{HistogramRecord, ReferenceRecord};

/// テーブルの変更を受け取るオブザーバー
///
/// 必要なメソッドだけ実装すればよい。呼び出しは登録順。
/// 通知中はテーブルを借用しているので、通知の中から登録・解除はできない。
pub trait TableObserver {
    /// 設定フレームでエントリが追加された
    fn on_added(&mut self, _record: &HistogramRecord, _reference: &ReferenceRecord) {}

    /// データフレームでレコードが更新された（ビン列の置き換え完了後）
    fn on_updated(&mut self, _record: &HistogramRecord, _reference: &ReferenceRecord) {}

    /// 設定フレーム（またはクリア）でエントリが削除される
    fn on_removed(&mut self, _record: &HistogramRecord, _reference: &ReferenceRecord) {}
}

/// 登録したオブザーバーの識別子（解除に使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(pub(crate) u64);

impl ObserverId {
    /// FFI 越しに渡すための数値
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(raw: u64) -> Self {
        ObserverId(raw)
    }
}
