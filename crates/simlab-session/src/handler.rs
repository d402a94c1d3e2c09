//! シミュレーション結果の受け取り口
//!
//! 補間は 1 回で終わる。本実行は途中経過を何度でも受け取り、最後に 1 回終わる。
//! 終了系のメソッドは `self: Box<Self>` を取るので、2 回呼ばれることはない。

use alloc::boxed::Box;
use alloc::vec::Vec;

use serde::Serialize;
use simlab_histogram::HistogramRecord;
use simlab_table::HistogramTable;

use crate::error::SimulationError;

/// ある時点のテーブル内容のコピー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub histograms: Vec<HistogramRecord>,
    /// 補間結果か
    pub interpolated: bool,
}

impl Snapshot {
    pub fn capture(table: &HistogramTable, interpolated: bool) -> Self {
        Snapshot {
            histograms: table.iter().map(|(record, _)| record.clone()).collect(),
            interpolated,
        }
    }

    pub fn get(&self, id: &str) -> Option<&HistogramRecord> {
        self.histograms.iter().find(|h| h.id() == id)
    }

    /// 最大イベント数（途中経過の進み具合の目安）
    pub fn event_count(&self) -> u64 {
        self.histograms.iter().map(HistogramRecord::event_count).max().unwrap_or(0)
    }
}

/// 補間（推定）の結果を 1 回だけ受け取る
pub trait InterpolationHandler {
    fn on_complete(self: Box<Self>, snapshot: &Snapshot);
    fn on_failed(self: Box<Self>, error: &SimulationError);
}

/// `FnOnce(Result<..>)` をそのまま補間ハンドラとして使う
impl<F> InterpolationHandler for F
where
    F: FnOnce(Result<&Snapshot, &SimulationError>),
{
    fn on_complete(self: Box<Self>, snapshot: &Snapshot) {
        (*self)(Ok(snapshot))
    }

    fn on_failed(self: Box<Self>, error: &SimulationError) {
        (*self)(Err(error))
    }
}

/// 本実行の途中経過と結果を受け取る
pub trait RunHandler {
    /// データフレームを受信するたびに呼ばれる
    fn on_data(&mut self, snapshot: &Snapshot);

    /// sim_completed を受信した。途中経過が一度も無ければ `None`
    fn on_complete(self: Box<Self>, last: Option<&Snapshot>);

    fn on_failed(self: Box<Self>, error: &SimulationError);
}

/// begin_simulation に渡す要求
pub enum SimulationRequest {
    Interpolate(Box<dyn InterpolationHandler>),
    Run(Box<dyn RunHandler>),
}

impl SimulationRequest {
    pub fn interpolate(handler: impl InterpolationHandler + 'static) -> Self {
        SimulationRequest::Interpolate(Box::new(handler))
    }

    pub fn run(handler: impl RunHandler + 'static) -> Self {
        SimulationRequest::Run(Box::new(handler))
    }
}
