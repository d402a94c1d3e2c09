//! # simlab-table
//!
//! ヒストグラムテーブル（フレームの振り分けと変更通知）
//!
//! 設定フレームでテーブル全体を作り直し、データフレームで既存エントリを
//! その場で書き換える。描画側が同じレコードを参照し続けられるよう、
//! データフレームではレコードを置き換えずに `apply_update` で中身だけ更新する。
//!
//! ## フレーム処理の流れ
//!
//! ```text
//! 設定フレーム:
//!   1. 参照レコードを全件デコード（失敗したらテーブルは変更しない）
//!   2. 現在の全エントリについて on_removed
//!   3. テーブルを空にして世代を進める
//!   4. 新しいエントリごとに空のレコードを作り on_added
//!
//! データフレーム:
//!   1. エントリごとに id を読む
//!   2. 未知の id → 読み飛ばして警告
//!   3. 既知の id → apply_update（コピー更新）→ on_updated
//! ```

#![no_std]
extern crate alloc;

pub mod observer;
pub mod table;

pub use observer::{ObserverId, TableObserver};
pub use table::{ConfigSummary, DataSummary, HistogramHandle, HistogramTable};
