//! LabClient wasm-bindgen エクスポート
//!
//! ラボ Web UI から呼び出す主エントリポイント。
//! セッション状態機械・ヒストグラムテーブル・JS コールバック/Promise を統合する。

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use js_sys::{Array, Function, Promise, JSON};
use serde::Serialize;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

use simlab_histogram::{HistogramRecord, ReferenceImages, ReferenceRecord};
use simlab_session::{
    FrameOutcome, InterpolationHandler, RunHandler, ServerEvent, SessionConfig, SessionProtocol,
    SimulationError, SimulationMode, Snapshot,
};
use simlab_table::{ObserverId, TableObserver};

/// ラボクライアント
///
/// ## 内部アーキテクチャ
///
/// ```text
/// LabClient
///   └── SessionProtocol   (simlab-session) - 接続状態・シミュレーションの保留管理
///         └── HistogramTable (simlab-table) - id → (結果, 参照)
///               └── HistogramRecord / ReferenceRecord (simlab-histogram)
/// ```
///
/// ## 送信
///
/// `onOpen` / `abort` は送るべきテキストを直接返す。
/// `estimate` / `run` は Promise を返すので、送るべきテキストは `takeOutgoing` で取り出す。
///
/// ## スレッド安全性
///
/// WASM はシングルスレッドのため、`!Send + !Sync` を満たす。
/// コールバック（`onData`・`onTableChange`）は `handleBinary` の中から同期的に呼ばれる。
/// その中から同じ LabClient を呼び出すことはできない（Promise の解決は非同期なので問題ない）。
#[wasm_bindgen]
pub struct LabClient {
    session: SessionProtocol,
    /// 未送信の制御メッセージ
    outgoing: Vec<String>,
}

#[wasm_bindgen]
impl LabClient {
    /// ラボクライアントを初期化する
    ///
    /// # 引数
    /// - `config_json`: `SessionConfig` の JSON。省略時はすべてデフォルト
    ///
    /// # 例（TypeScript）
    /// ```typescript
    /// const client = new LabClient();
    /// const client2 = new LabClient('{"reference_format":"compact"}');
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<LabClient, JsError> {
        let config = match config_json.as_deref() {
            Some(text) => SessionConfig::from_json(text)
                .map_err(|e| JsError::new(&format!("Invalid lab config: {}", e)))?,
            None => SessionConfig::default(),
        };
        Ok(LabClient { session: SessionProtocol::new(config), outgoing: Vec::new() })
    }

    /// WebSocket が開いた。送るべき handshake を返す
    #[wasm_bindgen(js_name = "onOpen")]
    pub fn on_open(&mut self) -> Result<String, JsError> {
        self.session
            .on_open()
            .map_err(|e| JsError::new(&format!("Handshake failed: {}", e)))
    }

    /// WebSocket が閉じた。保留中の Promise は reject される
    #[wasm_bindgen(js_name = "onClose")]
    pub fn on_close(&mut self) {
        self.session.on_close();
        self.outgoing.clear();
    }

    /// WebSocket でエラーが起きた。保留中の Promise は reject される
    #[wasm_bindgen(js_name = "onError")]
    pub fn on_error(&mut self, message: &str) {
        self.session.on_channel_error(message);
        self.outgoing.clear();
    }

    /// 閉じたあとに WebSocket を張り直すときに呼ぶ
    pub fn connect(&mut self) {
        self.session.connect();
    }

    /// 受信した制御メッセージ（テキスト）を処理する
    ///
    /// # 戻り値
    /// `{ kind: "status" | "error" | "completed" | "failed" | "ignored", message: string }`
    #[wasm_bindgen(js_name = "handleText")]
    pub fn handle_text(&mut self, text: &str) -> Result<JsValue, JsError> {
        let event = self
            .session
            .handle_text(text)
            .map_err(|e| JsError::new(&format!("Malformed control message: {}", e)))?;
        to_js(&EventView::from(event))
    }

    /// 受信したバイナリフレームを処理する
    ///
    /// # 戻り値
    /// 設定フレーム: `{ kind: "configuration", removed, added }`
    /// データフレーム: `{ kind: "data", mode, updated, skipped_unknown, rejected }`
    ///
    /// # エラー
    /// - フレームのデコード失敗（フレームは破棄される。チャンネルはそのまま使える）
    #[wasm_bindgen(js_name = "handleBinary")]
    pub fn handle_binary(&mut self, bytes: &[u8]) -> Result<JsValue, JsError> {
        let outcome = self
            .session
            .handle_binary(bytes)
            .map_err(|e| JsError::new(&format!("Frame dropped: {}", e)))?;
        to_js(&FrameView::from(outcome))
    }

    /// 補間を要求する
    ///
    /// 次のデータフレームでスナップショットに resolve する。
    /// abort・失敗・切断・別の要求で reject される。
    pub fn estimate(&mut self, params: JsValue) -> Result<Promise, JsError> {
        let params = params_from_js(&params)?;
        let (promise, resolve, reject) = deferred()?;
        let text = self
            .session
            .begin_interpolation(&params, PromiseInterpolation { resolve, reject })
            .map_err(|e| JsError::new(&format!("Cannot start interpolation: {}", e)))?;
        self.outgoing.push(text);
        Ok(promise)
    }

    /// 本実行を開始する
    ///
    /// データフレームごとに `on_data(snapshot)` を呼び、sim_completed で
    /// 最後のスナップショット（無ければ null）に resolve する。
    pub fn run(&mut self, params: JsValue, on_data: Option<Function>) -> Result<Promise, JsError> {
        let params = params_from_js(&params)?;
        let (promise, resolve, reject) = deferred()?;
        let text = self
            .session
            .begin_run(&params, PromiseRun { on_data, resolve, reject })
            .map_err(|e| JsError::new(&format!("Cannot start run: {}", e)))?;
        self.outgoing.push(text);
        Ok(promise)
    }

    /// 実行中のシミュレーションを中止する。送るべき sim_abort を返す
    pub fn abort(&mut self) -> Result<String, JsError> {
        self.session
            .abort()
            .map_err(|e| JsError::new(&format!("Cannot abort: {}", e)))
    }

    /// 未送信の制御メッセージを取り出す
    #[wasm_bindgen(js_name = "takeOutgoing")]
    pub fn take_outgoing(&mut self) -> Array {
        self.outgoing.drain(..).map(|text| JsValue::from_str(&text)).collect()
    }

    /// テーブル変更の通知先を登録する
    ///
    /// `callback(kind, id)` の `kind` は `"added"` / `"updated"` / `"removed"`。
    ///
    /// # 戻り値
    /// 解除用のトークン
    #[wasm_bindgen(js_name = "onTableChange")]
    pub fn on_table_change(&mut self, callback: Function) -> f64 {
        let id = self.session.table_mut().subscribe(Box::new(JsTableObserver { callback }));
        id.as_u64() as f64
    }

    /// `onTableChange` の登録を解除する
    #[wasm_bindgen(js_name = "offTableChange")]
    pub fn off_table_change(&mut self, token: f64) -> bool {
        self.session.table_mut().unsubscribe(ObserverId::from_u64(token as u64)).is_some()
    }

    /// シミュレーション結果と参照のカイ二乗（ビン平均）
    ///
    /// # エラー
    /// - 未知の id
    /// - ビン数が違う、両方空のビンがある
    #[wasm_bindgen(js_name = "chiSquared")]
    pub fn chi_squared(&self, id: &str) -> Result<f64, JsError> {
        let (record, reference) = self.lookup(id)?;
        record
            .chi_squared(reference.reference(), self.session.config().fit_uncertainty)
            .map_err(|e| JsError::new(&format!("Chi-squared failed for {}: {}", id, e)))
    }

    /// ビンごとのカイ二乗
    #[wasm_bindgen(js_name = "chiSquaredPerBin")]
    pub fn chi_squared_per_bin(&self, id: &str) -> Result<Vec<f64>, JsError> {
        let (record, reference) = self.lookup(id)?;
        record
            .chi_squared_per_bin(reference.reference(), self.session.config().fit_uncertainty)
            .map_err(|e| JsError::new(&format!("Chi-squared failed for {}: {}", id, e)))
    }

    /// 描画範囲 `{x_min, x_max, y_min, y_max, y_min_positive}`。空なら null
    pub fn bounds(&self, id: &str, log_protect: bool) -> Result<JsValue, JsError> {
        let (record, _) = self.lookup(id)?;
        match record.bounds(log_protect) {
            Some(bounds) => to_js(&bounds),
            None => Ok(JsValue::NULL),
        }
    }

    /// シミュレーション結果の JSON
    #[wasm_bindgen(js_name = "histogramJson")]
    pub fn histogram_json(&self, id: &str) -> Result<String, JsError> {
        let (record, _) = self.lookup(id)?;
        to_json(record)
    }

    /// 参照（メタデータ・画像・参照ヒストグラム）の JSON
    #[wasm_bindgen(js_name = "referenceJson")]
    pub fn reference_json(&self, id: &str) -> Result<String, JsError> {
        let (_, reference) = self.lookup(id)?;
        to_json(&ReferenceView::from(reference))
    }

    /// 設定フレームの並び順の id 一覧
    #[wasm_bindgen(js_name = "histogramIds")]
    pub fn histogram_ids(&self) -> Array {
        self.session.table().iter().map(|(record, _)| JsValue::from_str(record.id())).collect()
    }

    /// `"idle"` / `"interpolating"` / `"running"`
    pub fn mode(&self) -> String {
        String::from(mode_name(self.session.mode()))
    }

    /// 接続中（handshake 済み）か
    #[wasm_bindgen(js_name = "isOpen")]
    pub fn is_open(&self) -> bool {
        self.session.connection() == simlab_session::ConnectionState::Open
    }
}

impl LabClient {
    fn lookup(&self, id: &str) -> Result<(&HistogramRecord, &ReferenceRecord), JsError> {
        self.session
            .table()
            .get(id)
            .ok_or_else(|| JsError::new(&format!("Unknown histogram: {}", id)))
    }
}

// ==============================================================
// Promise / コールバック
// ==============================================================

/// 未解決の Promise と resolve/reject 関数を作る
fn deferred() -> Result<(Promise, Function, Function), JsError> {
    let mut slot = None;
    let promise = Promise::new(&mut |resolve, reject| {
        slot = Some((resolve, reject));
    });
    let (resolve, reject) =
        slot.ok_or_else(|| JsError::new("Promise executor was not called"))?;
    Ok((promise, resolve, reject))
}

/// 補間の結果を Promise に渡す
struct PromiseInterpolation {
    resolve: Function,
    reject: Function,
}

impl InterpolationHandler for PromiseInterpolation {
    fn on_complete(self: Box<Self>, snapshot: &Snapshot) {
        settle(&self.resolve, snapshot_to_js(Some(snapshot)));
    }

    fn on_failed(self: Box<Self>, error: &SimulationError) {
        settle(&self.reject, error_to_js(error));
    }
}

/// 本実行の途中経過をコールバックに、結果を Promise に渡す
struct PromiseRun {
    on_data: Option<Function>,
    resolve: Function,
    reject: Function,
}

impl RunHandler for PromiseRun {
    fn on_data(&mut self, snapshot: &Snapshot) {
        if let Some(callback) = &self.on_data {
            settle(callback, snapshot_to_js(Some(snapshot)));
        }
    }

    fn on_complete(self: Box<Self>, last: Option<&Snapshot>) {
        settle(&self.resolve, snapshot_to_js(last));
    }

    fn on_failed(self: Box<Self>, error: &SimulationError) {
        settle(&self.reject, error_to_js(error));
    }
}

/// テーブル変更を JS 関数に流す
struct JsTableObserver {
    callback: Function,
}

impl JsTableObserver {
    fn notify(&self, kind: &str, record: &HistogramRecord) {
        let result = self.callback.call2(
            &JsValue::NULL,
            &JsValue::from_str(kind),
            &JsValue::from_str(record.id()),
        );
        if let Err(e) = result {
            tracing::warn!(error = ?e, id = %record.id(), kind, "table change callback threw");
        }
    }
}

impl TableObserver for JsTableObserver {
    fn on_added(&mut self, record: &HistogramRecord, _reference: &ReferenceRecord) {
        self.notify("added", record);
    }

    fn on_updated(&mut self, record: &HistogramRecord, _reference: &ReferenceRecord) {
        self.notify("updated", record);
    }

    fn on_removed(&mut self, record: &HistogramRecord, _reference: &ReferenceRecord) {
        self.notify("removed", record);
    }
}

fn settle(function: &Function, value: JsValue) {
    if let Err(e) = function.call1(&JsValue::NULL, &value) {
        tracing::warn!(error = ?e, "simulation callback threw");
    }
}

fn snapshot_to_js(snapshot: Option<&Snapshot>) -> JsValue {
    match snapshot {
        Some(snapshot) => to_js(snapshot).unwrap_or_else(JsValue::from),
        None => JsValue::NULL,
    }
}

fn error_to_js(error: &SimulationError) -> JsValue {
    JsError::new(&format!("{}", error)).into()
}

// ==============================================================
// JS ⇔ JSON 変換
// ==============================================================

/// JS オブジェクトのパラメータを JSON オブジェクトにする（undefined/null は空）
fn params_from_js(params: &JsValue) -> Result<Map<String, Value>, JsError> {
    if params.is_undefined() || params.is_null() {
        return Ok(Map::new());
    }
    let text: String = JSON::stringify(params)
        .map_err(|_| JsError::new("Simulation parameters are not serializable"))?
        .into();
    serde_json::from_str(&text)
        .map_err(|e| JsError::new(&format!("Simulation parameters must be an object: {}", e)))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization failed: {}", e)))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    let text = to_json(value)?;
    JSON::parse(&text).map_err(|_| JsError::new("JSON.parse rejected serialized value"))
}

fn mode_name(mode: SimulationMode) -> &'static str {
    match mode {
        SimulationMode::Idle => "idle",
        SimulationMode::Interpolating => "interpolating",
        SimulationMode::Running => "running",
    }
}

// ==============================================================
// JS に返すビュー
// ==============================================================

#[derive(Serialize)]
struct EventView {
    kind: &'static str,
    message: String,
}

impl From<ServerEvent> for EventView {
    fn from(event: ServerEvent) -> Self {
        let (kind, message) = match event {
            ServerEvent::Status(m) => ("status", m),
            ServerEvent::Error(m) => ("error", m),
            ServerEvent::Completed => ("completed", String::new()),
            ServerEvent::Failed(m) => ("failed", m),
            ServerEvent::Ignored(action) => ("ignored", action),
        };
        EventView { kind, message }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum FrameView {
    Configuration {
        removed: usize,
        added: usize,
    },
    Data {
        mode: &'static str,
        updated: Vec<String>,
        skipped_unknown: Vec<String>,
        /// `[id, 理由]` の組
        rejected: Vec<(String, String)>,
    },
}

impl From<FrameOutcome> for FrameView {
    fn from(outcome: FrameOutcome) -> Self {
        match outcome {
            FrameOutcome::Configured(summary) => FrameView::Configuration {
                removed: summary.removed,
                added: summary.added,
            },
            FrameOutcome::Data { summary, mode } => FrameView::Data {
                mode: mode_name(mode),
                updated: summary.updated,
                skipped_unknown: summary.skipped_unknown,
                rejected: summary
                    .rejected
                    .into_iter()
                    .map(|(id, e)| (id, format!("{}", e)))
                    .collect(),
            },
        }
    }
}

#[derive(Serialize)]
struct ReferenceView<'a> {
    id: &'a str,
    title: &'a str,
    short_name: &'a str,
    group: &'a str,
    description: &'a str,
    images: &'a ReferenceImages,
    reference: &'a HistogramRecord,
}

impl<'a> From<&'a ReferenceRecord> for ReferenceView<'a> {
    fn from(reference: &'a ReferenceRecord) -> Self {
        let metadata = reference.metadata();
        ReferenceView {
            id: reference.id(),
            title: metadata.title(),
            short_name: metadata.short_name(),
            group: metadata.group(),
            description: metadata.description(),
            images: reference.images(),
            reference: reference.reference(),
        }
    }
}
