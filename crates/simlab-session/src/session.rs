//! ラボセッション状態機械
//!
//! 接続状態、保留中のシミュレーション、ヒストグラムテーブルを持つ。
//! 送受信は呼び出し側（`simlab-wasm` クレート）が担当する。

use alloc::boxed::Box;
use alloc::string::String;
use core::mem;

use serde_json::{Map, Value};
use simlab_table::{ConfigSummary, DataSummary, HistogramTable};
use simlab_wire::{ByteCursor, DecodeError, FrameHeader, FrameKind};

use crate::config::SessionConfig;
use crate::error::{ProtocolError, SimulationError};
use crate::handler::{InterpolationHandler, RunHandler, SimulationRequest, Snapshot};
use crate::message::{ClientAction, ServerMessage};

/// チャンネルの接続状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// 現在保留中のシミュレーションの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Idle,
    Interpolating,
    Running,
}

/// 保留中のシミュレーション（同時に 1 つまで）
enum Pending {
    None,
    Interpolation(Box<dyn InterpolationHandler>),
    Run {
        handler: Box<dyn RunHandler>,
        last: Option<Snapshot>,
    },
}

impl Pending {
    fn mode(&self) -> SimulationMode {
        match self {
            Pending::None => SimulationMode::Idle,
            Pending::Interpolation(_) => SimulationMode::Interpolating,
            Pending::Run { .. } => SimulationMode::Running,
        }
    }
}

/// 制御メッセージを処理した結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// サーバーからの状況通知（表示用）
    Status(String),
    /// サーバーからのエラー通知（表示用、保留中のシミュレーションには影響しない）
    Error(String),
    /// 本実行が完了した
    Completed,
    /// シミュレーションが失敗した
    Failed(String),
    /// 知らない action、または対応する保留が無い完了通知
    Ignored(String),
}

/// バイナリフレームを処理した結果
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Configured(ConfigSummary),
    Data {
        summary: DataSummary,
        /// 受信時点のモード
        mode: SimulationMode,
    },
}

/// ラボセッション
///
/// ## 不変条件
/// - 補間と本実行は同時に保留されない
/// - 保留中のシミュレーションは必ずちょうど 1 回、完了か失敗で終わる
pub struct SessionProtocol {
    config: SessionConfig,
    connection: ConnectionState,
    table: HistogramTable,
    pending: Pending,
    last_snapshot: Option<Snapshot>,
}

impl SessionProtocol {
    /// 新しいセッションを作る（接続中状態から始まる）
    pub fn new(config: SessionConfig) -> Self {
        let table = HistogramTable::with_image_mime(config.reference_format, &config.image_mime);
        SessionProtocol {
            config,
            connection: ConnectionState::Connecting,
            table,
            pending: Pending::None,
            last_snapshot: None,
        }
    }

    /// 閉じたチャンネルを開き直す
    pub fn connect(&mut self) {
        if self.connection == ConnectionState::Closed {
            tracing::debug!("reconnecting lab channel");
            self.connection = ConnectionState::Connecting;
        }
    }

    /// チャンネルが開いた。送るべき handshake を返す
    pub fn on_open(&mut self) -> Result<String, ProtocolError> {
        self.connection = ConnectionState::Open;
        tracing::info!(lab = %self.config.lab_id, version = %self.config.protocol_version, "lab channel open");
        ClientAction::Handshake {
            version: self.config.protocol_version.clone(),
            lab: self.config.lab_id.clone(),
        }
        .to_json()
    }

    /// チャンネルが閉じた。保留中のシミュレーションは失敗で終わる
    pub fn on_close(&mut self) {
        tracing::info!("lab channel closed");
        self.connection = ConnectionState::Closed;
        self.resolve_pending(SimulationError::ChannelClosed);
    }

    /// チャンネルでエラーが起きた。保留中のシミュレーションは失敗で終わる
    pub fn on_channel_error(&mut self, message: &str) {
        tracing::warn!(error = %message, "lab channel error");
        self.connection = ConnectionState::Closed;
        self.resolve_pending(SimulationError::ChannelError(String::from(message)));
    }

    /// シミュレーションを開始する。送るべき制御メッセージを返す
    ///
    /// 保留中のシミュレーションがあれば、種類に関係なく先に
    /// `SimulationError::Superseded` で終わらせる。
    ///
    /// # エラー
    /// - `ProtocolError::NotConnected` / `ChannelClosed`: チャンネルが開いていない
    ///   （この場合 `request` は呼ばれずに破棄される）
    pub fn begin_simulation(
        &mut self,
        params: &Map<String, Value>,
        request: SimulationRequest,
    ) -> Result<String, ProtocolError> {
        self.ensure_open()?;

        let action = match &request {
            SimulationRequest::Interpolate(_) => ClientAction::SimEstimate(params.clone()),
            SimulationRequest::Run(_) => ClientAction::SimStart(params.clone()),
        };
        let text = action.to_json()?;

        self.resolve_pending(SimulationError::Superseded);
        self.pending = match request {
            SimulationRequest::Interpolate(handler) => Pending::Interpolation(handler),
            SimulationRequest::Run(handler) => Pending::Run { handler, last: None },
        };
        tracing::debug!(mode = ?self.pending.mode(), "simulation requested");
        Ok(text)
    }

    /// 補間を要求する
    pub fn begin_interpolation(
        &mut self,
        params: &Map<String, Value>,
        handler: impl InterpolationHandler + 'static,
    ) -> Result<String, ProtocolError> {
        self.begin_simulation(params, SimulationRequest::interpolate(handler))
    }

    /// 本実行を開始する
    pub fn begin_run(
        &mut self,
        params: &Map<String, Value>,
        handler: impl RunHandler + 'static,
    ) -> Result<String, ProtocolError> {
        self.begin_simulation(params, SimulationRequest::run(handler))
    }

    /// 実行中のシミュレーションを中止する。送るべき sim_abort を返す
    ///
    /// 保留中のシミュレーションは `SimulationError::Cancelled` で終わる。
    pub fn abort(&mut self) -> Result<String, ProtocolError> {
        self.ensure_open()?;
        let text = ClientAction::SimAbort {}.to_json()?;
        self.resolve_pending(SimulationError::Cancelled);
        Ok(text)
    }

    /// 受信した制御メッセージを処理する
    pub fn handle_text(&mut self, text: &str) -> Result<ServerEvent, DecodeError> {
        let message = ServerMessage::parse(text).map_err(|e| {
            tracing::warn!(error = %e, "malformed control message");
            e
        })?;

        Ok(match message {
            ServerMessage::Status(message) => {
                tracing::debug!(status = %message, "server status");
                ServerEvent::Status(message)
            }
            ServerMessage::Error(message) => {
                tracing::warn!(error = %message, "server reported error");
                ServerEvent::Error(message)
            }
            ServerMessage::SimCompleted => self.complete_run(),
            ServerMessage::SimFailed(message) => {
                tracing::warn!(error = %message, "simulation failed");
                self.resolve_pending(SimulationError::Failed(message.clone()));
                ServerEvent::Failed(message)
            }
            ServerMessage::Unknown(action) => {
                tracing::debug!(action = %action, "unknown control message ignored");
                ServerEvent::Ignored(action)
            }
        })
    }

    /// 受信したバイナリフレームを処理する
    ///
    /// デコードに失敗したフレームは破棄し、保留中のシミュレーションには触れない。
    pub fn handle_binary(&mut self, bytes: &[u8]) -> Result<FrameOutcome, DecodeError> {
        self.route_frame(bytes).map_err(|e| {
            tracing::warn!(error = %e, len = bytes.len(), "binary frame dropped");
            e
        })
    }

    fn route_frame(&mut self, bytes: &[u8]) -> Result<FrameOutcome, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        let header = FrameHeader::read(&mut cursor, self.config.frame_layout)?;

        match header.kind {
            FrameKind::Configuration => {
                let summary = self.table.handle_config_frame(&mut cursor)?;
                Ok(FrameOutcome::Configured(summary))
            }
            FrameKind::Data => {
                let mode = self.pending.mode();
                let interpolated = mode == SimulationMode::Interpolating;
                let summary = self.table.handle_data_frame(&mut cursor, interpolated)?;
                self.deliver_data(interpolated);
                Ok(FrameOutcome::Data { summary, mode })
            }
        }
    }

    /// データフレーム適用後の通知
    fn deliver_data(&mut self, interpolated: bool) {
        let snapshot = Snapshot::capture(&self.table, interpolated);

        match mem::replace(&mut self.pending, Pending::None) {
            Pending::None => {}
            Pending::Interpolation(handler) => {
                handler.on_complete(&snapshot);
            }
            Pending::Run { mut handler, .. } => {
                handler.on_data(&snapshot);
                self.pending = Pending::Run { handler, last: Some(snapshot.clone()) };
            }
        }
        self.last_snapshot = Some(snapshot);
    }

    fn complete_run(&mut self) -> ServerEvent {
        match mem::replace(&mut self.pending, Pending::None) {
            Pending::Run { handler, last } => {
                tracing::debug!(received = last.is_some(), "simulation completed");
                handler.on_complete(last.as_ref());
                ServerEvent::Completed
            }
            other => {
                self.pending = other;
                tracing::debug!("sim_completed without a pending run");
                ServerEvent::Ignored(String::from("sim_completed"))
            }
        }
    }

    /// 保留中のシミュレーションを失敗で終わらせる
    fn resolve_pending(&mut self, error: SimulationError) {
        match mem::replace(&mut self.pending, Pending::None) {
            Pending::None => {}
            Pending::Interpolation(handler) => {
                tracing::debug!(reason = %error, "interpolation resolved as failed");
                handler.on_failed(&error);
            }
            Pending::Run { handler, .. } => {
                tracing::debug!(reason = %error, "run resolved as failed");
                handler.on_failed(&error);
            }
        }
    }

    fn ensure_open(&self) -> Result<(), ProtocolError> {
        match self.connection {
            ConnectionState::Open => Ok(()),
            ConnectionState::Connecting => Err(ProtocolError::NotConnected),
            ConnectionState::Closed => Err(ProtocolError::ChannelClosed),
        }
    }

    pub fn mode(&self) -> SimulationMode {
        self.pending.mode()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn table(&self) -> &HistogramTable {
        &self.table
    }

    /// オブザーバー登録用
    pub fn table_mut(&mut self) -> &mut HistogramTable {
        &mut self.table
    }

    /// 最後にデータフレームを受信した時点のスナップショット
    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use simlab_histogram::{
        write_reference, Bin, HistogramRecord, ReferenceFormat, ReferenceMetadata,
    };
    use simlab_wire::{ByteWriter, FrameLayout, TableHeader};

    type Log = Rc<RefCell<Vec<String>>>;

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    /// 補間ハンドラ（ログに結果を書く）
    fn interp(name: &'static str, log: &Log) -> impl InterpolationHandler + 'static {
        let log = log.clone();
        move |result: Result<&Snapshot, &SimulationError>| {
            let entry = match result {
                Ok(s) => format!("{name}:complete:{}", s.interpolated),
                Err(e) => format!("{name}:failed:{e:?}"),
            };
            log.borrow_mut().push(entry);
        }
    }

    struct RunRecorder {
        log: Log,
    }

    impl RunHandler for RunRecorder {
        fn on_data(&mut self, snapshot: &Snapshot) {
            self.log.borrow_mut().push(format!("run:data:{}", snapshot.event_count()));
        }
        fn on_complete(self: Box<Self>, last: Option<&Snapshot>) {
            let n = last.map(Snapshot::event_count);
            self.log.borrow_mut().push(format!("run:complete:{n:?}"));
        }
        fn on_failed(self: Box<Self>, error: &SimulationError) {
            self.log.borrow_mut().push(format!("run:failed:{error:?}"));
        }
    }

    fn config() -> SessionConfig {
        SessionConfig {
            lab_id: "lab-7".to_string(),
            frame_layout: FrameLayout::ReservedHeader,
            reference_format: ReferenceFormat::Compact,
            ..SessionConfig::default()
        }
    }

    fn open_session() -> SessionProtocol {
        let mut session = SessionProtocol::new(config());
        session.on_open().unwrap();
        session
    }

    fn bins(ys: &[f64]) -> Vec<Bin> {
        ys.iter()
            .enumerate()
            .map(|(i, y)| Bin::from_array([*y, 0.5, 0.5, i as f64, 0.5, 0.5]))
            .collect()
    }

    fn config_frame(ids: &[(&str, usize)]) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_frame_header(&FrameHeader::new(FrameKind::Configuration), FrameLayout::ReservedHeader);
        w.write_table_header(&TableHeader::new(ids.len() as u32));
        for (id, n) in ids {
            let metadata = ReferenceMetadata::Compact { name: id.to_string() };
            let reference = HistogramRecord::from_bins(*id, bins(&vec![1.0; *n]), 1000);
            write_reference(&mut w, &metadata, [b"t", b"x", b"y"], &reference);
        }
        w.into_bytes()
    }

    fn data_frame(entries: &[(&str, &[f64])], events: u64) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_frame_header(&FrameHeader::new(FrameKind::Data), FrameLayout::ReservedHeader);
        w.write_table_header(&TableHeader::new(entries.len() as u32));
        for (id, ys) in entries {
            w.write_string(id);
            HistogramRecord::from_bins(*id, bins(ys), events).encode(&mut w, false);
        }
        w.into_bytes()
    }

    fn params() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("energy".to_string(), Value::from(91.2));
        map
    }

    #[test]
    fn test_on_open_returns_handshake() {
        let mut session = SessionProtocol::new(config());
        assert_eq!(session.connection(), ConnectionState::Connecting);

        let text = session.on_open().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["action"], "handshake");
        assert_eq!(value["param"]["lab"], "lab-7");
        assert_eq!(session.connection(), ConnectionState::Open);
    }

    #[test]
    fn test_begin_requires_open_channel() {
        let log = new_log();
        let mut session = SessionProtocol::new(config());
        assert_eq!(
            session.begin_interpolation(&params(), interp("a", &log)),
            Err(ProtocolError::NotConnected)
        );

        session.on_open().unwrap();
        session.on_close();
        assert_eq!(session.abort(), Err(ProtocolError::ChannelClosed));
        assert!(log.borrow().is_empty());

        session.connect();
        assert_eq!(session.connection(), ConnectionState::Connecting);
    }

    #[test]
    fn test_begin_simulation_messages() {
        let log = new_log();
        let mut session = open_session();

        let text = session.begin_interpolation(&params(), interp("a", &log)).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["action"], "sim_estimate");
        assert_eq!(value["param"]["energy"], 91.2);
        assert_eq!(session.mode(), SimulationMode::Interpolating);

        let text = session.begin_run(&params(), RunRecorder { log: log.clone() }).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["action"], "sim_start");
        assert_eq!(session.mode(), SimulationMode::Running);
        assert_eq!(*log.borrow(), vec!["a:failed:Superseded"]);
    }

    #[test]
    fn test_interpolation_supersedes_run() {
        let log = new_log();
        let mut session = open_session();
        session.handle_binary(&config_frame(&[("/obs/pt", 3)])).unwrap();

        session.begin_run(&params(), RunRecorder { log: log.clone() }).unwrap();
        session.handle_binary(&data_frame(&[("/obs/pt", &[1.0, 2.0, 3.0][..])], 50)).unwrap();
        session.begin_interpolation(&params(), interp("b", &log)).unwrap();
        assert_eq!(session.mode(), SimulationMode::Interpolating);

        session.handle_binary(&data_frame(&[("/obs/pt", &[2.0, 2.0, 2.0][..])], 60)).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["run:data:50", "run:failed:Superseded", "b:complete:true"]
        );

        // 置き換えられた本実行の完了通知は誰にも届かない
        let event = session.handle_text(r#"{"action":"sim_completed"}"#).unwrap();
        assert_eq!(event, ServerEvent::Ignored("sim_completed".to_string()));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_interpolation_twice_cancels_first_once() {
        let log = new_log();
        let mut session = open_session();
        session.handle_binary(&config_frame(&[("/obs/pt", 3)])).unwrap();

        session.begin_interpolation(&params(), interp("first", &log)).unwrap();
        session.begin_interpolation(&params(), interp("second", &log)).unwrap();
        session.handle_binary(&data_frame(&[("/obs/pt", &[1.0, 2.0, 3.0][..])], 10)).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["first:failed:Superseded", "second:complete:true"]
        );
        assert_eq!(session.mode(), SimulationMode::Idle);
    }

    #[test]
    fn test_interpolation_completes_exactly_once() {
        let log = new_log();
        let mut session = open_session();
        session.handle_binary(&config_frame(&[("/obs/pt", 3)])).unwrap();
        session.begin_interpolation(&params(), interp("a", &log)).unwrap();

        let frame = data_frame(&[("/obs/pt", &[1.0, 2.0, 3.0][..])], 10);
        let outcome = session.handle_binary(&frame).unwrap();
        assert!(matches!(outcome, FrameOutcome::Data { mode: SimulationMode::Interpolating, .. }));

        // 2 枚目は補間扱いにならない
        let outcome = session.handle_binary(&frame).unwrap();
        assert!(matches!(outcome, FrameOutcome::Data { mode: SimulationMode::Idle, .. }));

        assert_eq!(*log.borrow(), vec!["a:complete:true"]);
        let (record, _) = session.table().get("/obs/pt").unwrap();
        assert!(!record.is_interpolated());
        assert_eq!(record.bins()[2].y, 3.0);
    }

    #[test]
    fn test_run_lifecycle() {
        let log = new_log();
        let mut session = open_session();
        session.handle_binary(&config_frame(&[("/obs/pt", 2)])).unwrap();
        session.begin_run(&params(), RunRecorder { log: log.clone() }).unwrap();

        session.handle_binary(&data_frame(&[("/obs/pt", &[1.0, 2.0][..])], 100)).unwrap();
        session.handle_binary(&data_frame(&[("/obs/pt", &[2.0, 4.0][..])], 200)).unwrap();
        assert_eq!(session.mode(), SimulationMode::Running);

        let event = session.handle_text(r#"{"action":"sim_completed"}"#).unwrap();
        assert_eq!(event, ServerEvent::Completed);
        assert_eq!(
            *log.borrow(),
            vec!["run:data:100", "run:data:200", "run:complete:Some(200)"]
        );
        assert_eq!(session.mode(), SimulationMode::Idle);
        assert_eq!(session.last_snapshot().map(Snapshot::event_count), Some(200));
        assert!(!session.last_snapshot().unwrap().interpolated);
    }

    #[test]
    fn test_run_completed_without_data() {
        let log = new_log();
        let mut session = open_session();
        session.begin_run(&params(), RunRecorder { log: log.clone() }).unwrap();
        session.handle_text(r#"{"action":"sim_completed"}"#).unwrap();
        assert_eq!(*log.borrow(), vec!["run:complete:None"]);
    }

    #[test]
    fn test_completed_without_run_is_ignored() {
        let log = new_log();
        let mut session = open_session();
        session.begin_interpolation(&params(), interp("a", &log)).unwrap();

        let event = session.handle_text(r#"{"action":"sim_completed"}"#).unwrap();
        assert_eq!(event, ServerEvent::Ignored("sim_completed".to_string()));
        assert_eq!(session.mode(), SimulationMode::Interpolating);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_sim_failed_resolves_pending() {
        let log = new_log();
        let mut session = open_session();
        session.begin_run(&params(), RunRecorder { log: log.clone() }).unwrap();

        let event =
            session.handle_text(r#"{"action":"sim_failed","param":{"message":"diverged"}}"#).unwrap();
        assert_eq!(event, ServerEvent::Failed("diverged".to_string()));
        assert_eq!(*log.borrow(), vec![r#"run:failed:Failed("diverged")"#]);
        assert_eq!(session.mode(), SimulationMode::Idle);
    }

    #[test]
    fn test_abort_cancels_pending() {
        let log = new_log();
        let mut session = open_session();
        session.handle_binary(&config_frame(&[("/obs/pt", 3)])).unwrap();
        session.begin_interpolation(&params(), interp("a", &log)).unwrap();

        let text = session.abort().unwrap();
        assert_eq!(text, r#"{"action":"sim_abort","param":{}}"#);
        assert_eq!(*log.borrow(), vec!["a:failed:Cancelled"]);

        // 中止後に届いたデータフレームは補間扱いにならず、コールバックも呼ばれない
        let frame = data_frame(&[("/obs/pt", &[1.0, 2.0, 3.0][..])], 10);
        let outcome = session.handle_binary(&frame).unwrap();
        assert!(matches!(outcome, FrameOutcome::Data { mode: SimulationMode::Idle, .. }));
        assert!(!session.table().get("/obs/pt").unwrap().0.is_interpolated());
        assert_eq!(*log.borrow(), vec!["a:failed:Cancelled"]);

        // 保留が無くても abort は送れる
        assert!(session.abort().is_ok());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_abort_run_ignores_late_frames() {
        let log = new_log();
        let mut session = open_session();
        session.handle_binary(&config_frame(&[("/obs/pt", 2)])).unwrap();
        session.begin_run(&params(), RunRecorder { log: log.clone() }).unwrap();
        session.handle_binary(&data_frame(&[("/obs/pt", &[1.0, 2.0][..])], 100)).unwrap();

        session.abort().unwrap();
        session.handle_binary(&data_frame(&[("/obs/pt", &[3.0, 4.0][..])], 200)).unwrap();
        session.handle_text(r#"{"action":"sim_completed"}"#).unwrap();

        assert_eq!(*log.borrow(), vec!["run:data:100", "run:failed:Cancelled"]);
        assert_eq!(session.mode(), SimulationMode::Idle);
    }

    #[test]
    fn test_channel_error_resolves_pending() {
        let log = new_log();
        let mut session = open_session();
        session.begin_run(&params(), RunRecorder { log: log.clone() }).unwrap();

        session.on_channel_error("reset by peer");
        assert_eq!(session.connection(), ConnectionState::Closed);
        assert_eq!(*log.borrow(), vec![r#"run:failed:ChannelError("reset by peer")"#]);

        session.on_close();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_malformed_frame_keeps_pending() {
        let log = new_log();
        let mut session = open_session();
        session.handle_binary(&config_frame(&[("/obs/pt", 3)])).unwrap();
        session.begin_interpolation(&params(), interp("a", &log)).unwrap();

        let mut frame = data_frame(&[("/obs/pt", &[1.0, 2.0, 3.0][..])], 10);
        frame.truncate(frame.len() - 4);
        assert!(session.handle_binary(&frame).is_err());
        assert_eq!(
            session.handle_binary(&[0, 0, 0]),
            Err(DecodeError::Truncated { offset: 0, needed: 4, remaining: 3 })
        );

        assert!(log.borrow().is_empty());
        assert_eq!(session.mode(), SimulationMode::Interpolating);
    }

    #[test]
    fn test_unknown_and_status_messages() {
        let mut session = open_session();
        assert_eq!(
            session.handle_text(r#"{"action":"status","param":{"message":"queued"}}"#).unwrap(),
            ServerEvent::Status("queued".to_string())
        );
        assert_eq!(
            session.handle_text(r#"{"action":"heartbeat"}"#).unwrap(),
            ServerEvent::Ignored("heartbeat".to_string())
        );
        assert!(session.handle_text("{").is_err());
    }
}
