//! tracing → ブラウザコンソール
//!
//! fmt サブスクライバーが整形した 1 行を、イベントのレベルに応じて
//! `console.error` / `console.warn` / `console.info` / `console.debug` に流す。
//! wasm 以外（native テスト）では標準エラー出力に書く。

use std::io;
use std::sync::OnceLock;

use tracing::subscriber::SetGlobalDefaultError;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::FmtSubscriber;

static INITIALISED: OnceLock<()> = OnceLock::new();

/// レベル名を解釈する。`None` は INFO
pub fn parse_level(level: Option<&str>) -> Result<Level, tracing::metadata::ParseLevelError> {
    match level {
        Some(name) => name.trim().parse(),
        None => Ok(Level::INFO),
    }
}

/// グローバルサブスクライバーを設定する（2 回目以降は何もしない）
pub fn install(level: Level) -> Result<(), SetGlobalDefaultError> {
    if INITIALISED.set(()).is_err() {
        return Ok(());
    }

    // wasm32 には時計が無いので時刻は出さない
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .without_time()
        .with_writer(ConsoleMakeWriter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

/// イベントごとに `ConsoleWriter` を作る
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// 1 イベント分をためて、drop 時にまとめて出力する
pub struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        ConsoleWriter { level, buf: Vec::new() }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        emit(self.level, line.trim_end());
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    use wasm_bindgen::JsValue;
    use web_sys::console;

    let value = JsValue::from_str(line);
    match level {
        Level::ERROR => console::error_1(&value),
        Level::WARN => console::warn_1(&value),
        Level::INFO => console::info_1(&value),
        _ => console::debug_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_level: Level, line: &str) {
    use std::io::Write;
    let _ = writeln!(io::stderr(), "{}", line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(None).unwrap(), Level::INFO);
        assert_eq!(parse_level(Some("debug")).unwrap(), Level::DEBUG);
        assert_eq!(parse_level(Some(" WARN ")).unwrap(), Level::WARN);
        assert!(parse_level(Some("loud")).is_err());
    }

    #[test]
    fn test_install_is_idempotent() {
        assert!(install(Level::DEBUG).is_ok());
        assert!(install(Level::TRACE).is_ok());
        tracing::debug!("console writer smoke test");
    }
}
