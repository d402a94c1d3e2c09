//! # simlab-wasm
//!
//! wasm-bindgen エクスポート：ラボの Web UI（ブラウザ）から呼び出す公開 API。
//!
//! ## 使用方法（TypeScript）
//!
//! ```typescript
//! import { LabClient, init_panic_hook, initLogging } from '../simlab-wasm-pkg/simlab_wasm';
//!
//! init_panic_hook();
//! initLogging("debug");
//!
//! const client = new LabClient(JSON.stringify({ lab_id: labId, frame_layout: "reserved_header" }));
//! const ws = new WebSocket(url);
//! ws.binaryType = "arraybuffer";
//!
//! ws.onopen = () => ws.send(client.onOpen());
//! ws.onclose = () => client.onClose();
//! ws.onerror = () => client.onError("websocket error");
//! ws.onmessage = (ev) => {
//!     if (typeof ev.data === "string") {
//!         const event = client.handleText(ev.data);
//!         if (event.kind === "status") statusLine.textContent = event.message;
//!     } else {
//!         client.handleBinary(new Uint8Array(ev.data));
//!     }
//! };
//!
//! // 補間（1 回で終わる）
//! const preview = client.estimate({ energy: 91.2 });
//! for (const msg of client.takeOutgoing()) ws.send(msg);
//! const snapshot = await preview;
//!
//! // 本実行（途中経過を何度も受け取る）
//! const done = client.run({ energy: 91.2 }, (snap) => redraw(snap));
//! for (const msg of client.takeOutgoing()) ws.send(msg);
//! const last = await done;
//! ```

use wasm_bindgen::prelude::*;

pub mod client;
pub mod logging;

pub use client::LabClient;

/// パニック時にブラウザコンソールにスタックトレースを出力する
///
/// 開発時に必ず呼び出すこと。本番ビルドでは feature flag で無効化可能。
#[wasm_bindgen]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// ログ出力をブラウザコンソールへ向ける
///
/// 2 回目以降の呼び出しは何もしない。
///
/// # 引数
/// - `level`: `"error"` / `"warn"` / `"info"` / `"debug"` / `"trace"`。省略時は `"info"`
///
/// # エラー
/// - レベル名が不正
#[wasm_bindgen(js_name = "initLogging")]
pub fn init_logging(level: Option<String>) -> Result<(), JsError> {
    let level = logging::parse_level(level.as_deref())
        .map_err(|e| JsError::new(&format!("Invalid log level: {}", e)))?;
    logging::install(level).map_err(|e| JsError::new(&format!("Failed to set tracing subscriber: {}", e)))
}
