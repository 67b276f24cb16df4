use crate::exec_guard::OrderResult;
use crate::subscription::TerminalReason;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use xws::ExecutionMode;

static ENABLED: OnceLock<bool> = OnceLock::new();
static FILE_HANDLE: OnceLock<Option<Mutex<File>>> = OnceLock::new();

fn logging_enabled() -> bool {
    *ENABLED.get_or_init(|| {
        std::env::var("XWS_DEBUG_HOOKS")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(false)
    })
}

fn log_file() -> Option<&'static Mutex<File>> {
    FILE_HANDLE
        .get_or_init(|| {
            let _ = std::fs::create_dir_all("data");
            let path = Path::new("data").join("debug_hooks.log");
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
                .map(Mutex::new)
        })
        .as_ref()
}

fn log_line(topic: &str, msg: impl AsRef<str>) {
    if !logging_enabled() {
        return;
    }

    let ts = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let formatted = format!("[{ts}][{topic}] {}", msg.as_ref());

    if let Some(Ok(mut f)) = log_file().map(|m| m.lock()) {
        let _ = writeln!(f, "{formatted}");
    }

    eprintln!("{formatted}");
}

/// `mode` is the one the gateway resolved from its own env, not the process env.
pub fn log_gateway_start(contract_version: u32, mode: ExecutionMode) {
    log_line("gateway", gateway_start_message(contract_version, mode));
}

fn gateway_start_message(contract_version: u32, mode: ExecutionMode) -> String {
    format!("runtime contract v{contract_version}; execution mode {mode}")
}

pub fn log_order_result(exchange: &str, symbol: &str, result: &OrderResult) {
    match result {
        Ok(receipt) => log_line(
            "order.ok",
            format!(
                "{exchange} {symbol} id={} status={} mode={}",
                receipt.order_id, receipt.status, receipt.mode
            ),
        ),
        Err(err) => log_line("order.err", format!("{exchange} {symbol}: {err}")),
    }
}

pub fn log_stream_line(label: &str, line: &str) {
    static COUNT: AtomicU64 = AtomicU64::new(0);
    let n = COUNT.fetch_add(1, Ordering::Relaxed) + 1;
    if n <= 20 || n % 100 == 0 {
        let preview: String = line.chars().take(160).collect();
        log_line("stream.line", format!("#{n} [{label}] {preview}"));
    }
}

pub fn log_subscription_end(label: &str, reason: TerminalReason, lines_read: u64) {
    log_line(
        "stream.end",
        format!("[{label}] {reason:?} after {lines_read} lines"),
    );
}
