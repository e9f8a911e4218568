//! End-to-end tests of the fluent surface: engine builder, stream
//! prototype, and the wrapped session operations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aqueduct::{
    request_headers, Aqueduct, BuildError, EngineState, LogLevel, Method, Status,
    TrustChainVerification, Url,
};
use crossbeam_channel::unbounded;

static ENGINE_LOCK: Mutex<()> = Mutex::new(());

fn engine_lock() -> MutexGuard<'static, ()> {
    ENGINE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn invalid_configuration_fails_before_the_engine_starts() {
    let err = Aqueduct::builder()
        .dns_failure_refresh_seconds(30, 5)
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::Config(_)));

    let err = Aqueduct::builder()
        .trust_chain_verification(TrustChainVerification::AcceptUntrusted)
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::Config(_)));
}

#[test]
fn engine_builds_and_streams_round_trip() {
    let _guard = engine_lock();
    let (running_tx, running_rx) = unbounded();
    let engine = Aqueduct::builder()
        .app_id("builder-tests")
        .app_version("0.0.0")
        .connect_timeout_seconds(10)
        .log_level(LogLevel::Warn)
        .on_engine_running(move || {
            let _ = running_tx.send(());
        })
        .build()
        .expect("engine starts");
    running_rx.recv_timeout(WAIT).unwrap();
    assert!(engine.is_running());
    assert_eq!(engine.config().app_id, "builder-tests");

    let (tx, rx) = unbounded();
    let headers_tx = tx.clone();
    let body_tx = tx.clone();
    let stream = engine
        .new_stream()
        .on_headers(move |status, _headers, _end| {
            let _ = headers_tx.send(format!("status:{status}"));
        })
        .on_data(move |body, _end| {
            let _ = body_tx.send(format!("data:{}", String::from_utf8_lossy(&body)));
        })
        .on_complete(move || {
            let _ = tx.send("complete".to_string());
        })
        .start()
        .expect("stream opens");

    let url: Url = "https://example.com/echo".parse().unwrap();
    let headers = request_headers(Method::POST, &url).unwrap();
    stream.send_headers(headers, false).unwrap();
    stream.send_data(&b"ping"[..], 4, true).unwrap();

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "status:200 OK");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "data:ping");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "complete");

    assert_eq!(engine.record_counter_inc("api.requests", &[], 1), Status::Ok);
    engine.terminate();
    assert_eq!(engine.state(), EngineState::Terminated);
}

#[test]
fn terminate_through_the_wrapper_cancels_open_streams() {
    let _guard = engine_lock();
    let engine = Aqueduct::builder().build().expect("engine starts");

    let cancels = Arc::new(AtomicUsize::new(0));
    let c = cancels.clone();
    let stream = engine
        .new_stream()
        .on_cancel(move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .start()
        .unwrap();
    let url: Url = "https://example.com/slow".parse().unwrap();
    stream
        .send_headers(request_headers(Method::GET, &url).unwrap(), false)
        .unwrap();

    engine.terminate();
    assert_eq!(cancels.load(Ordering::SeqCst), 1);
    assert!(engine.new_stream().start().is_err());
}
