//! Engine and stream lifecycle integration tests.
//!
//! The process allows one live engine at a time, so every test that starts
//! an engine serializes on `ENGINE_LOCK` and terminates its engine before
//! releasing it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aqueduct_client::{
    ConfigBuilder, EngineConfig, EngineSession, EngineState, InlineExecutor, Method,
    RequestHeaders, StartOptions, Status, StreamCallbacks, StreamState,
};
use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver, Sender};

static ENGINE_LOCK: Mutex<()> = Mutex::new(());

fn engine_lock() -> MutexGuard<'static, ()> {
    ENGINE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

#[derive(Debug)]
enum Ev {
    Headers { end_stream: bool },
    Data { body: Bytes, end_stream: bool },
    Trailers,
    Complete,
    Error(String),
    Cancel,
}

fn recording_callbacks(tx: Sender<Ev>) -> StreamCallbacks {
    let mut callbacks = StreamCallbacks::new();
    let t = tx.clone();
    callbacks.on_headers = Some(Box::new(move |_status, _headers, end_stream| {
        let _ = t.send(Ev::Headers { end_stream });
    }));
    let t = tx.clone();
    callbacks.on_data = Some(Box::new(move |body, end_stream| {
        let _ = t.send(Ev::Data { body, end_stream });
    }));
    let t = tx.clone();
    callbacks.on_trailers = Some(Box::new(move |_trailers| {
        let _ = t.send(Ev::Trailers);
    }));
    let t = tx.clone();
    callbacks.on_complete = Some(Box::new(move || {
        let _ = t.send(Ev::Complete);
    }));
    let t = tx.clone();
    callbacks.on_error = Some(Box::new(move |error| {
        let _ = t.send(Ev::Error(error.to_string()));
    }));
    callbacks.on_cancel = Some(Box::new(move || {
        let _ = tx.send(Ev::Cancel);
    }));
    callbacks
}

fn test_config() -> EngineConfig {
    ConfigBuilder::new()
        .with_app_id("lifecycle-tests")
        .build()
        .expect("default config builds")
}

fn get_headers() -> RequestHeaders {
    RequestHeaders::new(Method::GET, "https", "example.com", "/")
}

fn expect_quiet(rx: &Receiver<Ev>) {
    if let Ok(event) = rx.recv_timeout(QUIET) {
        panic!("unexpected event after terminal: {event:?}");
    }
}

#[test]
fn engine_runs_and_fires_on_running_once() {
    let _guard = engine_lock();
    let (tx, rx) = unbounded();
    let options = StartOptions {
        on_engine_running: Some(Box::new(move || {
            let _ = tx.send(());
        })),
        ..StartOptions::default()
    };
    let session = EngineSession::start(test_config(), options).expect("engine starts");

    rx.recv_timeout(WAIT).expect("on_engine_running fires");
    assert!(session.is_running());
    assert!(
        rx.recv_timeout(QUIET).is_err(),
        "on_engine_running must fire exactly once"
    );

    session.terminate();
    assert_eq!(session.state(), EngineState::Terminated);
    // Idempotent.
    session.terminate();
    assert_eq!(session.state(), EngineState::Terminated);
}

#[test]
fn headers_only_exchange_completes_without_data() {
    let _guard = engine_lock();
    let session = EngineSession::start(test_config(), StartOptions::default()).unwrap();
    let (tx, rx) = unbounded();

    let stream = session.init_stream().unwrap();
    stream
        .start(recording_callbacks(tx), Arc::new(InlineExecutor), false)
        .unwrap();
    stream.send_headers(get_headers(), true).unwrap();

    match rx.recv_timeout(WAIT).unwrap() {
        Ev::Headers { end_stream } => assert!(end_stream, "headers-only response"),
        other => panic!("expected headers first, got {other:?}"),
    }
    match rx.recv_timeout(WAIT).unwrap() {
        Ev::Complete => {}
        other => panic!("expected complete, got {other:?}"),
    }
    expect_quiet(&rx);
    assert_eq!(stream.state(), StreamState::Complete);

    session.terminate();
}

#[test]
fn request_body_is_echoed_in_order() {
    let _guard = engine_lock();
    let session = EngineSession::start(test_config(), StartOptions::default()).unwrap();
    let (tx, rx) = unbounded();

    let stream = session.init_stream().unwrap();
    stream
        .start(recording_callbacks(tx), Arc::new(InlineExecutor), false)
        .unwrap();
    stream
        .send_headers(RequestHeaders::new(Method::POST, "https", "example.com", "/echo"), false)
        .unwrap();
    stream.send_data(&b"hello "[..], 6, false).unwrap();
    stream.send_data(&b"world"[..], 5, true).unwrap();

    match rx.recv_timeout(WAIT).unwrap() {
        Ev::Headers { end_stream } => assert!(!end_stream),
        other => panic!("expected headers, got {other:?}"),
    }
    let mut echoed = Vec::new();
    loop {
        match rx.recv_timeout(WAIT).unwrap() {
            Ev::Data { body, end_stream } => {
                echoed.extend_from_slice(&body);
                if end_stream {
                    break;
                }
            }
            other => panic!("expected data, got {other:?}"),
        }
    }
    assert_eq!(echoed, b"hello world");
    match rx.recv_timeout(WAIT).unwrap() {
        Ev::Complete => {}
        other => panic!("expected complete, got {other:?}"),
    }

    let snapshot = session.stats_snapshot();
    assert_eq!(snapshot.bytes_sent, 11);
    assert_eq!(snapshot.bytes_received, 11);
    assert_eq!(snapshot.streams_completed, 1);

    session.terminate();
}

#[test]
fn send_ordering_violations_are_rejected() {
    let _guard = engine_lock();
    let session = EngineSession::start(test_config(), StartOptions::default()).unwrap();
    let (tx, rx) = unbounded();

    let stream = session.init_stream().unwrap();

    // Before start, nothing but start is legal.
    let err = stream.send_headers(get_headers(), false).unwrap_err();
    assert!(err.is_lifecycle_order());

    // Explicit flow control keeps the echoed body parked until a grant, so
    // the stream cannot reach a terminal state under these assertions.
    stream
        .start(recording_callbacks(tx), Arc::new(InlineExecutor), true)
        .unwrap();

    // Data before headers.
    let err = stream.send_data(&b"x"[..], 1, false).unwrap_err();
    assert!(err.is_lifecycle_order());
    assert_eq!(err.stream_id(), Some(stream.id()));

    // Headers at most once.
    stream.send_headers(get_headers(), false).unwrap();
    let err = stream.send_headers(get_headers(), false).unwrap_err();
    assert!(err.is_lifecycle_order());

    // Trailers close the send side; further data is rejected.
    stream.send_data(&b"x"[..], 1, false).unwrap();
    stream.send_trailers(http::HeaderMap::new()).unwrap();
    let err = stream.send_data(&b"y"[..], 1, false).unwrap_err();
    assert!(err.is_lifecycle_order());

    // Trailers finished the request; grant the body through and complete.
    match rx.recv_timeout(WAIT).unwrap() {
        Ev::Headers { .. } => {}
        other => panic!("expected headers, got {other:?}"),
    }
    stream.read_data(64).unwrap();
    match rx.recv_timeout(WAIT).unwrap() {
        Ev::Data { .. } => {}
        other => panic!("expected data, got {other:?}"),
    }
    match rx.recv_timeout(WAIT).unwrap() {
        Ev::Complete => {}
        other => panic!("expected complete, got {other:?}"),
    }

    session.terminate();
}

#[test]
fn terminal_stream_fails_fast_and_stays_silent() {
    let _guard = engine_lock();
    let session = EngineSession::start(test_config(), StartOptions::default()).unwrap();
    let (tx, rx) = unbounded();

    let stream = session.init_stream().unwrap();
    stream
        .start(recording_callbacks(tx), Arc::new(InlineExecutor), false)
        .unwrap();
    stream.send_headers(get_headers(), true).unwrap();

    // Drain to the terminal.
    loop {
        match rx.recv_timeout(WAIT).unwrap() {
            Ev::Complete => break,
            Ev::Headers { .. } | Ev::Data { .. } | Ev::Trailers => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    assert!(stream.send_data(&b"x"[..], 1, false).unwrap_err().is_stale_handle());
    assert!(stream.read_data(16).unwrap_err().is_stale_handle());
    assert!(stream.reset_stream().unwrap_err().is_stale_handle());
    assert!(stream
        .send_trailers(http::HeaderMap::new())
        .unwrap_err()
        .is_stale_handle());
    expect_quiet(&rx);

    session.terminate();
}

#[test]
fn reset_delivers_exactly_one_cancel() {
    let _guard = engine_lock();
    let session = EngineSession::start(test_config(), StartOptions::default()).unwrap();
    let (tx, rx) = unbounded();

    let stream = session.init_stream().unwrap();
    stream
        .start(recording_callbacks(tx), Arc::new(InlineExecutor), false)
        .unwrap();
    stream.send_headers(get_headers(), false).unwrap();

    stream.reset_stream().unwrap();
    match rx.recv_timeout(WAIT).unwrap() {
        Ev::Cancel => {}
        other => panic!("expected cancel, got {other:?}"),
    }
    assert_eq!(stream.state(), StreamState::Reset);
    // A second reset is a stale-handle error, not a second cancel.
    assert!(stream.reset_stream().unwrap_err().is_stale_handle());
    expect_quiet(&rx);

    let snapshot = session.stats_snapshot();
    assert_eq!(snapshot.streams_reset, 1);

    session.terminate();
}

#[test]
fn terminate_cancels_every_live_stream_before_returning() {
    let _guard = engine_lock();
    let session = EngineSession::start(test_config(), StartOptions::default()).unwrap();

    let cancels = Arc::new(AtomicUsize::new(0));
    let mut streams = Vec::new();
    for _ in 0..3 {
        let stream = session.init_stream().unwrap();
        let mut callbacks = StreamCallbacks::new();
        let c = cancels.clone();
        callbacks.on_cancel = Some(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        stream
            .start(callbacks, Arc::new(InlineExecutor), false)
            .unwrap();
        // Open request keeps the stream live.
        stream.send_headers(get_headers(), false).unwrap();
        streams.push(stream);
    }
    assert_eq!(session.live_streams(), 3);

    session.terminate();
    // All terminal callbacks land before terminate returns.
    assert_eq!(cancels.load(Ordering::SeqCst), 3);
    for stream in &streams {
        assert_eq!(stream.state(), StreamState::Reset);
    }

    // A terminated engine refuses new work.
    assert!(session.init_stream().unwrap_err().is_lifecycle_order());
    assert_eq!(session.record_counter_inc("late.counter", &[], 1), Status::Failure);
    assert_eq!(session.flush_stats(), Status::Failure);
    assert_eq!(session.dump_stats(), "");
    assert_eq!(session.reset_connectivity_state(), Status::Failure);
}

#[test]
fn stat_surface_works_while_running() {
    let _guard = engine_lock();
    let (tx, rx) = unbounded();
    let options = StartOptions {
        on_engine_running: Some(Box::new(move || {
            let _ = tx.send(());
        })),
        ..StartOptions::default()
    };
    let session = EngineSession::start(test_config(), options).unwrap();
    rx.recv_timeout(WAIT).unwrap();

    let tags = vec![("cluster".to_string(), "edge".to_string())];
    assert_eq!(session.record_counter_inc("requests.total", &tags, 2), Status::Ok);
    assert_eq!(session.record_counter_inc("requests.total", &tags, 3), Status::Ok);
    assert_eq!(session.flush_stats(), Status::Ok);

    let dump = session.dump_stats();
    assert!(dump.contains("requests.total{cluster=edge}: 5"));
    assert!(dump.contains("streams.started: 0"));

    session.terminate();
}

#[test]
fn one_live_engine_at_a_time() {
    let _guard = engine_lock();
    let first = EngineSession::start(test_config(), StartOptions::default()).unwrap();

    let err = EngineSession::start(test_config(), StartOptions::default()).unwrap_err();
    assert!(err.is_lifecycle_order());

    first.terminate();
    // The slot frees on terminate; a new engine may start.
    let second = EngineSession::start(test_config(), StartOptions::default()).unwrap();
    second.terminate();
}
