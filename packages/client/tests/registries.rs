//! Extension registry integration tests: name-keyed registration and
//! filter instantiation per stream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aqueduct_client::{
    key_value_store, register_filter_factory, register_key_value_store, register_string_accessor,
    string_accessor, ConfigBuilder, EngineSession, FilterFactory, InlineExecutor, KeyValueStore,
    Method, RequestHeaders, StartOptions, StreamCallbacks, StreamFilter, StringAccessor,
};
use crossbeam_channel::unbounded;
use http::{HeaderMap, StatusCode};

static ENGINE_LOCK: Mutex<()> = Mutex::new(());

fn engine_lock() -> MutexGuard<'static, ()> {
    ENGINE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

const WAIT: Duration = Duration::from_secs(5);

struct MapStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MapStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
        })
    }
}

impl KeyValueStore for MapStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn save(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[test]
fn duplicate_store_registration_keeps_the_first() {
    let first = MapStore::new();
    first.save("seed", "from-first");
    register_key_value_store("registries-test-cache", first).unwrap();

    let err = register_key_value_store("registries-test-cache", MapStore::new()).unwrap_err();
    assert!(err.is_duplicate_name());

    // The first registration stays active.
    let active = key_value_store("registries-test-cache").unwrap();
    assert_eq!(active.read("seed").as_deref(), Some("from-first"));
}

#[test]
fn stores_registered_under_distinct_names_coexist() {
    register_key_value_store("registries-test-a", MapStore::new()).unwrap();
    register_key_value_store("registries-test-b", MapStore::new()).unwrap();

    let a = key_value_store("registries-test-a").unwrap();
    let b = key_value_store("registries-test-b").unwrap();
    a.save("k", "in-a");
    assert_eq!(a.read("k").as_deref(), Some("in-a"));
    assert_eq!(b.read("k"), None);
    b.remove("k");
    assert_eq!(a.read("k").as_deref(), Some("in-a"));
}

struct FixedAccessor(&'static str);

impl StringAccessor for FixedAccessor {
    fn get_string(&self) -> String {
        self.0.to_string()
    }
}

#[test]
fn string_accessors_resolve_by_name() {
    register_string_accessor("registries-test-device-id", Arc::new(FixedAccessor("device-7")))
        .unwrap();
    let accessor = string_accessor("registries-test-device-id").unwrap();
    assert_eq!(accessor.get_string(), "device-7");
    assert!(string_accessor("registries-test-unknown").is_none());
}

struct CountingFilter {
    requests: Arc<AtomicUsize>,
    responses: Arc<AtomicUsize>,
}

impl StreamFilter for CountingFilter {
    fn on_request_headers(&mut self, _headers: &RequestHeaders) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn on_response_headers(&mut self, _status: StatusCode, _headers: &HeaderMap) {
        self.responses.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountingFactory {
    instances: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
    responses: Arc<AtomicUsize>,
}

impl FilterFactory for CountingFactory {
    fn create(&self) -> Box<dyn StreamFilter> {
        self.instances.fetch_add(1, Ordering::SeqCst);
        Box::new(CountingFilter {
            requests: self.requests.clone(),
            responses: self.responses.clone(),
        })
    }
}

#[test]
fn platform_filters_are_instantiated_per_stream() {
    let _guard = engine_lock();

    let instances = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(AtomicUsize::new(0));
    let responses = Arc::new(AtomicUsize::new(0));
    register_filter_factory(
        "registries-test-counting-filter",
        Arc::new(CountingFactory {
            instances: instances.clone(),
            requests: requests.clone(),
            responses: responses.clone(),
        }),
    )
    .unwrap();

    let config = ConfigBuilder::new()
        .add_platform_filter("registries-test-counting-filter")
        .build()
        .unwrap();
    let session = EngineSession::start(config, StartOptions::default()).unwrap();

    for _ in 0..2 {
        let (tx, rx) = unbounded();
        let stream = session.init_stream().unwrap();
        let mut callbacks = StreamCallbacks::new();
        callbacks.on_complete = Some(Box::new(move || {
            let _ = tx.send(());
        }));
        stream
            .start(callbacks, Arc::new(InlineExecutor), false)
            .unwrap();
        stream
            .send_headers(RequestHeaders::new(Method::GET, "https", "example.com", "/"), true)
            .unwrap();
        rx.recv_timeout(WAIT).unwrap();
    }

    // One filter instance per stream, each seeing one exchange.
    assert_eq!(instances.load(Ordering::SeqCst), 2);
    assert_eq!(requests.load(Ordering::SeqCst), 2);
    assert_eq!(responses.load(Ordering::SeqCst), 2);

    session.terminate();
}

#[test]
fn configs_naming_unregistered_filters_fail_to_build() {
    let err = ConfigBuilder::new()
        .add_platform_filter("registries-test-never-registered")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("registries-test-never-registered"));
}
