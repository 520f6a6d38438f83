//! ActivityTracker tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use activity_telemetry::{
    ActivityTracker, ActivityType, Details, EventRecord, EventSink, EventTransport,
    HostEnvironment, MemorySink, SessionIdentity, StaticIdentity, TrackerError, TrackerResult,
};
use async_trait::async_trait;
use serde_json::json;

const ACTOR: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

/// Sink that fails every write but counts attempts
#[derive(Default)]
struct FailingSink {
    attempts: AtomicUsize,
}

#[async_trait]
impl EventSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn insert(&self, _record: &EventRecord) -> TrackerResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TrackerError::SinkUnreachable("connection refused".to_string()))
    }
}

/// Sink that settles only after a delay
struct DelayedSink {
    delay: Duration,
    inner: MemorySink,
}

#[async_trait]
impl EventSink for DelayedSink {
    fn name(&self) -> &str {
        "delayed"
    }

    async fn insert(&self, record: &EventRecord) -> TrackerResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.insert(record).await
    }
}

/// Sink that panics on its first write and records afterwards
#[derive(Default)]
struct PanicOnceSink {
    panicked: AtomicBool,
    inner: MemorySink,
}

#[async_trait]
impl EventSink for PanicOnceSink {
    fn name(&self) -> &str {
        "panic-once"
    }

    async fn insert(&self, record: &EventRecord) -> TrackerResult<()> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("sink blew up");
        }
        self.inner.insert(record).await
    }
}

fn details(value: serde_json::Value) -> Details {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("details must be an object, got {other}"),
    }
}

async fn wait_for_records(sink: &MemorySink, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while sink.len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("records never arrived");
}

async fn wait_for_attempts(sink: &FailingSink, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while sink.attempts.load(Ordering::SeqCst) < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("writes never attempted");
}

/// Let any spawned writes run
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn tracker_for(
    identity: impl activity_telemetry::IdentitySource + 'static,
    env: &HostEnvironment,
    sink: Arc<dyn EventSink>,
) -> ActivityTracker {
    ActivityTracker::new(Arc::new(identity), Arc::new(env.clone()), sink).unwrap()
}

#[tokio::test]
async fn test_login_scenario() {
    let env = HostEnvironment::simulated("/", 1920, 1080);
    let sink = Arc::new(MemorySink::new());
    let tracker = tracker_for(StaticIdentity::actor(ACTOR), &env, sink.clone());

    tracker.track(
        ActivityType::Login,
        Some("/login"),
        Some(details(json!({"method": "email"}))),
    );
    wait_for_records(&sink, 1).await;

    let records = sink.records();
    assert_eq!(records.len(), 1);

    let wire = records[0].to_json().unwrap();
    assert_eq!(wire["user_id"], ACTOR);
    assert_eq!(wire["activity_type"], "login");
    assert_eq!(wire["page"], "/login");
    assert_eq!(wire["details"], json!({"method": "email"}));
    assert_eq!(wire["ip_address"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_no_session_sends_nothing() {
    let env = HostEnvironment::simulated("/", 1920, 1080);
    let sink = Arc::new(FailingSink::default());
    let tracker = tracker_for(StaticIdentity::anonymous(), &env, sink.clone());

    tracker.track(ActivityType::ViewPage, None, None);
    settle().await;

    assert_eq!(sink.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_actor_sends_nothing() {
    let env = HostEnvironment::simulated("/", 1920, 1080);

    for bad in [
        "not-a-uuid",
        "",
        "3fa85f64-5717-4562-b3fc-2c963f66afa",
        "3fa85f64571745 62b3fc2c963f66afa6",
    ] {
        let sink = Arc::new(FailingSink::default());
        let tracker = tracker_for(StaticIdentity::actor(bad), &env, sink.clone());

        tracker.track(ActivityType::Logout, None, None);
        for activity in ActivityType::ALL {
            tracker.track(activity, Some("/x"), Some(details(json!({"k": 1}))));
        }
        settle().await;

        assert_eq!(sink.attempts.load(Ordering::SeqCst), 0, "sent for actor {bad:?}");
        assert!(tracker.current_actor().is_none());
    }
}

#[tokio::test]
async fn test_upload_defaults_page_to_current_location() {
    let env = HostEnvironment::simulated("/profile", 1920, 1080);
    let sink = Arc::new(MemorySink::new());
    let tracker = tracker_for(StaticIdentity::actor(ACTOR), &env, sink.clone());

    tracker.track(
        ActivityType::UploadFile,
        None,
        Some(details(json!({"fileName": "x.png", "fileSize": 1024}))),
    );
    wait_for_records(&sink, 1).await;

    let record = &sink.records()[0];
    assert_eq!(record.page, "/profile");
    assert_eq!(record.details["fileName"], "x.png");
    assert_eq!(record.details["fileSize"], 1024);
}

#[tokio::test]
async fn test_missing_details_default_to_empty_object() {
    let env = HostEnvironment::simulated("/vitals", 1920, 1080);
    let sink = Arc::new(MemorySink::new());
    let tracker = tracker_for(StaticIdentity::actor(ACTOR), &env, sink.clone());

    tracker.track(ActivityType::ViewPage, None, None);
    wait_for_records(&sink, 1).await;

    let wire = sink.records()[0].to_json().unwrap();
    assert_eq!(wire["page"], "/vitals");
    assert_eq!(wire["details"], json!({}));
}

#[tokio::test]
async fn test_page_resolved_per_call() {
    let env = HostEnvironment::simulated("/", 1920, 1080);
    let sink = Arc::new(MemorySink::new());
    let tracker = tracker_for(StaticIdentity::actor(ACTOR), &env, sink.clone());

    tracker.track(ActivityType::ViewPage, None, None);
    env.navigate("/alerts");
    tracker.track(ActivityType::ViewAlerts, None, None);
    wait_for_records(&sink, 2).await;

    let mut pages: Vec<_> = sink.records().into_iter().map(|r| r.page).collect();
    pages.sort();
    assert_eq!(pages, vec!["/".to_string(), "/alerts".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_track_returns_before_write_settles() {
    let env = HostEnvironment::simulated("/", 1920, 1080);
    let sink = Arc::new(DelayedSink {
        delay: Duration::from_millis(300),
        inner: MemorySink::new(),
    });
    let tracker = tracker_for(StaticIdentity::actor(ACTOR), &env, sink.clone());

    let started = Instant::now();
    tracker.track(ActivityType::ViewMetrics, None, None);
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(100), "track blocked for {elapsed:?}");
    assert!(sink.inner.is_empty());

    wait_for_records(&sink.inner, 1).await;
}

#[tokio::test]
async fn test_sink_failure_does_not_lock_out_tracking() {
    let env = HostEnvironment::simulated("/", 1920, 1080);
    let sink = Arc::new(FailingSink::default());
    let tracker = tracker_for(StaticIdentity::actor(ACTOR), &env, sink.clone());

    tracker.track(ActivityType::DownloadFile, None, None);
    wait_for_attempts(&sink, 1).await;

    tracker.track(ActivityType::DownloadFile, None, None);
    tracker.track(ActivityType::ExportMedicalHistory, Some("/profile"), None);
    wait_for_attempts(&sink, 3).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_sink_is_isolated() {
    let env = HostEnvironment::simulated("/", 1920, 1080);
    let sink = Arc::new(PanicOnceSink::default());
    let tracker = tracker_for(StaticIdentity::actor(ACTOR), &env, sink.clone());

    tracker.track(ActivityType::ConnectWallet, Some("/blockchain"), None);
    tokio::time::timeout(Duration::from_secs(2), async {
        while !sink.panicked.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    tracker.track(ActivityType::DisconnectWallet, Some("/blockchain"), None);
    wait_for_records(&sink.inner, 1).await;
    assert_eq!(sink.inner.records()[0].activity_type, ActivityType::DisconnectWallet);
}

#[tokio::test]
async fn test_device_snapshot_taken_per_event() {
    let env = HostEnvironment::simulated("/", 1920, 1080);
    let sink = Arc::new(MemorySink::new());
    let tracker = tracker_for(StaticIdentity::actor(ACTOR), &env, sink.clone());

    tracker.track(ActivityType::ViewPage, Some("/first"), None);
    env.resize(1080, 1920);
    tracker.track(ActivityType::ViewPage, Some("/second"), None);
    wait_for_records(&sink, 2).await;

    let records = sink.records();
    let first = records.iter().find(|r| r.page == "/first").unwrap();
    let second = records.iter().find(|r| r.page == "/second").unwrap();

    assert_eq!((first.device.screen_width, first.device.screen_height), (1920, 1080));
    assert_eq!((second.device.screen_width, second.device.screen_height), (1080, 1920));
}

#[tokio::test]
async fn test_identity_changes_are_followed() {
    let env = HostEnvironment::simulated("/", 1920, 1080);
    let sink = Arc::new(MemorySink::new());
    let session = SessionIdentity::new();
    let tracker = tracker_for(session.clone(), &env, sink.clone());

    tracker.track(ActivityType::ViewPage, None, None);
    session.sign_in(ACTOR);
    tracker.track(ActivityType::Login, Some("/login"), None);
    session.sign_out();
    tracker.track(ActivityType::Logout, None, None);
    wait_for_records(&sink, 1).await;
    settle().await;

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].activity_type, ActivityType::Login);
    assert_eq!(records[0].actor, ACTOR);
}

#[tokio::test]
async fn test_track_named() {
    let env = HostEnvironment::simulated("/settings", 1920, 1080);
    let sink = Arc::new(MemorySink::new());
    let tracker = tracker_for(StaticIdentity::actor(ACTOR), &env, sink.clone());

    tracker.track_named("update_settings", None, None).unwrap();
    wait_for_records(&sink, 1).await;
    assert_eq!(sink.records()[0].activity_type, ActivityType::UpdateSettings);

    let err = tracker.track_named("delete_account", None, None).unwrap_err();
    assert!(matches!(err, TrackerError::UnknownActivityType(ref name) if name == "delete_account"));
    settle().await;
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_debug_names_the_sink() {
    let env = HostEnvironment::simulated("/", 1920, 1080);
    let tracker = tracker_for(StaticIdentity::anonymous(), &env, Arc::new(MemorySink::new()));

    let debug = format!("{tracker:?}");
    assert!(debug.contains("sink: \"memory\""), "{debug}");
    assert!(debug.contains("enabled: true"), "{debug}");
}

#[test]
fn test_requires_runtime() {
    let result = ActivityTracker::new(
        Arc::new(StaticIdentity::actor(ACTOR)),
        Arc::new(HostEnvironment::default()),
        Arc::new(MemorySink::new()),
    );
    assert!(matches!(result, Err(TrackerError::NoRuntime)));
}

#[test]
fn test_tracking_from_outside_the_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let sink = Arc::new(MemorySink::new());
    let transport = EventTransport::with_handle(sink.clone(), runtime.handle().clone());
    let tracker = ActivityTracker::with_transport(
        Arc::new(StaticIdentity::actor(ACTOR)),
        Arc::new(HostEnvironment::simulated("/trends", 1920, 1080)),
        transport,
    );

    // Called from a plain thread, as a UI event handler would
    tracker.track(ActivityType::ViewPage, None, None);

    runtime.block_on(wait_for_records(&sink, 1));
    assert_eq!(sink.records()[0].page, "/trends");
}
