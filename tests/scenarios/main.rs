use std::sync::Arc;
use std::time::Duration;

use launchpad::VERSION;
use launchpad::app::{LaunchpadApp, LinkIntent};
use launchpad::model::link::{LinkIdentity, LinkOrigin};
use launchpad::persistence::{KeyValueStore, LaunchpadStore, MemoryStore};
use launchpad::registries::LinkError;
use launchpad::test_utils::{RecordingTransport, seeded_store};
use tempfile::TempDir;

fn ids(app: &LaunchpadApp) -> Vec<String> {
    app.registry().iter().map(|entry| entry.id.clone()).collect()
}

fn open(dir: &TempDir) -> Box<dyn KeyValueStore> {
    Box::new(LaunchpadStore::open(dir.path().to_path_buf()).unwrap())
}

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(VERSION.starts_with("launchpad/"));
}

#[test]
fn custom_links_and_order_survive_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut app = LaunchpadApp::load(open(&dir));
        app.add("https://docs.rs", "Docs").unwrap();
        app.add("https://crates.io", "Crates").unwrap();
        app.move_link("Crates", "YouTube").unwrap();
    }

    let app = LaunchpadApp::load(open(&dir));
    assert_eq!(
        ids(&app),
        [
            "Crates",
            "YouTube",
            "Twitter",
            "Instagram",
            "Gmail",
            "Twitch",
            "ChatGPT",
            "Docs"
        ]
    );
    let crates = app.get("Crates").unwrap();
    assert_eq!(crates.origin, LinkOrigin::Custom);
    assert_eq!(crates.identity, LinkIdentity::Custom);
}

#[test]
fn partial_reorder_keeps_unmentioned_links() {
    let store = seeded_store(
        &[
            ("a", "https://a.example"),
            ("b", "https://b.example"),
            ("c", "https://c.example"),
        ],
        &[],
    );
    let mut app = LaunchpadApp::load(Box::new(store));
    app.reorder(vec!["b".into(), "a".into()]).unwrap();

    let app = LaunchpadApp::load(app.into_backend());
    let custom: Vec<String> = ids(&app)
        .into_iter()
        .filter(|id| id.len() == 1)
        .collect();
    assert_eq!(custom, ["b", "a", "c"]);
}

#[test]
fn stale_and_hand_edited_state_loads_cleanly() {
    let store = seeded_store(
        &[
            ("YouTube", "https://evil.example"),
            ("Docs", "https://docs.rs"),
            ("Docs", "https://docs.rs/again"),
        ],
        &["Gone", "Docs", "Docs"],
    );
    let app = LaunchpadApp::load(Box::new(store));
    let ids = ids(&app);
    assert_eq!(ids.len(), 7);
    assert_eq!(ids[0], "Docs");
    assert_eq!(app.get("YouTube").unwrap().target, "https://www.youtube.com");
    assert_eq!(app.get("Docs").unwrap().target, "https://docs.rs");
}

#[test]
fn builtins_are_protected() {
    let mut app = LaunchpadApp::load(Box::new(MemoryStore::new()));
    assert_eq!(
        app.add("https://x.com", "YouTube"),
        Err(LinkError::DuplicateLabel("YouTube".into()))
    );
    app.remove("YouTube").unwrap();
    assert!(app.get("YouTube").is_some());
    assert!(app.registry().iter().all(|entry| !entry.is_removable()));
}

#[test]
fn intents_drive_the_same_mutations() {
    let mut app = LaunchpadApp::load(Box::new(MemoryStore::new()));
    let errors = app.apply_intents(vec![
        LinkIntent::AddLink {
            url: "".into(),
            label: "Blank".into(),
        },
        LinkIntent::AddLink {
            url: "https://docs.rs".into(),
            label: "Docs".into(),
        },
        LinkIntent::ResetState,
    ]);
    assert_eq!(errors, [LinkError::InvalidInput]);
    assert!(app.get("Docs").is_none());
}

#[tokio::test]
async fn counts_combine_baseline_and_session_clicks() {
    let transport = Arc::new(RecordingTransport::with_baseline(&[
        ("YouTube", 5),
        ("Docs", 2),
    ]));
    let mut app =
        LaunchpadApp::start_session(Box::new(MemoryStore::new()), Some(transport.clone()));
    assert!(app.wait_for_baseline(Duration::from_secs(2)).await);
    app.record_click("YouTube");
    assert_eq!(app.record_click("YouTube"), 7);
    assert_eq!(app.displayed_count("Docs"), 2);
    assert_eq!(app.displayed_count("Gmail"), 0);

    assert!(app.drain_clicks(Duration::from_secs(2)).await);
    assert_eq!(transport.posted().len(), 2);
}

#[tokio::test]
async fn failing_analytics_never_surfaces() {
    let transport = Arc::new(RecordingTransport::failing());
    let mut app =
        LaunchpadApp::start_session(Box::new(MemoryStore::new()), Some(transport.clone()));
    for _ in 0..3 {
        app.record_click("ChatGPT");
    }
    assert_eq!(app.displayed_count("ChatGPT"), 3);
    app.drain_clicks(Duration::from_secs(2)).await;
    assert_eq!(app.displayed_count("ChatGPT"), 3);
    assert_eq!(transport.attempts(), 3);
}

#[tokio::test]
async fn hung_report_is_abandoned_at_shutdown() {
    let transport = Arc::new(RecordingTransport::hanging_on("Twitch"));
    let mut app =
        LaunchpadApp::start_session(Box::new(MemoryStore::new()), Some(transport.clone()));
    assert_eq!(app.record_click("Twitch"), 1);
    assert!(!app.drain_clicks(Duration::from_millis(50)).await);
    assert_eq!(app.displayed_count("Twitch"), 1);
}

#[tokio::test]
async fn stalled_count_fetch_does_not_hold_up_links() {
    let transport = Arc::new(RecordingTransport::stalled_counts());
    let dir = TempDir::new().unwrap();
    let mut app = LaunchpadApp::start_session(open(&dir), Some(transport.clone()));
    app.add("https://docs.rs", "Docs").unwrap();
    assert_eq!(app.record_click("Docs"), 1);
    assert!(app.drain_clicks(Duration::from_secs(2)).await);
    assert_eq!(transport.posted(), ["Docs"]);
    app.shutdown().await;

    let app = LaunchpadApp::load(app.into_backend());
    assert!(app.get("Docs").is_some());
}

#[tokio::test]
async fn periodic_flushes_report_every_click() {
    let transport = Arc::new(RecordingTransport::with_baseline(&[]));
    let mut app =
        LaunchpadApp::start_session(Box::new(MemoryStore::new()), Some(transport.clone()));
    for label in ["YouTube", "Gmail", "Twitch"] {
        app.record_click(label);
        assert!(app.drain_clicks(Duration::from_secs(2)).await);
    }
    assert_eq!(transport.posted(), ["YouTube", "Gmail", "Twitch"]);
}
