use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

use recoil_playback::config::EngineSettings;
use recoil_playback::hotkeys::{HotkeyAction, HotkeyRegistry};
use recoil_playback::pattern::{
    DirectoryPatternStore, InMemoryPatternStore, Pattern, PatternPoint, PatternRecord,
};
use recoil_playback::playback::{EngineError, PlaybackEngine, PlaybackPhase};
use recoil_playback::pointer::RecordingSink;

fn pattern(points: &[(i32, i32, u32)]) -> Pattern {
    points
        .iter()
        .map(|&(dx, dy, d)| PatternPoint::new(dx, dy, d))
        .collect()
}

fn engine_with(patterns: Vec<(&str, Pattern)>) -> (PlaybackEngine, Arc<RecordingSink>) {
    let store: InMemoryPatternStore = patterns.into_iter().collect();
    let sink = Arc::new(RecordingSink::new());
    let engine = PlaybackEngine::new(Arc::new(store), sink.clone());
    (engine, sink)
}

#[tokio::test(start_paused = true)]
async fn test_two_point_run_timing_and_displacement() {
    let (engine, sink) = engine_with(vec![("two", pattern(&[(5, 0, 50), (0, 5, 50)]))]);

    assert!(engine.load_pattern("two"));
    assert!(engine.start());
    engine.wait_idle().await;

    let moves = sink.moves();
    assert_eq!(moves.len(), 2);
    assert_eq!((moves[0].dx, moves[0].dy), (5, 0));
    assert_eq!((moves[1].dx, moves[1].dy), (0, 5));
    assert!(moves[1].at - moves[0].at >= Duration::from_millis(50));

    let snapshot = engine.snapshot();
    assert_eq!((snapshot.accumulated_dx, snapshot.accumulated_dy), (-5, -5));
}

#[tokio::test(start_paused = true)]
async fn test_second_start_does_not_reset_progress() {
    let (engine, sink) = engine_with(vec![(
        "three",
        pattern(&[(1, 0, 40), (1, 0, 40), (1, 0, 40)]),
    )]);
    engine.load_pattern("three");

    assert!(engine.start());
    tokio::time::sleep(Duration::from_millis(50)).await;
    let before = engine.snapshot();
    assert_eq!(before.cursor_index, 2);

    assert!(!engine.start());
    assert_eq!(engine.snapshot(), before);

    engine.wait_idle().await;
    assert_eq!(sink.deltas(), vec![(1, 0); 3]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_on_inactive_engine_is_noop() {
    let (engine, sink) = engine_with(vec![("one", pattern(&[(3, 3, 10)]))]);

    assert!(engine.stop().await.is_none());
    assert_eq!(engine.phase(), PlaybackPhase::Idle);
    assert!(sink.is_empty());

    engine.load_pattern("one");
    engine.start();
    engine.wait_idle().await;
    assert!(engine.stop().await.is_none());
    assert_eq!(sink.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_run_recentres_partial_displacement() {
    let (engine, sink) = engine_with(vec![("two", pattern(&[(40, 0, 50), (0, 40, 50)]))]);
    engine.load_pattern("two");
    engine.start();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let start = Instant::now();
    let report = engine.stop().await.expect("run was active");

    assert!(report.cancelled);
    assert_eq!(report.points_issued, 1);
    assert_eq!((report.accumulated_dx, report.accumulated_dy), (-40, 0));

    // First point, then four one-pixel recentre steps of 5 ms each
    let mut expected = vec![(40, 0)];
    expected.extend([(-1, 0); 4]);
    assert_eq!(sink.deltas(), expected);
    assert!(start.elapsed() >= Duration::from_millis(20));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Idle);
    assert_eq!((snapshot.accumulated_dx, snapshot.accumulated_dy), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_prompt_during_long_delay() {
    let (engine, _) = engine_with(vec![("slow", pattern(&[(0, 0, 30_000), (0, 0, 0)]))]);
    engine.set_return_to_original(false);
    engine.load_pattern("slow");
    engine.start();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let start = Instant::now();
    engine.stop().await;
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_empty_load_leaves_previous_pattern() {
    let (engine, sink) = engine_with(vec![
        ("good", pattern(&[(2, 2, 10)])),
        ("empty", Pattern::default()),
    ]);

    assert!(engine.load_pattern("good"));
    assert!(matches!(
        engine.try_load_pattern("empty"),
        Err(EngineError::EmptyPattern(_))
    ));
    assert_eq!(engine.loaded_pattern_name().as_deref(), Some("good"));

    assert!(engine.start());
    engine.wait_idle().await;
    assert_eq!(sink.deltas(), vec![(2, 2)]);
}

#[tokio::test(start_paused = true)]
async fn test_scaling_snapshot_at_start() {
    let settings = EngineSettings {
        sensitivity: 4.0,
        resolution_width: 3840,
        resolution_height: 2160,
        ..EngineSettings::default()
    };
    let store: InMemoryPatternStore = [("p", pattern(&[(10, -10, 20), (3, -3, 20)]))]
        .into_iter()
        .collect();
    let sink = Arc::new(RecordingSink::new());
    let engine = PlaybackEngine::with_settings(Arc::new(store), sink.clone(), settings).unwrap();

    engine.load_pattern("p");
    engine.start();
    // Changing settings mid-run must not affect the running pattern
    engine.set_sensitivity(1.0).unwrap();
    engine.wait_idle().await;

    // 2.0 / 4.0 sensitivity and 2x resolution cancel out
    assert_eq!(sink.deltas(), vec![(10, -10), (3, -3)]);
}

#[tokio::test(start_paused = true)]
async fn test_directory_store_with_hotkeys() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("ak47.json"),
        r#"{
            "name": "ak47",
            "description": "test pattern",
            "defaultHotkey": "F1",
            "baseSettings": {
                "sensitivity": 2.0,
                "resolution": { "width": 1920, "height": 1080 },
                "aspectRatio": "16:9"
            },
            "pattern": [
                { "x": 0, "y": 8, "d": 30 },
                { "x": -1, "y": 9, "d": 30 }
            ]
        }"#,
    )
    .unwrap();

    let store = Arc::new(DirectoryPatternStore::open(dir.path()).unwrap());
    let records: Vec<PatternRecord> = store.record("ak47").into_iter().collect();

    let registry = HotkeyRegistry::new();
    assert_eq!(registry.register_defaults(&records), 1);

    let sink = Arc::new(RecordingSink::new());
    let engine = PlaybackEngine::new(store, sink.clone());

    let action = registry.trigger("f1", &engine).await;
    assert!(matches!(action, HotkeyAction::Started(ref name) if name == "ak47"));

    engine.wait_idle().await;
    assert_eq!(sink.deltas(), vec![(0, 8), (-1, 9)]);
    assert!(matches!(
        registry.trigger("F2", &engine).await,
        HotkeyAction::Unbound
    ));
}
