//! Champion/challenger protocol against the in-memory and file registries.

use tempfile::TempDir;
use visionops_registry::{
    resolve_alias_artifact, ArtifactLocation, FileRegistry, InMemoryRegistry, ModelRegistry, PromotionEngine,
    PromotionOutcome, PromotionPolicy, RegistryError, RunId, RunMetrics, TrainingRun, CHALLENGER_ALIAS, CHAMPION_ALIAS,
    STATUS_TAG,
};

const MODEL: &str = "yolo11n";
const KEY: &str = "metrics/mAP50-95B";

fn engine() -> PromotionEngine<InMemoryRegistry> {
    PromotionEngine::new(InMemoryRegistry::new(), PromotionPolicy::new(KEY))
}

fn log(engine: &PromotionEngine<InMemoryRegistry>, metrics: RunMetrics) -> TrainingRun {
    engine.registry().log_run(TrainingRun::new(MODEL, metrics)).unwrap()
}

fn status_of(engine: &PromotionEngine<InMemoryRegistry>, version: u64) -> Option<String> {
    let state = engine.registry().snapshot().unwrap();
    state.model(MODEL).unwrap().version(version).unwrap().tags.get(STATUS_TAG).cloned()
}

#[tokio::test]
async fn test_first_run_is_crowned_champion() {
    let engine = engine();
    let run = log(&engine, RunMetrics::new());

    let outcome = engine.promote(MODEL, &run.run_id, "s3://mlflow/1/weights/best.pt").await.unwrap();
    assert!(matches!(outcome, PromotionOutcome::Crowned { .. }));
    assert_eq!(outcome.alias(), Some(CHAMPION_ALIAS));

    let champion = engine.registry().get_alias(MODEL, CHAMPION_ALIAS).await.unwrap().found().unwrap();
    assert_eq!(champion.version, 1);
    assert_eq!(status_of(&engine, 1).as_deref(), Some(CHAMPION_ALIAS));
}

#[tokio::test]
async fn test_better_run_becomes_challenger() {
    let engine = engine();
    let first = log(&engine, RunMetrics::new().with(KEY, 0.50));
    engine.promote(MODEL, &first.run_id, "s3://mlflow/1/weights/best.pt").await.unwrap();

    let second = log(&engine, RunMetrics::new().with(KEY, 0.60));
    let outcome = engine.promote(MODEL, &second.run_id, "s3://mlflow/2/weights/best.pt").await.unwrap();

    match outcome {
        PromotionOutcome::Challenger { ref version, champion_version, current_score, champion_score } => {
            assert_eq!(version.version, 2);
            assert_eq!(champion_version, 1);
            assert!((current_score - 0.60).abs() < 1e-9);
            assert!((champion_score - 0.50).abs() < 1e-9);
        }
        other => panic!("expected challenger, got {other:?}"),
    }

    let registry = engine.registry();
    assert_eq!(registry.get_alias(MODEL, CHALLENGER_ALIAS).await.unwrap().found().unwrap().version, 2);
    assert_eq!(registry.get_alias(MODEL, CHAMPION_ALIAS).await.unwrap().found().unwrap().version, 1);
    assert_eq!(status_of(&engine, 2).as_deref(), Some(CHALLENGER_ALIAS));
}

#[tokio::test]
async fn test_tie_keeps_incumbent() {
    let engine = engine();
    let first = log(&engine, RunMetrics::new().with(KEY, 0.60));
    engine.promote(MODEL, &first.run_id, "s3://mlflow/1/weights/best.pt").await.unwrap();

    let second = log(&engine, RunMetrics::new().with(KEY, 0.60));
    let outcome = engine.promote(MODEL, &second.run_id, "s3://mlflow/2/weights/best.pt").await.unwrap();
    assert!(matches!(outcome, PromotionOutcome::Retained { .. }));
    assert_eq!(outcome.alias(), None);

    // Still registered, just not aliased.
    assert_eq!(outcome.version().version, 2);
    assert_eq!(status_of(&engine, 2), None);
    assert_eq!(engine.registry().get_alias(MODEL, CHALLENGER_ALIAS).await.unwrap().found(), None);
}

#[tokio::test]
async fn test_champion_without_metric_loses_to_any_positive_score() {
    let engine = engine();
    let first = log(&engine, RunMetrics::new().with("metrics/precisionB", 0.9));
    engine.promote(MODEL, &first.run_id, "s3://mlflow/1/weights/best.pt").await.unwrap();

    let second = log(&engine, RunMetrics::new().with(KEY, 0.10));
    let outcome = engine.promote(MODEL, &second.run_id, "s3://mlflow/2/weights/best.pt").await.unwrap();
    assert!(matches!(outcome, PromotionOutcome::Challenger { .. }));
}

#[tokio::test]
async fn test_repeated_better_runs_move_challenger() {
    let engine = engine();
    let first = log(&engine, RunMetrics::new().with(KEY, 0.1));
    engine.promote(MODEL, &first.run_id, "s3://mlflow/1/weights/best.pt").await.unwrap();

    for (i, score) in [0.2, 0.3].into_iter().enumerate() {
        let run = log(&engine, RunMetrics::new().with(KEY, score));
        let outcome = engine.promote(MODEL, &run.run_id, &format!("s3://mlflow/{}/weights/best.pt", i + 2)).await.unwrap();
        assert!(matches!(outcome, PromotionOutcome::Challenger { .. }));
    }

    let challenger = engine.registry().get_alias(MODEL, CHALLENGER_ALIAS).await.unwrap().found().unwrap();
    assert_eq!(challenger.version, 3);
}

#[tokio::test]
async fn test_unknown_run_is_an_error() {
    let engine = engine();
    let err = engine.promote(MODEL, &RunId::from("missing"), "s3://mlflow/1/weights/best.pt").await.unwrap_err();
    assert!(matches!(err, RegistryError::RunNotFound(_)));
}

#[tokio::test]
async fn test_file_registry_promotion_and_resolution() {
    let temp = TempDir::new().unwrap();
    let engine = PromotionEngine::new(FileRegistry::for_workspace_root(temp.path()), PromotionPolicy::new(KEY));

    let run = engine
        .registry()
        .log_run(TrainingRun::new(MODEL, RunMetrics::new().with(KEY, 0.4)).with_artifact_uri("s3://mlflow/7/abc/artifacts"))
        .unwrap();
    engine.promote(MODEL, &run.run_id, "s3://mlflow/7/abc/artifacts/weights/best.pt").await.unwrap();

    let reopened = FileRegistry::for_workspace_root(temp.path());
    let resolved = resolve_alias_artifact(&reopened, MODEL, CHAMPION_ALIAS).await.unwrap();
    assert_eq!(resolved.version.version, 1);
    assert_eq!(
        resolved.location,
        ArtifactLocation::ObjectStore { bucket: "mlflow".to_string(), key: "7/abc/artifacts/weights/best.pt".to_string() }
    );

    let missing = resolve_alias_artifact(&reopened, MODEL, CHALLENGER_ALIAS).await.unwrap_err();
    assert!(matches!(missing, RegistryError::AliasNotFound { .. }));
}
