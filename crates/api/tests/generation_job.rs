//! Integration tests for the background generation job.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{canned_completion, CannedText};
use idioms_api::background::idiom_generation;
use idioms_db::models::idiom_input::CreateIdiomInput;
use idioms_db::repositories::{IdiomInputRepo, IdiomRepo};
use idioms_pipeline::generator::IdiomGenerator;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

async fn enqueue(pool: &PgPool, idiom: &str) {
    IdiomInputRepo::create_many(
        pool,
        &[CreateIdiomInput {
            idiom: idiom.to_string(),
            meaning: String::new(),
        }],
    )
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tick_drains_one_input(pool: PgPool) {
    enqueue(&pool, "Hit the hay").await;
    enqueue(&pool, "Break a leg").await;
    let generator = IdiomGenerator::new(pool.clone(), Arc::new(CannedText(canned_completion())));

    idiom_generation::tick(&generator).await;

    assert_eq!(IdiomInputRepo::count(&pool).await.unwrap(), 1);
    assert!(IdiomRepo::exists(&pool, "hit-the-hay").await.unwrap());
    assert!(!IdiomRepo::exists(&pool, "break-a-leg").await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_job_runs_until_cancelled(pool: PgPool) {
    enqueue(&pool, "Hit the hay").await;
    let generator = Arc::new(IdiomGenerator::new(
        pool.clone(),
        Arc::new(CannedText(canned_completion())),
    ));
    let cancel = CancellationToken::new();

    // The first tick fires immediately.
    let handle = tokio::spawn(idiom_generation::run(
        generator,
        Duration::from_secs(3600),
        cancel.clone(),
    ));

    let mut generated = false;
    for _ in 0..50 {
        if IdiomRepo::exists(&pool, "hit-the-hay").await.unwrap() {
            generated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(generated, "first tick should process the queued input");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("job should stop after cancellation")
        .unwrap();
}
