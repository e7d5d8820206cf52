// Runs in its own test binary: the process-wide repository can be set once.
#![cfg(not(target_os = "ios"))]

mod common;

use std::sync::Arc;

use bgwork_core::{BgWorkConfig, JobConfiguration};
use bgwork_scheduler::{BackgroundWorkRepository, DirectScheduler, PlatformContext, WorkError};
use common::{id, provider_with, CountingJob, FakeDirectScheduler};

#[tokio::test]
async fn process_wide_repository_initializes_once() {
    assert!(matches!(
        BackgroundWorkRepository::get_instance(),
        Err(WorkError::NotInitialized)
    ));

    let scheduler = Arc::new(FakeDirectScheduler::default());
    let context: PlatformContext = Arc::clone(&scheduler) as Arc<dyn DirectScheduler>;
    let first = BackgroundWorkRepository::initialize(
        context,
        provider_with("SYNC", CountingJob::new(true, true)),
    );

    let other: PlatformContext = Arc::new(FakeDirectScheduler::default());
    let second = BackgroundWorkRepository::initialize(
        other,
        provider_with("UPLOAD", CountingJob::new(true, true)),
    );
    assert!(std::ptr::eq(first, second));

    let instance = BackgroundWorkRepository::get_instance().unwrap();
    assert!(std::ptr::eq(first, instance));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bgwork.toml");
    std::fs::write(
        &path,
        "[jobs.SYNC]\ninterval_in_millis = 900000\nperiodic = true\n",
    )
    .unwrap();
    let config = BgWorkConfig::load(path.to_str()).unwrap();
    instance.register_from_config(&config).await.unwrap();

    assert_eq!(
        instance.registry().get_configuration(&id("SYNC")).unwrap(),
        JobConfiguration::periodic(900_000)
    );
    instance.schedule_job(&id("SYNC")).await.unwrap();
    assert_eq!(scheduler.active().len(), 1);
}
