//! The pipeline against Postgres through [`PgStore`].

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{wait_until, within, RecordingNotifier, ScriptedTools};
use sqlx::PgPool;
use vault_core::quality::Quality;
use vault_core::transcoding::TranscodingStatus;
use vault_db::models::project::CreateProject;
use vault_db::models::track::{CreateTrack, CreateTrackVersion, Track};
use vault_db::models::track_file::CreateTrackFile;
use vault_db::repositories::{
    ProjectRepo, ShareRepo, TrackFileRepo, TrackRepo, TrackVersionRepo, UserRepo,
};
use vault_pipeline::{
    check_track_access, locate_stream, PgStore, TranscodeVersionInput, Transcoder,
    TranscoderConfig, VersionTranscoder,
};

async fn seed(pool: &PgPool, dir: &std::path::Path) -> (Track, i64, std::path::PathBuf) {
    let owner = UserRepo::create(pool, "owner").await.unwrap();
    let project = ProjectRepo::create(
        pool,
        &CreateProject {
            user_id: owner.id,
            name: "Album".into(),
            quality_override: None,
        },
    )
    .await
    .unwrap();
    let track = TrackRepo::create(
        pool,
        &CreateTrack {
            project_id: project.id,
            user_id: owner.id,
            title: "Opener".into(),
        },
    )
    .await
    .unwrap();
    let version = TrackVersionRepo::create(
        pool,
        &CreateTrackVersion {
            track_id: track.id,
            version_name: "master".into(),
            notes: None,
            duration_seconds: Some(30.0),
            version_order: None,
        },
    )
    .await
    .unwrap();
    TrackRepo::set_active_version(pool, track.id, version.id)
        .await
        .unwrap();

    let source = dir.join("source.wav");
    std::fs::write(&source, b"RIFF").unwrap();
    TrackFileRepo::create(
        pool,
        &CreateTrackFile {
            version_id: version.id,
            quality: Quality::Source,
            file_path: source.to_string_lossy().into_owned(),
            file_size: 4,
            format: "wav".into(),
            bitrate: None,
            content_hash: None,
            transcoding_status: None,
            original_filename: Some("opener.wav".into()),
        },
    )
    .await
    .unwrap();

    let track = TrackRepo::find_by_id(pool, track.id).await.unwrap().unwrap();
    (track, version.id, source)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn submitted_version_completes_in_database(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let (track, version_id, source) = seed(&pool, dir.path()).await;

    let store = Arc::new(PgStore::new(pool.clone()));
    let notifier = Arc::new(RecordingNotifier::default());
    let transcoder = Transcoder::new(
        store.clone(),
        Arc::new(ScriptedTools::new()),
        notifier.clone(),
        TranscoderConfig::default(),
    );
    transcoder.start();

    let lossy = transcoder
        .transcode_version(TranscodeVersionInput {
            version_id,
            source_path: source,
            track_public_id: track.public_id.clone(),
            user_id: track.user_id,
        })
        .await
        .unwrap();

    let done = wait_until(Duration::from_secs(5), || {
        notifier.statuses_for(version_id).contains(&TranscodingStatus::Completed)
    })
    .await;
    within(Duration::from_secs(5), transcoder.stop()).await;
    assert!(done);

    let row = TrackFileRepo::find_by_id(&pool, lossy.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(TranscodingStatus::Completed));
    assert!(row.file_size > 0);
    assert!(row.content_hash.is_some());
    assert!(row.waveform.is_some());

    let file = locate_stream(store.as_ref(), track.id, track.user_id, None, None)
        .await
        .unwrap();
    assert_eq!(file.quality, Quality::Lossy);
    assert_eq!(file.track_file_id, lossy.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stuck_rows_are_found_after_restart(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let (track, version_id, source) = seed(&pool, dir.path()).await;

    // First run: the row is created but the pool never starts.
    let first = Transcoder::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(ScriptedTools::new()),
        Arc::new(RecordingNotifier::default()),
        TranscoderConfig::default(),
    );
    let lossy = first
        .transcode_version(TranscodeVersionInput {
            version_id,
            source_path: source,
            track_public_id: track.public_id.clone(),
            user_id: track.user_id,
        })
        .await
        .unwrap();
    first.stop().await;

    let notifier = Arc::new(RecordingNotifier::default());
    let second = Transcoder::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(ScriptedTools::new()),
        notifier.clone(),
        TranscoderConfig::default(),
    );
    second.start();
    assert_eq!(second.requeue_unfinished().await.unwrap(), 1);

    let done = wait_until(Duration::from_secs(5), || {
        notifier.statuses_for(version_id).contains(&TranscodingStatus::Completed)
    })
    .await;
    within(Duration::from_secs(5), second.stop()).await;
    assert!(done);

    let row = TrackFileRepo::find_by_id(&pool, lossy.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(TranscodingStatus::Completed));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn shared_user_access_from_database(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let (track, _, _) = seed(&pool, dir.path()).await;
    let guest = UserRepo::create(&pool, "guest").await.unwrap();
    let store = PgStore::new(pool.clone());

    let denied = check_track_access(&store, track.id, track.project_id, guest.id)
        .await
        .unwrap();
    assert!(!denied.has_access);

    ShareRepo::grant_project(&pool, track.project_id, track.user_id, guest.id, false, true)
        .await
        .unwrap();
    ShareRepo::grant_track(&pool, track.id, track.user_id, guest.id, false, false)
        .await
        .unwrap();

    let access = check_track_access(&store, track.id, track.project_id, guest.id)
        .await
        .unwrap();
    assert!(access.has_access);
    assert!(!access.can_download);
}
