//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use vault_core::access::ShareGrant;
use vault_core::ffmpeg::FfmpegError;
use vault_core::quality::Quality;
use vault_core::transcoding::{TranscodingNotifier, TranscodingStatus};
use vault_core::types::DbId;
use vault_core::waveform::{WaveformError, DEFAULT_BARS};
use vault_db::models::track::{Track, TrackVersion};
use vault_db::models::track_file::{CreateTrackFile, TrackFile, UnfinishedTranscode};
use vault_pipeline::{AccessStore, MediaTools, StoreError, StreamStore, TranscodeStore};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    next_id: DbId,
    files: HashMap<DbId, TrackFile>,
    tracks: HashMap<DbId, Track>,
    versions: HashMap<DbId, TrackVersion>,
    /// project id -> (owner, quality override)
    projects: HashMap<DbId, (DbId, Option<String>)>,
    user_defaults: HashMap<DbId, String>,
    track_grants: HashMap<(DbId, DbId), ShareGrant>,
    project_grants: HashMap<(DbId, DbId), ShareGrant>,
    status_history: Vec<(DbId, TranscodingStatus)>,
    size_updates: usize,
    access_lookups: Vec<&'static str>,
}

/// In-memory store implementing every pipeline store trait.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_create: AtomicBool,
    fail_statuses: Mutex<HashSet<TranscodingStatus>>,
    fail_waveform: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(state: &mut State) -> DbId {
        state.next_id += 1;
        state.next_id
    }

    // ---- seeding ----

    pub fn add_project(&self, owner: DbId, quality_override: Option<&str>) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        state
            .projects
            .insert(id, (owner, quality_override.map(str::to_string)));
        id
    }

    pub fn add_track(&self, project_id: DbId, owner: DbId) -> Track {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        let track = Track {
            id,
            public_id: format!("track{id}"),
            project_id,
            user_id: owner,
            title: format!("Track {id}"),
            active_version_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.tracks.insert(id, track.clone());
        track
    }

    pub fn add_version(&self, track_id: DbId) -> TrackVersion {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        let version = TrackVersion {
            id,
            track_id,
            version_name: format!("v{id}"),
            notes: None,
            duration_seconds: None,
            version_order: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.versions.insert(id, version.clone());
        version
    }

    pub fn set_active_version(&self, track_id: DbId, version_id: DbId) {
        let mut state = self.state.lock().unwrap();
        if let Some(track) = state.tracks.get_mut(&track_id) {
            track.active_version_id = Some(version_id);
        }
    }

    pub fn add_file(
        &self,
        version_id: DbId,
        quality: Quality,
        path: &str,
        format: &str,
        status: Option<TranscodingStatus>,
    ) -> TrackFile {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        let file = TrackFile {
            id,
            version_id,
            quality: quality.as_str().to_string(),
            file_path: path.to_string(),
            file_size: 0,
            format: format.to_string(),
            bitrate: None,
            content_hash: None,
            transcoding_status: status.map(|s| s.as_str().to_string()),
            original_filename: None,
            waveform: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.files.insert(id, file.clone());
        file
    }

    pub fn set_user_default(&self, user_id: DbId, quality: &str) {
        let mut state = self.state.lock().unwrap();
        state.user_defaults.insert(user_id, quality.to_string());
    }

    pub fn grant_track(&self, track_id: DbId, user_id: DbId, can_edit: bool, can_download: bool) {
        let mut state = self.state.lock().unwrap();
        state.track_grants.insert(
            (track_id, user_id),
            ShareGrant {
                can_edit,
                can_download,
            },
        );
    }

    pub fn grant_project(
        &self,
        project_id: DbId,
        user_id: DbId,
        can_edit: bool,
        can_download: bool,
    ) {
        let mut state = self.state.lock().unwrap();
        state.project_grants.insert(
            (project_id, user_id),
            ShareGrant {
                can_edit,
                can_download,
            },
        );
    }

    // ---- failure injection ----

    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_status(&self, status: TranscodingStatus) {
        self.fail_statuses.lock().unwrap().insert(status);
    }

    pub fn fail_waveform_update(&self) {
        self.fail_waveform.store(true, Ordering::SeqCst);
    }

    // ---- inspection ----

    pub fn file(&self, id: DbId) -> TrackFile {
        self.state.lock().unwrap().files[&id].clone()
    }

    pub fn files_for_version(&self, version_id: DbId) -> Vec<TrackFile> {
        let state = self.state.lock().unwrap();
        let mut files: Vec<_> = state
            .files
            .values()
            .filter(|f| f.version_id == version_id)
            .cloned()
            .collect();
        files.sort_by_key(|f| f.id);
        files
    }

    pub fn status_history(&self, track_file_id: DbId) -> Vec<TranscodingStatus> {
        self.state
            .lock()
            .unwrap()
            .status_history
            .iter()
            .filter(|(id, _)| *id == track_file_id)
            .map(|(_, s)| *s)
            .collect()
    }

    pub fn size_updates(&self) -> usize {
        self.state.lock().unwrap().size_updates
    }

    pub fn access_lookups(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().access_lookups.clone()
    }

    fn with_file<T>(
        &self,
        id: DbId,
        f: impl FnOnce(&mut TrackFile) -> T,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().unwrap();
        let file = state.files.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "track_file",
            id,
        })?;
        Ok(f(file))
    }
}

#[async_trait]
impl TranscodeStore for MemoryStore {
    async fn create_track_file(&self, input: &CreateTrackFile) -> Result<TrackFile, StoreError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected create failure".into()));
        }
        let quality = input.quality.as_str();
        {
            let state = self.state.lock().unwrap();
            if state
                .files
                .values()
                .any(|f| f.version_id == input.version_id && f.quality == quality)
            {
                return Err(StoreError::Unavailable("duplicate version quality".into()));
            }
        }
        let file = self.add_file(
            input.version_id,
            input.quality,
            &input.file_path,
            &input.format,
            input.transcoding_status,
        );
        self.with_file(file.id, |f| {
            f.file_size = input.file_size;
            f.bitrate = input.bitrate;
            f.content_hash = input.content_hash.clone();
            f.original_filename = input.original_filename.clone();
            f.clone()
        })
    }

    async fn update_transcoding_status(
        &self,
        track_file_id: DbId,
        status: TranscodingStatus,
    ) -> Result<(), StoreError> {
        if self.fail_statuses.lock().unwrap().contains(&status) {
            return Err(StoreError::Unavailable(format!("injected {status} failure")));
        }
        self.with_file(track_file_id, |f| {
            f.transcoding_status = Some(status.as_str().to_string());
        })?;
        self.state
            .lock()
            .unwrap()
            .status_history
            .push((track_file_id, status));
        Ok(())
    }

    async fn update_file_size(
        &self,
        track_file_id: DbId,
        file_size: i64,
    ) -> Result<(), StoreError> {
        self.with_file(track_file_id, |f| f.file_size = file_size)?;
        self.state.lock().unwrap().size_updates += 1;
        Ok(())
    }

    async fn update_content_hash(
        &self,
        track_file_id: DbId,
        content_hash: &str,
    ) -> Result<(), StoreError> {
        self.with_file(track_file_id, |f| {
            f.content_hash = Some(content_hash.to_string())
        })
    }

    async fn update_waveform(
        &self,
        track_file_id: DbId,
        waveform_json: &str,
    ) -> Result<(), StoreError> {
        if self.fail_waveform.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected waveform failure".into()));
        }
        self.with_file(track_file_id, |f| {
            f.waveform = Some(waveform_json.to_string())
        })
    }

    async fn list_unfinished_lossy(&self) -> Result<Vec<UnfinishedTranscode>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut rows = Vec::new();
        for lossy in state.files.values() {
            let unfinished = matches!(
                lossy.transcoding_status.as_deref(),
                Some("pending") | Some("processing")
            );
            if lossy.quality != "lossy" || !unfinished {
                continue;
            }
            let Some(source) = state
                .files
                .values()
                .find(|f| f.version_id == lossy.version_id && f.quality == "source")
            else {
                continue;
            };
            let Some(track) = state
                .versions
                .get(&lossy.version_id)
                .and_then(|v| state.tracks.get(&v.track_id))
            else {
                continue;
            };
            rows.push(UnfinishedTranscode {
                track_file_id: lossy.id,
                version_id: lossy.version_id,
                track_public_id: track.public_id.clone(),
                user_id: track.user_id,
                source_path: source.file_path.clone(),
                output_path: lossy.file_path.clone(),
            });
        }
        rows.sort_by_key(|r| r.track_file_id);
        Ok(rows)
    }
}

#[async_trait]
impl StreamStore for MemoryStore {
    async fn find_completed_file(
        &self,
        version_id: DbId,
        quality: Quality,
    ) -> Result<Option<TrackFile>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .files
            .values()
            .find(|f| {
                f.version_id == version_id && f.quality == quality.as_str() && f.is_available()
            })
            .cloned())
    }

    async fn find_track(&self, track_id: DbId) -> Result<Option<Track>, StoreError> {
        Ok(self.state.lock().unwrap().tracks.get(&track_id).cloned())
    }

    async fn find_version(&self, version_id: DbId) -> Result<Option<TrackVersion>, StoreError> {
        Ok(self.state.lock().unwrap().versions.get(&version_id).cloned())
    }

    async fn project_quality_override(
        &self,
        project_id: DbId,
    ) -> Result<Option<String>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .projects
            .get(&project_id)
            .and_then(|(_, q)| q.clone()))
    }

    async fn user_default_quality(&self, user_id: DbId) -> Result<Option<String>, StoreError> {
        Ok(self.state.lock().unwrap().user_defaults.get(&user_id).cloned())
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn project_owner(&self, project_id: DbId) -> Result<Option<DbId>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.access_lookups.push("owner");
        Ok(state.projects.get(&project_id).map(|(owner, _)| *owner))
    }

    async fn track_grant(
        &self,
        track_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ShareGrant>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.access_lookups.push("track_grant");
        Ok(state.track_grants.get(&(track_id, user_id)).copied())
    }

    async fn project_grant(
        &self,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ShareGrant>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.access_lookups.push("project_grant");
        Ok(state.project_grants.get(&(project_id, user_id)).copied())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_id: DbId,
    pub track_public_id: String,
    pub version_id: DbId,
    pub status: TranscodingStatus,
}

/// Notifier that remembers every call in order.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<Notification> {
        self.calls.lock().unwrap().clone()
    }

    pub fn statuses_for(&self, version_id: DbId) -> Vec<TranscodingStatus> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.version_id == version_id)
            .map(|n| n.status)
            .collect()
    }
}

impl TranscodingNotifier for RecordingNotifier {
    fn notify_transcoding_update(
        &self,
        user_id: DbId,
        track_public_id: &str,
        version_id: DbId,
        status: TranscodingStatus,
    ) {
        self.calls.lock().unwrap().push(Notification {
            user_id,
            track_public_id: track_public_id.to_string(),
            version_id,
            status,
        });
    }
}

// ---------------------------------------------------------------------------
// ScriptedTools
// ---------------------------------------------------------------------------

/// Bytes written as the "encoded" output.
pub const FAKE_MP3: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00fake-mp3-frames";

/// Media tools with scripted outcomes.
///
/// A successful transcode writes [`FAKE_MP3`] to the output path.
pub struct ScriptedTools {
    delay: Duration,
    fail_transcode: AtomicBool,
    fail_waveform: AtomicBool,
    transcode_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTools {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Each transcode sleeps for `delay` before finishing.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            fail_transcode: AtomicBool::new(false),
            fail_waveform: AtomicBool::new(false),
            transcode_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn fail_transcode(&self) {
        self.fail_transcode.store(true, Ordering::SeqCst);
    }

    pub fn fail_waveform(&self) {
        self.fail_waveform.store(true, Ordering::SeqCst);
    }

    pub fn transcode_calls(&self) -> usize {
        self.transcode_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTools for ScriptedTools {
    async fn transcode(&self, _source: &Path, output: &Path) -> Result<(), FfmpegError> {
        self.transcode_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = if self.fail_transcode.load(Ordering::SeqCst) {
            Err(FfmpegError::ExecutionFailed {
                exit_code: Some(1),
                output: "Invalid data found when processing input".into(),
            })
        } else {
            tokio::fs::write(output, FAKE_MP3).await.map_err(FfmpegError::from)
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn waveform(&self, _source: &Path, bars: usize) -> Result<Vec<i32>, WaveformError> {
        if self.fail_waveform.load(Ordering::SeqCst) {
            return Err(WaveformError::InvalidDuration(0.0));
        }
        let bars = if bars == 0 { DEFAULT_BARS } else { bars };
        Ok((0..bars).map(|i| 5 + (i % 76) as i32).collect())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Await `fut`, failing the test if it takes longer than `timeout`.
pub async fn within<T>(timeout: Duration, fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(timeout, fut)
        .await
        .expect("operation timed out")
}

/// A source path inside `dir`, as an upload would lay it out.
pub fn source_path(dir: &Path, version_id: DbId) -> PathBuf {
    let version_dir = dir.join(format!("versions/{version_id}"));
    std::fs::create_dir_all(&version_dir).unwrap();
    let path = version_dir.join("source.wav");
    std::fs::write(&path, b"RIFF").unwrap();
    path
}
