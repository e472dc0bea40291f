use crate::event::RepoRef;
use crate::github::{CommitFile, FileStatus, HostingPlatform, PlatformError};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory platform that counts the calls it answers
#[derive(Default)]
pub(crate) struct FakePlatform {
    pub pull_commits: Vec<String>,
    pub files: HashMap<String, Vec<CommitFile>>,
    pub failing_commit: Option<String>,
    pub calls: AtomicUsize,
}

impl HostingPlatform for FakePlatform {
    async fn list_pull_request_commits(
        &self,
        _repo: &RepoRef,
        _number: u64,
    ) -> Result<Vec<String>, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pull_commits.clone())
    }

    async fn commit_files(&self, _repo: &RepoRef, sha: &str) -> Result<Vec<CommitFile>, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Let sibling fetches start before answering
        tokio::task::yield_now().await;
        if self.failing_commit.as_deref() == Some(sha) {
            return Err(PlatformError::Status {
                url: format!("fake://commits/{}", sha),
                status: 502,
                body: "bad gateway".into(),
            });
        }
        Ok(self.files.get(sha).cloned().unwrap_or_default())
    }
}

pub(crate) fn repo() -> RepoRef {
    RepoRef {
        owner: "acme".into(),
        name: "docs".into(),
    }
}

pub(crate) fn commit_file(filename: &str, status: FileStatus, patch: Option<&str>) -> CommitFile {
    CommitFile {
        filename: filename.into(),
        status,
        patch: patch.map(str::to_string),
    }
}

/// Shared buffer that collects formatted log lines
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's logs into a buffer until the guard drops
pub(crate) fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
