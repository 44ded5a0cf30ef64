//! Per-session trace file. Every line reads `[timestamp] [kind] text`.

use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// What a trace line records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Question,
    KnowledgeMatch,
    KnowledgeMiss,
    Answer,
    Degraded,
    Warning,
    HttpRequest,
    HttpResponse,
    HttpError,
}

impl TraceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Question => "user.in",
            Self::KnowledgeMatch => "kb.match",
            Self::KnowledgeMiss => "kb.miss",
            Self::Answer => "ai.out",
            Self::Degraded => "ai.degraded",
            Self::Warning => "sys.warn",
            Self::HttpRequest => "ai.http.in",
            Self::HttpResponse => "ai.http.out",
            Self::HttpError => "ai.http.err",
        }
    }
}

/// Append-only record of one chat session. A disabled trace accepts every
/// call and writes nothing.
#[derive(Clone)]
pub struct SessionTrace {
    file: Option<Arc<TraceFile>>,
}

struct TraceFile {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    failed: AtomicBool,
}

impl SessionTrace {
    /// Opens `<state dir>/agentdesk/traces/<session_id>.log`.
    pub fn create(session_id: &str) -> Result<Self> {
        let xdg_state_home = env::var("XDG_STATE_HOME").ok();
        let dir = trace_dir(xdg_state_home.as_deref(), dirs::home_dir().as_deref())?;
        Self::create_in_dir(session_id, &dir)
    }

    fn create_in_dir(session_id: &str, dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create trace directory {}", dir.display()))?;

        let path = dir.join(format!("{session_id}.log"));
        let file = open_private(&path)
            .with_context(|| format!("cannot create trace file {}", path.display()))?;

        Ok(Self {
            file: Some(Arc::new(TraceFile {
                path,
                writer: Mutex::new(BufWriter::new(file)),
                failed: AtomicBool::new(false),
            })),
        })
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn create_in_temp_dir(session_id: &str, dir: &Path) -> Result<Self> {
        Self::create_in_dir(session_id, dir)
    }

    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref().map(|file| file.path.as_path())
    }

    /// One trace line per line of `text`; empty text is written as `<empty>`.
    pub fn record(&self, kind: TraceKind, text: &str) {
        let Some(file) = self.file.as_deref() else {
            return;
        };

        let stamp = timestamp();
        let label = kind.label();
        let mut entry = String::new();
        if text.is_empty() {
            entry.push_str(&format!("[{stamp}] [{label:<11}] <empty>\n"));
        }
        for line in text.lines() {
            entry.push_str(&format!("[{stamp}] [{label:<11}] {line}\n"));
        }

        file.append(&entry);
    }

    pub fn warning(&self, text: &str) {
        self.record(TraceKind::Warning, text);
    }
}

impl TraceFile {
    /// Reports the first failure on stderr and stays quiet afterwards.
    fn append(&self, entry: &str) {
        let written = match self.writer.lock() {
            Ok(mut writer) => writer
                .write_all(entry.as_bytes())
                .and_then(|()| writer.flush())
                .map_err(|err| err.to_string()),
            Err(_) => Err("trace writer lock poisoned".to_string()),
        };

        if let Err(reason) = written {
            if !self.failed.swap(true, Ordering::Relaxed) {
                eprintln!(
                    "agentdesk trace warning: cannot write {}: {reason}",
                    self.path.display()
                );
            }
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

fn trace_dir(xdg_state_home: Option<&str>, home: Option<&Path>) -> Result<PathBuf> {
    let state = match xdg_state_home.map(str::trim) {
        Some("") => bail!("cannot place session trace: XDG_STATE_HOME is set but empty"),
        Some(dir) => PathBuf::from(dir),
        None => home
            .ok_or_else(|| anyhow!("cannot place session trace: no home directory"))?
            .join(".local")
            .join("state"),
    };
    Ok(state.join("agentdesk").join("traces"))
}
