#![allow(dead_code)]

use expectrl::{Eof, Error as ExpectError, Session};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const EXPECT_TIMEOUT: Duration = Duration::from_secs(4);
const EXPECT_RETRIES: usize = 3;

const SCRUBBED_VARS: [&str; 7] = [
    "AGENTDESK_PROVIDER",
    "AGENTDESK_API_KEY",
    "AGENTDESK_MODEL",
    "AGENTDESK_BASE_URL",
    "AGENTDESK_KNOWLEDGE_FILE",
    "OPENAI_API_KEY",
    "GEMINI_API_KEY",
];

pub struct App {
    pub session: Session,
    pub state_home: TempDir,
    _config_home: TempDir,
    _work_dir: TempDir,
}

pub fn bundled_knowledge() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("knowledge.json")
}

/// Starts the binary in a PTY with isolated config, state and working
/// directories. `config` is written to the discovered config path.
pub fn spawn_app(config: Option<&str>, knowledge: &Path, extra_args: &[&str]) -> App {
    spawn_app_with_env(config, knowledge, extra_args, &[])
}

/// Like [`spawn_app`], with `env` applied after the isolated defaults.
pub fn spawn_app_with_env(
    config: Option<&str>,
    knowledge: &Path,
    extra_args: &[&str],
    env: &[(&str, &Path)],
) -> App {
    let config_home = tempfile::tempdir().expect("create XDG_CONFIG_HOME tempdir");
    let state_home = tempfile::tempdir().expect("create XDG_STATE_HOME tempdir");
    let work_dir = tempfile::tempdir().expect("create working dir");

    if let Some(content) = config {
        let dir = config_home.path().join("agentdesk");
        fs::create_dir_all(&dir).expect("create config dir");
        fs::write(dir.join("config.toml"), content).expect("write config");
    }

    let mut command = Command::new(binary_path());
    command
        .arg("--knowledge")
        .arg(knowledge)
        .args(extra_args)
        .current_dir(work_dir.path())
        .env("NO_COLOR", "1")
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("XDG_STATE_HOME", state_home.path());
    for key in SCRUBBED_VARS {
        command.env_remove(key);
    }
    for (key, value) in env {
        command.env(key, value);
    }

    let mut session = Session::spawn(command).expect("spawn agentdesk in PTY");
    session.set_expect_timeout(Some(EXPECT_TIMEOUT));

    App {
        session,
        state_home,
        _config_home: config_home,
        _work_dir: work_dir,
    }
}

pub fn openai_config(base_url: &str, timeout_ms: u64) -> String {
    format!(
        "[completion]\n\
         provider = \"openai\"\n\
         api_key = \"test-key\"\n\
         model = \"gpt-test\"\n\
         base_url = \"{base_url}\"\n\
         timeout_ms = {timeout_ms}\n"
    )
}

pub fn binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_agentdesk")
        .unwrap_or_else(|_| "target/debug/agentdesk".to_string())
}

pub fn submit_line(session: &mut Session, line: &str) {
    session.send(line).expect("send line text");
    session.send([b'\r']).expect("send Enter");
}

pub fn exit_repl(session: &mut Session) {
    submit_line(session, "quit");
    let _ = session.expect(Eof);
    thread::sleep(Duration::from_millis(25));
}

pub fn expect_text(session: &mut Session, text: &str) {
    for attempt in 1..=EXPECT_RETRIES {
        match session.expect(text) {
            Ok(_) => return,
            Err(ExpectError::ExpectTimeout) if attempt < EXPECT_RETRIES => continue,
            Err(err) => panic!(
                "failed to match text {:?} on attempt {}: {}",
                text, attempt, err
            ),
        }
    }

    panic!("unreachable: retries exhausted without returning");
}

pub fn read_trace_file(state_home: &TempDir) -> (PathBuf, String) {
    let trace_dir = state_home.path().join("agentdesk").join("traces");
    let mut entries = fs::read_dir(&trace_dir)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", trace_dir.display()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|err| panic!("failed to iterate {}: {err}", trace_dir.display()));
    assert_eq!(
        entries.len(),
        1,
        "expected exactly one trace file in {}",
        trace_dir.display()
    );
    let entry = entries.remove(0);
    let path = entry.path();
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    (path, content)
}
