use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub config_path: PathBuf,
    pub project_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config").join("config.json");
        let project_dir = temp_dir.path().join("project");
        std::fs::create_dir_all(&project_dir).expect("Failed to create project dir");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_cowale-kit"));

        Self {
            _temp_dir: temp_dir,
            config_path,
            project_dir,
            bin_path,
        }
    }

    /// Command isolated from the user's config, token and the real GitHub API.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.current_dir(&self.project_dir);
        cmd.env("COWALE_KIT_CONFIG_PATH", &self.config_path);
        // Port 9 (discard) so a test that forgets to mock fails fast
        cmd.env("COWALE_KIT_API_URL", "http://127.0.0.1:9");
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_CONFIG_HOME", self._temp_dir.path().join("config"));
        cmd.env("CLICOLOR", "0");
        cmd.env_remove("GITHUB_TOKEN");
        cmd.env_remove("RUST_LOG");
        cmd.env_remove("COWALE_KIT_OWNER");
        cmd.env_remove("COWALE_KIT_REPO");
        cmd.env_remove("COWALE_KIT_BRANCH");
        cmd
    }

    /// Same as [`cmd`](Self::cmd) but pointed at a mock server, for use from async tests.
    pub fn mocked_cmd(&self, server: &MockServer) -> tokio::process::Command {
        let mut cmd = self.cmd();
        cmd.env("COWALE_KIT_API_URL", server.uri());
        tokio::process::Command::from(cmd)
    }

    pub fn agent_dir(&self) -> PathBuf {
        self.project_dir.join(".agent")
    }

    pub fn staging_dirs(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.project_dir)
            .expect("Failed to list project dir")
            .map(|e| e.expect("bad dir entry").path())
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().starts_with(".agent-download-tmp"))
                    .unwrap_or(false)
            })
            .collect()
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_exit_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.status.code(),
            Some(code),
            "Unexpected exit code\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).expect("Output was not valid JSON")
    }
}

/// Gzip tarball shaped like a GitHub download: everything under one
/// `<root>/` directory. A `None` body makes a directory entry.
#[allow(dead_code)]
pub fn kit_tarball(root: &str, entries: &[(&str, Option<&str>)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (entry_path, body) in entries {
        let full_path = format!("{}/{}", root, entry_path);
        let mut header = tar::Header::new_gnu();
        header.set_mtime(1_700_000_000);
        match body {
            Some(body) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(body.len() as u64);
                builder
                    .append_data(&mut header, &full_path, body.as_bytes())
                    .expect("Failed to append file");
            }
            None => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder
                    .append_data(&mut header, &full_path, std::io::empty())
                    .expect("Failed to append dir");
            }
        }
    }

    builder
        .into_inner()
        .expect("Failed to finish tar")
        .finish()
        .expect("Failed to finish gzip")
}

/// The kit used by most tests: one agent, one skill, one workflow, plus GEMINI.md.
#[allow(dead_code)]
pub fn sample_kit(root: &str) -> Vec<u8> {
    kit_tarball(
        root,
        &[
            ("README.md", Some("# Cowale AI Kit")),
            (".agent/agents/a.md", Some("# Agent A")),
            (".agent/skills/x/", None),
            (".agent/skills/x/SKILL.md", Some("# Skill X")),
            (".agent/workflows/w.md", Some("# Workflow W")),
            (".agent/rules/GEMINI.md", Some("# Kit rules")),
        ],
    )
}

#[allow(dead_code)]
pub async fn mount_tarball(server: &MockServer, branch: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/cowale/cowaleAiKit/tarball/{}", branch)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}
