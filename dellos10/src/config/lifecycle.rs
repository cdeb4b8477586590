//! Candidate configuration lifecycle: load, commit, discard, compare and
//! rollback.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::diff::{ConfigDiff, diff};
use crate::driver::{Os10Driver, Session, Transfer};
use crate::error::{Error, Result};
use crate::platform::dellos10::{
    ERROR_MARKER, INVALID_INPUT, NO_SUCH_FILE, PROCEED_TO_DELETE,
};

/// Prompt pattern for commands that may rename the device while they run.
const ANY_PRIVILEGED_PROMPT: &str = "#";

/// How a candidate is applied on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    /// Applied on top of the running configuration.
    Merge,
    /// Full substitute for the running configuration. Staging works, commit
    /// always fails.
    Replace,
}

impl ConfigMode {
    fn pending(self) -> LifecycleState {
        match self {
            Self::Merge => LifecycleState::MergePending,
            Self::Replace => LifecycleState::ReplacePending,
        }
    }

    fn error(self, message: String, command: String, output: String) -> Error {
        match self {
            Self::Merge => Error::MergeConfig {
                message,
                command,
                output,
            },
            Self::Replace => Error::ReplaceConfig {
                message,
                command,
                output,
            },
        }
    }
}

/// Where the lifecycle currently stands.
///
/// `Committed` and `Discarded` end a cycle; a new [`load_candidate`]
/// starts the next one from either.
///
/// [`load_candidate`]: Os10Driver::load_candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Idle,
    CandidateLoaded,
    MergePending,
    ReplacePending,
    Committed,
    Discarded,
}

/// Candidate text, from a local file or given inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    File(PathBuf),
    Inline(String),
}

impl CandidateSource {
    /// Build from optional parts; exactly one must be given.
    pub fn from_parts(file: Option<&Path>, config: Option<&str>) -> Result<Self> {
        match (file, config) {
            (Some(_), Some(_)) => Err(Error::invalid_argument(
                "cannot set both a source file and an inline configuration",
            )),
            (Some(path), None) => Ok(Self::File(path.to_path_buf())),
            (None, Some(text)) => Ok(Self::Inline(text.to_string())),
            (None, None) => Err(Error::invalid_argument(
                "either a source file or an inline configuration is required",
            )),
        }
    }
}

/// Per-driver lifecycle state.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    state: LifecycleState,
    mode: Option<ConfigMode>,
}

impl<S: Session> Os10Driver<S> {
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state
    }

    /// Mode of the loaded candidate, if any.
    pub fn candidate_mode(&self) -> Option<ConfigMode> {
        self.lifecycle.mode
    }

    fn candidate_file(&self, mode: ConfigMode) -> &str {
        match mode {
            ConfigMode::Merge => &self.options.merge_cfg,
            ConfigMode::Replace => &self.options.candidate_cfg,
        }
    }

    /// File of the loaded candidate, or the merge file when none is loaded.
    fn current_candidate_file(&self) -> String {
        let mode = self.lifecycle.mode.unwrap_or(ConfigMode::Merge);
        self.candidate_file(mode).to_string()
    }

    fn set_state(&mut self, state: LifecycleState) {
        if self.lifecycle.state != state {
            debug!("lifecycle: {:?} -> {:?}", self.lifecycle.state, state);
            self.lifecycle.state = state;
        }
    }

    /// Save the running configuration to the rollback file.
    async fn snapshot_running(&mut self) -> Result<()> {
        let command = format!("copy running-configuration home://{}", self.options.rollback_cfg);
        self.dispatch(&command).await?;
        Ok(())
    }

    /// Restore the running configuration from the last rollback snapshot and
    /// save it to startup.
    pub async fn rollback(&mut self) -> Result<()> {
        let command = format!("copy home://{} running-configuration", self.options.rollback_cfg);
        info!("rollback: restoring {}", self.options.rollback_cfg);
        let output = self
            .session
            .send_command_expect(&command, ANY_PRIVILEGED_PROMPT)
            .await?;
        self.session.set_base_prompt().await?;
        if output.contains(ERROR_MARKER) || output.contains(INVALID_INPUT) {
            return Err(Error::command(command, output));
        }
        self.dispatch("write memory").await?;
        Ok(())
    }

    /// Apply the loaded candidate.
    ///
    /// A rollback snapshot is always taken first. Replace commits then fail
    /// with [`Error::ReplaceConfig`]. A merge the device rejects is rolled
    /// back before [`Error::MergeConfig`] is returned. On error the candidate
    /// stays loaded so the caller can retry or discard.
    pub async fn commit(&mut self) -> Result<()> {
        let mode = match (self.lifecycle.state, self.lifecycle.mode) {
            (LifecycleState::CandidateLoaded, Some(mode)) => mode,
            _ => return Err(Error::invalid_argument("no candidate configuration loaded")),
        };

        self.set_state(mode.pending());
        match self.apply(mode).await {
            Ok(()) => {
                info!("commit: {:?} candidate applied and saved", mode);
                self.lifecycle.mode = None;
                self.set_state(LifecycleState::Committed);
                Ok(())
            }
            Err(e) => {
                self.set_state(LifecycleState::CandidateLoaded);
                Err(e)
            }
        }
    }

    async fn apply(&mut self, mode: ConfigMode) -> Result<()> {
        self.snapshot_running().await?;
        match mode {
            ConfigMode::Replace => {
                return Err(Error::ReplaceConfig {
                    message: "Configuration replace is not supported".to_string(),
                    command: "commit".to_string(),
                    output: String::new(),
                });
            }
            ConfigMode::Merge => self.merge().await?,
        }
        self.dispatch("write memory").await?;
        Ok(())
    }

    async fn merge(&mut self) -> Result<()> {
        let file = self.options.merge_cfg.clone();
        let listing = self.dispatch("dir home").await?;
        if !listing.contains(&file) {
            return Err(Error::MergeConfig {
                message: format!("Merge source config file {file} does not exist"),
                command: "dir home".to_string(),
                output: listing,
            });
        }

        // The prompt may change mid-merge if the candidate sets a hostname.
        let command = format!("copy home://{file} running-configuration");
        let output = self
            .session
            .send_command_expect(&command, ANY_PRIVILEGED_PROMPT)
            .await?;
        let rejected = output.contains(INVALID_INPUT) || output.contains(ERROR_MARKER);

        // A failed resync must not keep a rejected merge from being rolled back.
        if let Err(e) = self.session.set_base_prompt().await {
            if !rejected {
                return Err(e);
            }
            warn!("commit: prompt resync after rejected merge failed: {}", e);
        }

        if rejected {
            warn!("commit: merge rejected, rolling back");
            let notice = match self.rollback().await {
                Ok(()) => "Configuration merge failed; automatic rollback attempted".to_string(),
                Err(e) => format!(
                    "Configuration merge failed; automatic rollback attempted and failed ({e})"
                ),
            };
            return Err(Error::MergeConfig {
                message: format!("{notice}:\n{output}"),
                command,
                output,
            });
        }
        Ok(())
    }

    /// Delete the pending candidate file. Deleting a file that is already
    /// gone succeeds.
    pub async fn discard(&mut self) -> Result<()> {
        let command = format!("delete home://{}", self.current_candidate_file());
        self.session.set_base_prompt().await?;
        let mut output = self.session.send_command_timing(&command).await?;
        if output.contains(PROCEED_TO_DELETE) {
            output = self.session.send_command_timing("yes").await?;
        }

        if output.contains(NO_SUCH_FILE) {
            debug!("discard: nothing to delete");
        } else if output.contains(ERROR_MARKER) {
            return Err(Error::command(command, output));
        }

        self.lifecycle.mode = None;
        self.set_state(LifecycleState::Discarded);
        Ok(())
    }

    /// Diff the staged candidate against the running configuration. Does not
    /// change anything on the device.
    pub async fn compare_candidate(&mut self) -> Result<ConfigDiff> {
        let file = self.current_candidate_file();
        let candidate = self.dispatch(&format!("show file home {file}")).await?;
        let running = self.dispatch("show running-configuration").await?;
        Ok(diff(&candidate, &running))
    }
}

impl<S: Session + Transfer> Os10Driver<S> {
    /// Stage a candidate on the device under the file name for `mode`.
    ///
    /// Inline text goes through a local temporary file which is removed
    /// whatever the outcome. A failed load leaves the lifecycle unchanged.
    pub async fn load_candidate(&mut self, source: CandidateSource, mode: ConfigMode) -> Result<()> {
        let remote = self.options.remote_path(self.candidate_file(mode));

        let result = match source {
            CandidateSource::File(path) => self.session.put(&path, &remote).await,
            CandidateSource::Inline(text) => {
                let mut staged = tempfile::Builder::new()
                    .prefix("os10-candidate-")
                    .suffix(".txt")
                    .tempfile()?;
                staged.write_all(text.as_bytes())?;
                staged.flush()?;
                self.session.put(staged.path(), &remote).await
            }
        };

        if let Err(e) = result {
            return Err(mode.error(
                format!("Transfer to remote device failed: {e}"),
                format!("put {remote}"),
                String::new(),
            ));
        }

        info!("load: {:?} candidate staged at {}", mode, remote);
        self.lifecycle.mode = Some(mode);
        self.set_state(LifecycleState::CandidateLoaded);
        Ok(())
    }

    /// [`load_candidate`](Self::load_candidate) in merge mode from exactly one
    /// of `file` or `config`.
    pub async fn load_merge_candidate(
        &mut self,
        file: Option<&Path>,
        config: Option<&str>,
    ) -> Result<()> {
        let source = CandidateSource::from_parts(file, config)?;
        self.load_candidate(source, ConfigMode::Merge).await
    }

    /// [`load_candidate`](Self::load_candidate) in replace mode from exactly
    /// one of `file` or `config`.
    pub async fn load_replace_candidate(
        &mut self,
        file: Option<&Path>,
        config: Option<&str>,
    ) -> Result<()> {
        let source = CandidateSource::from_parts(file, config)?;
        self.load_candidate(source, ConfigMode::Replace).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverOptions;
    use crate::driver::mock::MockSession;
    use tokio_test::assert_ok;

    const SNAPSHOT: &str = "copy running-configuration home://rollback_config.txt";
    const RESTORE: &str = "copy home://rollback_config.txt running-configuration";
    const MERGE: &str = "copy home://merge_config.txt running-configuration";
    const DIR_HOME: &str = "\
Directory contents for folder: home
Date (modified)        Size (bytes)  Name
---------------------  ------------  -----------
2024-01-23T09:58:57Z   4207          merge_config.txt
2024-01-09T06:15:00Z   35776         startup.xml";

    fn driver(session: MockSession) -> Os10Driver<MockSession> {
        Os10Driver::new(session, DriverOptions::default())
    }

    #[test]
    fn test_source_from_parts() {
        assert!(matches!(
            CandidateSource::from_parts(Some(Path::new("a.txt")), Some("hostname x")),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            CandidateSource::from_parts(None, None),
            Err(Error::InvalidArgument { .. })
        ));
        assert_eq!(
            CandidateSource::from_parts(None, Some("hostname x")).unwrap(),
            CandidateSource::Inline("hostname x".to_string())
        );
    }

    #[tokio::test]
    async fn test_inline_load_stages_and_removes_temp_file() {
        let mut driver = driver(MockSession::new());
        driver
            .load_merge_candidate(None, Some("hostname leaf1\n"))
            .await
            .unwrap();

        let put = &driver.session.puts[0];
        assert_eq!(put.remote, "/home/admin/merge_config.txt");
        assert_eq!(put.content, "hostname leaf1\n");
        assert!(!put.local.exists());
        assert_eq!(driver.lifecycle_state(), LifecycleState::CandidateLoaded);
        assert_eq!(driver.candidate_mode(), Some(ConfigMode::Merge));
    }

    #[tokio::test]
    async fn test_failed_transfer_maps_to_mode_error() {
        let mut driver = driver(MockSession::new().failing_transfer());
        let err = driver
            .load_replace_candidate(None, Some("hostname leaf1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReplaceConfig { .. }));
        assert!(!driver.session.puts[0].local.exists());
        assert_eq!(driver.session.puts[0].remote, "/home/admin/candidate_config.txt");
        assert_eq!(driver.lifecycle_state(), LifecycleState::Idle);

        let mut driver = self::driver(MockSession::new().failing_transfer());
        let err = driver
            .load_merge_candidate(None, Some("hostname leaf1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MergeConfig { .. }));
    }

    #[tokio::test]
    async fn test_commit_without_candidate() {
        let mut driver = driver(MockSession::new());
        assert!(matches!(
            driver.commit().await,
            Err(Error::InvalidArgument { .. })
        ));
        assert!(driver.session.commands.is_empty());
    }

    #[tokio::test]
    async fn test_merge_commit() {
        let mut driver = driver(MockSession::new().reply("dir home", DIR_HOME));
        assert_ok!(driver.load_merge_candidate(None, Some("ntp server 10.0.0.100")).await);
        assert_ok!(driver.commit().await);

        assert_eq!(
            driver.session.commands,
            vec![SNAPSHOT, "dir home", MERGE, "write memory"]
        );
        assert_eq!(driver.lifecycle_state(), LifecycleState::Committed);
        assert_eq!(driver.candidate_mode(), None);
    }

    #[tokio::test]
    async fn test_rejected_merge_rolls_back_first() {
        let rejected = "ntp servr 10.0.0.100\n      ^\n% Error: Invalid input detected at \"^\" marker.";
        let mut driver = driver(
            MockSession::new()
                .reply("dir home", DIR_HOME)
                .reply(MERGE, rejected),
        );
        driver.load_merge_candidate(None, Some("ntp servr 10.0.0.100")).await.unwrap();
        let err = driver.commit().await.unwrap_err();

        assert_eq!(
            driver.session.commands,
            vec![SNAPSHOT, "dir home", MERGE, RESTORE, "write memory"]
        );
        match &err {
            Error::MergeConfig { message, output, .. } => {
                assert!(message.contains("automatic rollback attempted"));
                assert!(message.contains(rejected));
                assert_eq!(output, rejected);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(driver.lifecycle_state(), LifecycleState::CandidateLoaded);
    }

    #[tokio::test]
    async fn test_rejected_merge_with_failed_rollback() {
        let rejected = "% Error: Invalid input detected at \"^\" marker.";
        let mut driver = driver(
            MockSession::new()
                .reply("dir home", DIR_HOME)
                .reply(MERGE, rejected)
                .reply(RESTORE, "% Error: No such file or directory"),
        );
        assert_ok!(driver.load_merge_candidate(None, Some("ntp servr 10.0.0.100")).await);
        let err = driver.commit().await.unwrap_err();

        match &err {
            Error::MergeConfig { message, output, .. } => {
                assert!(message.contains("automatic rollback attempted and failed"));
                assert!(message.contains("No such file or directory"));
                assert!(message.ends_with(rejected));
                assert_eq!(output, rejected);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(driver.session.commands, vec![SNAPSHOT, "dir home", MERGE, RESTORE]);
        assert_eq!(driver.lifecycle_state(), LifecycleState::CandidateLoaded);
    }

    #[tokio::test]
    async fn test_rejected_merge_rolls_back_when_resync_fails() {
        // Syncs: snapshot, dir home, then the one right after the merge.
        let mut driver = driver(
            MockSession::new()
                .reply("dir home", DIR_HOME)
                .reply(MERGE, "% Error: Invalid input detected at \"^\" marker.")
                .failing_prompt_sync(3),
        );
        assert_ok!(driver.load_merge_candidate(None, Some("ntp servr 10.0.0.100")).await);
        let err = driver.commit().await.unwrap_err();

        assert!(matches!(err, Error::MergeConfig { .. }));
        assert!(driver.session.commands.iter().any(|c| c == RESTORE));
        assert_eq!(driver.lifecycle_state(), LifecycleState::CandidateLoaded);
    }

    #[tokio::test]
    async fn test_accepted_merge_resync_failure_is_returned() {
        let mut driver = driver(
            MockSession::new()
                .reply("dir home", DIR_HOME)
                .failing_prompt_sync(3),
        );
        assert_ok!(driver.load_merge_candidate(None, Some("ntp server 10.0.0.100")).await);
        let err = driver.commit().await.unwrap_err();

        assert!(err.is_connection_closed());
        assert_eq!(driver.session.commands, vec![SNAPSHOT, "dir home", MERGE]);
        assert_eq!(driver.lifecycle_state(), LifecycleState::CandidateLoaded);
    }

    #[tokio::test]
    async fn test_merge_file_missing() {
        let mut driver = driver(MockSession::new().reply("dir home", "startup.xml"));
        driver.load_merge_candidate(None, Some("hostname x")).await.unwrap();
        let err = driver.commit().await.unwrap_err();
        assert!(matches!(err, Error::MergeConfig { .. }));
        assert!(!driver.session.commands.iter().any(|c| c == MERGE));
        assert_eq!(driver.lifecycle_state(), LifecycleState::CandidateLoaded);
    }

    #[tokio::test]
    async fn test_replace_commit_snapshots_then_fails() {
        let mut driver = driver(MockSession::new());
        driver.load_replace_candidate(None, Some("hostname x")).await.unwrap();
        let err = driver.commit().await.unwrap_err();

        assert!(matches!(err, Error::ReplaceConfig { .. }));
        assert_eq!(driver.session.commands, vec![SNAPSHOT]);
        assert_eq!(driver.lifecycle_state(), LifecycleState::CandidateLoaded);
    }

    #[tokio::test]
    async fn test_discard_twice() {
        let delete = "delete home://merge_config.txt";
        let mut driver = driver(
            MockSession::new()
                .reply(delete, "Proceed to delete home://merge_config.txt [confirm yes/no(default)]:")
                .reply("yes", "")
                .reply("yes", "% Error: No such file or directory"),
        );
        driver.load_merge_candidate(None, Some("hostname x")).await.unwrap();

        assert_ok!(driver.discard().await);
        assert_eq!(driver.lifecycle_state(), LifecycleState::Discarded);
        assert_ok!(driver.discard().await);
        assert_eq!(driver.lifecycle_state(), LifecycleState::Discarded);
        assert_eq!(driver.session.commands, vec![delete, "yes", delete, "yes"]);
    }

    #[tokio::test]
    async fn test_compare_round_trip() {
        let config = "interface ethernet1/1/1\n description uplink\n no shutdown";
        let running = "! Version 10.5.2.3\nhostname leaf1\ninterface ethernet1/1/1\n description uplink\n no shutdown";
        let mut driver = driver(
            MockSession::new()
                .reply("show file home merge_config.txt", config)
                .reply("show running-configuration", running),
        );
        driver.load_merge_candidate(None, Some(config)).await.unwrap();
        let result = driver.compare_candidate().await.unwrap();
        assert!(result.additions.is_empty());

        let missing_line = "interface ethernet1/1/1\n description uplink";
        let mut driver = self::driver(
            MockSession::new()
                .reply("show file home merge_config.txt", config)
                .reply("show running-configuration", missing_line),
        );
        driver.load_merge_candidate(None, Some(config)).await.unwrap();
        let result = driver.compare_candidate().await.unwrap();
        assert_eq!(result.additions, vec!["interface ethernet1/1/1", " no shutdown"]);
        assert_eq!(driver.lifecycle_state(), LifecycleState::CandidateLoaded);
    }

    #[tokio::test]
    async fn test_rollback() {
        let mut driver = driver(MockSession::new());
        driver.rollback().await.unwrap();
        assert_eq!(driver.session.commands, vec![RESTORE, "write memory"]);

        let mut driver = self::driver(
            MockSession::new().reply(RESTORE, "% Error: No such file or directory"),
        );
        assert!(matches!(driver.rollback().await, Err(Error::Command { .. })));
    }
}
