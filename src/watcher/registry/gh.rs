//! GitHub release host backed by the `gh` CLI.

use super::{HostedRelease, ReleaseHost};
use crate::watcher::{
    WatchConfig,
    error::{Error, Result},
    utils::process::{failure_reason, locate_tool, run_captured},
};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ReleaseView {
    #[serde(default, rename = "tagName")]
    tag_name: String,
    #[serde(default)]
    body: String,
}

/// [`ReleaseHost`] that shells out to `gh release`.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: PathBuf,
    repo: Option<String>,
    timeout: Duration,
    publish_timeout: Duration,
}

impl GhCli {
    /// Locates `gh` in `PATH`.
    pub fn locate(config: &WatchConfig, repo: Option<String>) -> Result<Self> {
        Ok(Self {
            program: locate_tool("gh")?,
            repo,
            timeout: config.command_timeout,
            publish_timeout: config.publish_timeout,
        })
    }

    fn release_args<I, S>(&self, args: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut all: Vec<OsString> = vec!["release".into()];
        all.extend(args.into_iter().map(Into::into));
        if let Some(repo) = &self.repo {
            all.push("-R".into());
            all.push(repo.into());
        }
        all
    }
}

impl ReleaseHost for GhCli {
    async fn view_latest(&self) -> Result<Option<HostedRelease>> {
        let args = self.release_args(["view", "--json", "body,tagName"]);
        let output = run_captured(&self.program, &args, self.timeout).await?;
        if !output.status.success() {
            // gh exits non-zero when the repository has no releases yet
            log::debug!("gh release view: {}", failure_reason(&output));
            return Ok(None);
        }
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let view: ReleaseView = serde_json::from_slice(&output.stdout)?;
        Ok(Some(HostedRelease {
            tag: view.tag_name,
            body: view.body,
        }))
    }

    async fn view_tag(&self, tag: &str) -> Result<bool> {
        let args = self.release_args(["view", tag, "--json", "tagName"]);
        let output = run_captured(&self.program, &args, self.timeout).await?;
        Ok(output.status.success())
    }

    async fn create(
        &self,
        tag: &str,
        assets: &[PathBuf],
        notes_file: &Path,
        title: &str,
    ) -> Result<()> {
        let mut args: Vec<OsString> = vec!["create".into(), tag.into()];
        args.extend(assets.iter().map(|a| a.as_os_str().to_os_string()));
        args.push("-F".into());
        args.push(notes_file.as_os_str().to_os_string());
        args.push("-t".into());
        args.push(title.into());
        let args = self.release_args(args);

        let output = run_captured(&self.program, &args, self.publish_timeout)
            .await
            .map_err(|e| Error::Publish {
                tag: tag.to_string(),
                reason: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(Error::Publish {
                tag: tag.to_string(),
                reason: failure_reason(&output),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(repo: Option<&str>) -> GhCli {
        GhCli {
            program: PathBuf::from("gh"),
            repo: repo.map(String::from),
            timeout: Duration::from_secs(1),
            publish_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn repo_selector_is_appended() {
        let args = cli(Some("owner/mirror")).release_args(["view", "1.0"]);
        assert_eq!(args, ["release", "view", "1.0", "-R", "owner/mirror"]);

        let args = cli(None).release_args(["view"]);
        assert_eq!(args, ["release", "view"]);
    }

    #[test]
    fn view_json_parses() {
        let view: ReleaseView =
            serde_json::from_str(r#"{"body":"Md5: abc\n","tagName":"1.2.3"}"#).unwrap();
        assert_eq!(view.tag_name, "1.2.3");
        assert_eq!(view.body, "Md5: abc\n");
    }
}
