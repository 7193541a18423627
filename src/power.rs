//! OS keep-awake through an inhibitor child process.
//!
//! The inhibitor holds its assertion for as long as it runs, so a request is a
//! spawn and a release is a kill.

use std::{
    process::{Child, Command, Stdio},
    sync::Mutex,
};

use anyhow::{anyhow, Context, Result};

use crate::host::{KeepAwakeLevel, PowerControl};

pub struct ProcessKeepAwake {
    child: Mutex<Option<Child>>,
}

impl ProcessKeepAwake {
    pub fn new() -> Self {
        Self {
            child: Mutex::new(None),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Child>> {
        match self.child.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ProcessKeepAwake {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "macos")]
fn inhibitor_command(level: KeepAwakeLevel) -> Result<Command> {
    let mut cmd = Command::new("caffeinate");
    cmd.arg(match level {
        KeepAwakeLevel::Display => "-d",
    });
    Ok(cmd)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn inhibitor_command(level: KeepAwakeLevel) -> Result<Command> {
    let mut cmd = Command::new("systemd-inhibit");
    cmd.arg(match level {
        KeepAwakeLevel::Display => "--what=idle",
    })
    .args(["--who=orderbell", "--why=Watching for new orders", "sleep", "infinity"]);
    Ok(cmd)
}

#[cfg(not(unix))]
fn inhibitor_command(_level: KeepAwakeLevel) -> Result<Command> {
    Err(anyhow!("keep-awake is not supported on this platform"))
}

fn stop_child(mut child: Child) -> Result<()> {
    child.kill().context("Failed to stop keep-awake inhibitor")?;
    child
        .wait()
        .map(|_| ())
        .context("Failed to reap keep-awake inhibitor")
}

impl PowerControl for ProcessKeepAwake {
    fn request_keep_awake(&self, level: KeepAwakeLevel) -> Result<()> {
        let mut guard = self.lock();
        if let Some(previous) = guard.take() {
            stop_child(previous)?;
        }

        let child = inhibitor_command(level)?
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| anyhow!("Failed to spawn keep-awake inhibitor: {err}"))?;
        log::debug!("keep-awake inhibitor running as pid {}", child.id());
        *guard = Some(child);
        Ok(())
    }

    fn release_keep_awake(&self) -> Result<()> {
        match self.lock().take() {
            Some(child) => stop_child(child),
            None => Ok(()),
        }
    }
}

impl Drop for ProcessKeepAwake {
    fn drop(&mut self) {
        if let Err(err) = self.release_keep_awake() {
            log::warn!("{err:#}");
        }
    }
}
