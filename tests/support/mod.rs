use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn ocsheet_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ocsheet"))
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Run a command that is expected to fail and return its output.
pub fn run_failing(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        bail!(
            "command {:?} unexpectedly succeeded\nstdout: {}",
            cmd,
            String::from_utf8_lossy(&output.stdout)
        );
    }
    Ok(output)
}

/// Write `contents` to `name` inside `dir` and return the full path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn scratch_dir() -> TempDir {
    TempDir::new().expect("tests require a temp dir")
}

/// Sheet export mirroring the layout analysts use: header row, family in
/// column A, control in column B, further columns ignored.
pub const SAMPLE_SHEET: &str = "\
Family,Control,Implementation Status,Narrative\n\
ACCESS CONTROL,AC-1,,\n\
ACCESS CONTROL,AC-2a.,,\n\
ACCESS   CONTROL,AC-2a.1.,,\n\
ACCESS CONTROL,AC-2 (21),,\n\
ACCESS CONTROL,AC-3 (3)(a),,\n\
ACCESS CONTROL,AC-3   (3)(b)(1),,\n\
ACCESS CONTROL,AC-3 (3)(b)(2),,\n\
AUDIT AND ACCOUNTABILITY,AU-2,,\n\
MADE UP FAMILY,ZZ-1,,\n\
,,,\n";
