//! Runs the `sit-solver` binary on model files written to the temporary directory.
#![allow(
    dead_code,
    reason = "is used in integration tests but unable to find a way to silence these warnings"
)]

use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::time::Duration;

use wait_timeout::ChildExt;

#[derive(Debug)]
pub(crate) struct Files {
    pub(crate) model_file: PathBuf,
    pub(crate) log_file: PathBuf,
    pub(crate) err_file: PathBuf,
}

impl Files {
    pub(crate) fn cleanup(self) -> std::io::Result<()> {
        std::fs::remove_file(self.model_file)?;
        std::fs::remove_file(self.log_file)?;
        std::fs::remove_file(self.err_file)?;
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct Run {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
    pub(crate) files: Files,
}

/// A path in the temporary directory which is unique to this test process.
pub(crate) fn temporary_path(name: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "sit-solver-{}-{name}.{extension}",
        std::process::id()
    ))
}

/// Writes `model` to a file named after `name` and runs the solver on it.
pub(crate) fn run_solver(name: &str, model: &str) -> Run {
    run_solver_with_options(name, model, std::iter::empty::<String>())
}

pub(crate) fn run_solver_with_options(
    name: &str,
    model: &str,
    args: impl IntoIterator<Item = impl AsRef<std::ffi::OsStr>>,
) -> Run {
    let model_path = temporary_path(name, "sit");
    std::fs::write(&model_path, model).expect("Failed to write the model file.");

    run_solver_on_file(&model_path, args)
}

pub(crate) fn run_solver_on_file(
    model_path: &Path,
    args: impl IntoIterator<Item = impl AsRef<std::ffi::OsStr>>,
) -> Run {
    const TEST_TIMEOUT: Duration = Duration::from_secs(60);

    let solver = PathBuf::from(env!("CARGO_BIN_EXE_sit-solver"));
    let log_file_path = model_path.with_extension("log");
    let err_file_path = model_path.with_extension("err");

    let mut child = Command::new(solver)
        .args(args)
        .arg(model_path)
        .stdout(File::create(&log_file_path).expect("Failed to create the log file."))
        .stderr(File::create(&err_file_path).expect("Failed to create the error file."))
        .stdin(Stdio::null())
        .spawn()
        .expect("Failed to run solver.");

    let status = match child.wait_timeout(TEST_TIMEOUT) {
        Ok(None) => {
            let _ = child.kill();
            panic!("solver took more than {} seconds", TEST_TIMEOUT.as_secs())
        }
        Ok(Some(status)) => status,
        Err(e) => panic!("error starting solver: {e}"),
    };

    Run {
        status,
        stdout: std::fs::read_to_string(&log_file_path).expect("Failed to read the log file."),
        stderr: std::fs::read_to_string(&err_file_path).expect("Failed to read the error file."),
        files: Files {
            model_file: model_path.to_path_buf(),
            log_file: log_file_path,
            err_file: err_file_path,
        },
    }
}

/// The objective value printed by the solver.
pub(crate) fn printed_optval(stdout: &str) -> f64 {
    let pattern = regex::Regex::new(r"(?m)^optval: (\S+)$").expect("valid regex");
    pattern
        .captures(stdout)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or_else(|| panic!("no objective value in the output:\n{stdout}"))
}
