use std::{
    env,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::bail;
use subprocess::{unix::PopenExt, Exec, ExitStatus, Popen};

/// Environment variable overriding the interpreter used to run analysis scripts.
pub const UVSIM_PYTHON_ENV: &str = "UVSIM_PYTHON";

pub const DEFAULT_PYTHON: &str = "python3";

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Something that can run a program to completion.
pub trait Launcher {
    fn launch(&self, program: &str, args: &[String]) -> anyhow::Result<ExitStatus>;
}

/// Runs programs as real child processes, blocking until they exit.
///
/// stdio is inherited, so whatever the script prints goes straight to the terminal.
pub struct SubprocessLauncher {}

impl SubprocessLauncher {
    pub fn new() -> SubprocessLauncher {
        SubprocessLauncher {}
    }
}

impl Launcher for SubprocessLauncher {
    fn launch(&self, program: &str, args: &[String]) -> anyhow::Result<ExitStatus> {
        let mut popen = Exec::cmd(program).args(args).popen()?;
        debug!("started '{}' with pid {:?}", program, popen.pid());
        wait_interruptible(&mut popen)
    }
}

/// Wait for the child, forwarding Ctrl+C to it.
///
/// After SIGINT the child gets [`STOP_GRACE`] to exit before it is killed.
fn wait_interruptible(popen: &mut Popen) -> anyhow::Result<ExitStatus> {
    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted))?;

    while !interrupted.load(Ordering::Relaxed) {
        if let Some(status) = popen.wait_timeout(POLL_INTERVAL)? {
            return Ok(status);
        }
    }

    warn!("interrupted, stopping the python process");
    _ = popen.send_signal(libc::SIGINT);
    let status = match popen.wait_timeout(STOP_GRACE)? {
        Some(status) => status,
        None => {
            _ = popen.kill();
            popen.wait()?
        }
    };
    Ok(status)
}

/// Resolve the interpreter, honouring [`UVSIM_PYTHON_ENV`].
pub fn python_interpreter() -> anyhow::Result<String> {
    interpreter_from(env::var(UVSIM_PYTHON_ENV).ok().as_deref())
}

fn interpreter_from(value: Option<&str>) -> anyhow::Result<String> {
    match value {
        Some("") => bail!("'{UVSIM_PYTHON_ENV}' set to empty string"),
        Some(path) => {
            debug!("using interpreter '{}' from {}", path, UVSIM_PYTHON_ENV);
            Ok(path.to_string())
        }
        None => Ok(DEFAULT_PYTHON.to_string()),
    }
}
