use std::{error::Error as StdError, path::PathBuf};

use subprocess::ExitStatus;
use thiserror::Error;

use crate::{
    params::{CommandParameters, RunWindow, DEFAULT_SCRIPT},
    utils::external_prog::Launcher,
};

pub const START_BANNER: &str =
    "================> Running python script to calculate delays <=====================";
pub const END_BANNER: &str =
    "===============================> Python is done! <================================";

/// Run header versions this dispatcher knows how to hand to the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ContractVersion {
    /// Simulated CTA runs, described by a text file instead of a recorded run.
    CtaSimulation = -4,
}

impl TryFrom<i32> for ContractVersion {
    type Error = DispatchError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -4 => Ok(ContractVersion::CtaSimulation),
            found => Err(DispatchError::WrongVersion { found }),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("wrong version {found}, only {} is supported", ContractVersion::CtaSimulation as i32)]
    WrongVersion { found: i32 },

    #[error("run descriptor has no source")]
    MissingSource,

    #[error("failed to launch '{command}'")]
    Launch {
        command: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("'{command}' exited with {status:?}")]
    ScriptFailed { command: String, status: ExitStatus },
}

/// One run to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDescriptor {
    pub filename: PathBuf,
    pub source: String,
    pub version: i32,
}

impl RunDescriptor {
    pub fn new(filename: impl Into<PathBuf>, source: impl Into<String>, version: i32) -> Self {
        RunDescriptor {
            filename: filename.into(),
            source: source.into(),
            version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The script ran and exited successfully.
    Completed { command: String },
    /// Dry run, nothing was started.
    Planned { command: String },
}

pub struct Dispatcher<L: Launcher> {
    launcher: L,
    interpreter: String,
    script: String,
    dry_run: bool,
}

impl<L: Launcher> Dispatcher<L> {
    pub fn new(launcher: L, interpreter: impl Into<String>) -> Self {
        Dispatcher {
            launcher,
            interpreter: interpreter.into(),
            script: DEFAULT_SCRIPT.to_string(),
            dry_run: false,
        }
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the run and execute the analysis script for it, blocking until it exits.
    pub fn dispatch(
        &self,
        run: &RunDescriptor,
        window: &RunWindow,
    ) -> Result<DispatchOutcome, DispatchError> {
        info!("run taken on {}    version {}", run.source, run.version);
        debug!("run file '{}'", run.filename.display());

        let version = ContractVersion::try_from(run.version).inspect_err(|_| {
            error!("wrong version, bye!");
        })?;
        debug!("accepted run version {:?}", version);

        if run.source.trim().is_empty() {
            return Err(DispatchError::MissingSource);
        }
        debug!(
            "local start {:?}, earliest start {}",
            window.local_start, window.earliest_start
        );

        let params = CommandParameters::new(&self.script, window, &run.source);
        info!(
            "checking python parameters {}  {}  {}  {}  {}",
            params.length, params.nframes, params.frame_size, params.source, params.loctime
        );

        let command = params.command_line(&self.interpreter);
        if self.dry_run {
            info!("dry run, not starting '{}'", command);
            return Ok(DispatchOutcome::Planned { command });
        }

        info!("{}", START_BANNER);
        let status = self
            .launcher
            .launch(&self.interpreter, &params.script_args())
            .map_err(|e| DispatchError::Launch {
                command: command.clone(),
                source: e.into(),
            })?;
        info!("{}", END_BANNER);

        if status.success() {
            Ok(DispatchOutcome::Completed { command })
        } else {
            warn!("python script exited with exit code {:?}", status);
            Err(DispatchError::ScriptFailed { command, status })
        }
    }
}
