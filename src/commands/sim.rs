use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::Parser;

use crate::{
    dispatch::{DispatchOutcome, Dispatcher, RunDescriptor},
    params::{parse_loctime, RunWindow, DEFAULT_SCRIPT},
    utils::external_prog::{python_interpreter, SubprocessLauncher},
};

#[derive(Parser, Debug)]
pub struct SimArgs {
    /// text file describing the simulated run
    filename: PathBuf,

    /// source observed during the run, e.g. "Gamma Cas"
    #[arg(long)]
    source: String,

    /// run header version
    #[arg(long, default_value_t = -4, allow_hyphen_values = true)]
    run_version: i32,

    /// longest run duration in seconds
    #[arg(long, value_parser = finite_seconds)]
    length: Option<f64>,

    /// number of frames
    #[arg(long)]
    nframes: Option<u32>,

    /// frame width in seconds
    #[arg(long, value_parser = finite_seconds)]
    frame_size: Option<f64>,

    /// local start time, "YYYY-MM-DD HH:MM:SS"
    #[arg(long, value_parser = loctime_arg)]
    loctime: Option<NaiveDateTime>,

    /// analysis script, relative to the working directory
    #[arg(long, default_value = DEFAULT_SCRIPT)]
    script: String,

    /// only print the command that would be run
    #[arg(long, action)]
    dry_run: bool,
}

impl SimArgs {
    fn window(&self) -> RunWindow {
        let defaults = RunWindow::default();
        RunWindow {
            longest_run: self.length.unwrap_or(defaults.longest_run),
            most_frames: self.nframes.unwrap_or(defaults.most_frames),
            frame_width: self.frame_size.unwrap_or(defaults.frame_width),
            local_start: self.loctime,
            ..defaults
        }
    }
}

fn loctime_arg(value: &str) -> Result<NaiveDateTime, String> {
    parse_loctime(value).map_err(|e| format!("expected \"YYYY-MM-DD HH:MM:SS\": {}", e))
}

fn finite_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if seconds.is_finite() {
        Ok(seconds)
    } else {
        Err(format!("expected a finite number of seconds, got '{}'", value))
    }
}

pub fn run(args: SimArgs) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(SubprocessLauncher::new(), python_interpreter()?)
        .with_script(args.script.clone())
        .dry_run(args.dry_run);

    let run = RunDescriptor::new(args.filename.clone(), args.source.clone(), args.run_version);
    match dispatcher.dispatch(&run, &args.window())? {
        DispatchOutcome::Completed { command } => debug!("'{}' finished", command),
        DispatchOutcome::Planned { command } => println!("{}", command),
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use clap::Parser;

    use super::SimArgs;
    use crate::params::{parse_loctime, RunWindow, DEFAULT_SCRIPT};

    #[test]
    fn defaults_to_simulation_version_and_zero_window() {
        let args = SimArgs::try_parse_from(["sim", "cta_sim.txt", "--source", "run042"]).unwrap();

        assert_eq!(args.run_version, -4);
        assert_eq!(args.script, DEFAULT_SCRIPT);
        assert!(!args.dry_run);
        assert_eq!(args.window(), RunWindow::default());
    }

    #[test]
    fn negative_and_positive_versions_parse() {
        let args =
            SimArgs::try_parse_from(["sim", "f.txt", "--source", "s", "--run-version", "-4"])
                .unwrap();
        assert_eq!(args.run_version, -4);

        let args =
            SimArgs::try_parse_from(["sim", "f.txt", "--source", "s", "--run-version", "3"])
                .unwrap();
        assert_eq!(args.run_version, 3);
    }

    #[test]
    fn overrides_fill_the_window() {
        let args = SimArgs::try_parse_from([
            "sim",
            "f.txt",
            "--source",
            "Gamma Cas",
            "--length",
            "1800",
            "--nframes",
            "72",
            "--frame-size",
            "0.25",
            "--loctime",
            "2024-03-01 20:15:00",
        ])
        .unwrap();

        let window = args.window();
        assert_eq!(window.longest_run, 1800.0);
        assert_eq!(window.most_frames, 72);
        assert_eq!(window.frame_width, 0.25);
        assert_eq!(
            window.local_start,
            Some(parse_loctime("2024-03-01 20:15:00").unwrap())
        );
        assert_eq!(window.earliest_start, RunWindow::default().earliest_start);
    }

    #[test]
    fn malformed_loctime_is_rejected() {
        let result = SimArgs::try_parse_from([
            "sim",
            "f.txt",
            "--source",
            "s",
            "--loctime",
            "yesterday",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn non_finite_durations_are_rejected() {
        for (flag, value) in [
            ("--length", "NaN"),
            ("--length", "inf"),
            ("--frame-size", "infinity"),
        ] {
            let result = SimArgs::try_parse_from(["sim", "f.txt", "--source", "s", flag, value]);
            assert!(result.is_err(), "{} {} was accepted", flag, value);
        }
    }

    #[test]
    fn source_is_required() {
        assert!(SimArgs::try_parse_from(["sim", "f.txt"]).is_err());
    }
}
