use chrono::{NaiveDate, NaiveDateTime};

/// Analysis script computing delays, baselines and uv coordinates, relative to the working directory.
pub const DEFAULT_SCRIPT: &str = "delays/CalcMvtUVonly.py";

/// How a local start time is handed to the script: date and time as two words.
pub const LOCTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rendering of any parameter that has no value.
const UNSET: &str = "0";

/// 2030-01-01 23:59:59, later than the start of any real run.
pub fn far_future_sentinel() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 1, 1)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or(NaiveDateTime::MAX)
}

pub fn parse_loctime(value: &str) -> chrono::ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), LOCTIME_FORMAT)
}

/// Observation window the script should cover.
///
/// Everything is zero until a caller fills it in. `earliest_start` begins at
/// [`far_future_sentinel`] so any real start compares earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct RunWindow {
    pub longest_run: f64,
    pub most_frames: u32,
    pub frame_width: f64,
    pub local_start: Option<NaiveDateTime>,
    pub earliest_start: NaiveDateTime,
}

impl Default for RunWindow {
    fn default() -> Self {
        RunWindow {
            longest_run: 0.0,
            most_frames: 0,
            frame_width: 0.0,
            local_start: None,
            earliest_start: far_future_sentinel(),
        }
    }
}

/// The positional parameters of one script invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParameters {
    pub script: String,
    pub length: String,
    pub nframes: String,
    pub frame_size: String,
    pub source: String,
    pub loctime: String,
}

impl CommandParameters {
    pub fn new(script: &str, window: &RunWindow, source: &str) -> Self {
        CommandParameters {
            script: script.to_string(),
            length: render_number(window.longest_run),
            nframes: window.most_frames.to_string(),
            frame_size: render_number(window.frame_width),
            source: source.to_string(),
            loctime: window
                .local_start
                .map(|t| t.format(LOCTIME_FORMAT).to_string())
                .unwrap_or_else(|| UNSET.to_string()),
        }
    }

    /// The five fields in the order the script reads them.
    pub fn positional(&self) -> [&str; 5] {
        [
            self.length.as_str(),
            self.nframes.as_str(),
            self.frame_size.as_str(),
            self.source.as_str(),
            self.loctime.as_str(),
        ]
    }

    /// Interpreter arguments: the script path followed by every field, split on whitespace.
    pub fn script_args(&self) -> Vec<String> {
        std::iter::once(self.script.clone())
            .chain(
                self.positional()
                    .into_iter()
                    .flat_map(str::split_ascii_whitespace)
                    .map(str::to_string),
            )
            .collect()
    }

    pub fn command_line(&self, interpreter: &str) -> String {
        let mut line = interpreter.to_string();
        for arg in self.script_args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

fn render_number(value: f64) -> String {
    format!("{}", value)
}
