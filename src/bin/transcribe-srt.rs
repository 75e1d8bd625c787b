use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::{debug, info};

use transcribe_srt::config::Config;
use transcribe_srt::logging;
use transcribe_srt::{Pipeline, RunReport};

const USAGE: &str = "Usage: transcribe-srt <audio_path_source> <audio_path_decoded>";

/// Exit status for missing positional arguments.
const EXIT_USAGE: u8 = 1;

/// Exit status for `--strict` runs where a stage failed.
const EXIT_STAGE_FAILED: u8 = 2;

fn main() -> ExitCode {
    let params = match parse_params(std::env::args_os(), &mut io::stdout()) {
        Ok(params) => params,
        Err(code) => return ExitCode::from(code),
    };

    logging::init(params.log_json);
    if !params.ignored.is_empty() {
        debug!(count = params.ignored.len(), "ignoring extra arguments");
    }

    let strict = params.strict;
    let config = params.into_config(|key| std::env::var(key).ok());

    let report = Pipeline::from_config(config).run();
    info!(
        elapsed_minutes = report.elapsed_minutes,
        failures = report.errors.len(),
        "run finished"
    );

    ExitCode::from(exit_status(&report, strict))
}

/// Parse `argv`, printing the usage line to `out` when a positional argument is missing.
///
/// `Err` carries the exit status. Help, version and malformed options are handled by clap, which
/// prints its own message and exits.
fn parse_params<I, T>(argv: I, out: &mut impl Write) -> Result<Params, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Params::try_parse_from(argv) {
        Ok(params) => Ok(params),
        Err(err) if err.kind() == ErrorKind::MissingRequiredArgument => {
            let _ = writeln!(out, "{USAGE}");
            Err(EXIT_USAGE)
        }
        Err(err) => err.exit(),
    }
}

/// Stage failures are logged, not reflected in the exit status, unless `strict` is set.
fn exit_status(report: &RunReport, strict: bool) -> u8 {
    if strict && !report.is_success() {
        EXIT_STAGE_FAILED
    } else {
        0
    }
}

#[derive(Parser, Debug)]
#[command(name = "transcribe-srt", version)]
#[command(about = "Convert a recording, transcribe it to SubRip subtitles, and notify a webhook")]
#[command(
    after_help = "Environment:\n  MM_WEBHOOK_URL      webhook endpoint for the completion message\n  CONTEXT             vocabulary hint passed to the model\n  TRANSCRIBE_SRT_LOG  log filter (default: info)"
)]
struct Params {
    /// Source recording (e.g. `call.m4a`). Subtitles are written next to it as `.srt`.
    audio_path_source: PathBuf,

    /// Decoded WAV path. Created by conversion unless it already exists.
    audio_path_decoded: PathBuf,

    /// Whisper model name (resolved to `<models-dir>/ggml-<name>.bin`) or path to a model file.
    #[arg(short = 'm', long = "model", default_value = transcribe_srt::transcriber::DEFAULT_MODEL)]
    model: String,

    /// Directory holding GGML model files.
    #[arg(long = "models-dir", default_value = transcribe_srt::backends::whisper::DEFAULT_MODELS_DIR)]
    models_dir: PathBuf,

    /// Spoken language hint (e.g. `en`). Auto-detected when omitted.
    #[arg(short = 'l', long = "language")]
    language: Option<String>,

    /// Skip conversion and transcribe the decoded path as-is.
    #[arg(long = "no-convert", default_value_t = false)]
    no_convert: bool,

    /// Webhook request timeout in seconds.
    #[arg(long = "notify-timeout-secs", default_value_t = 30)]
    notify_timeout_secs: u64,

    /// Exit with status 2 if any stage failed.
    #[arg(long = "strict", default_value_t = false)]
    strict: bool,

    /// Emit JSON log lines.
    #[arg(long = "log-json", default_value_t = false)]
    log_json: bool,

    /// Extra positional arguments are accepted and ignored.
    #[arg(hide = true)]
    ignored: Vec<OsString>,
}

impl Params {
    fn into_config(self, lookup: impl Fn(&str) -> Option<String>) -> Config {
        Config {
            model: self.model,
            models_dir: self.models_dir,
            language: self.language,
            convert: !self.no_convert,
            notify_timeout: Duration::from_secs(self.notify_timeout_secs),
            ..Config::from_lookup(self.audio_path_source, self.audio_path_decoded, lookup)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transcribe_srt::Error;

    fn report_with(errors: Vec<Error>) -> RunReport {
        RunReport {
            conversion: None,
            elapsed_minutes: 0.0,
            subtitle_entries: None,
            message: "Transcription of a.m4a completed in 0.00 minutes.".to_owned(),
            errors,
        }
    }

    #[test]
    fn missing_positionals_print_usage_and_exit_1() {
        for argv in [&["transcribe-srt"][..], &["transcribe-srt", "call.m4a"][..]] {
            let mut out = Vec::new();
            let code = parse_params(argv, &mut out).expect_err("expected usage exit");

            assert_eq!(code, 1);
            assert_eq!(String::from_utf8(out).expect("utf-8 output"), format!("{USAGE}\n"));
        }
    }

    #[test]
    fn extra_positionals_are_ignored() {
        let mut out = Vec::new();
        let params = parse_params(["transcribe-srt", "a.m4a", "a.wav", "extra", "more"], &mut out)
            .expect("extra arguments are accepted");

        assert!(out.is_empty());
        assert_eq!(params.audio_path_source, PathBuf::from("a.m4a"));
        assert_eq!(params.audio_path_decoded, PathBuf::from("a.wav"));
        assert_eq!(params.ignored, vec![OsString::from("extra"), OsString::from("more")]);
    }

    #[test]
    fn failed_stages_exit_0_unless_strict() {
        let failed = report_with(vec![
            Error::Conversion("unsupported codec".to_owned()),
            Error::Transcription("no such model".to_owned()),
            Error::Notification("connection refused".to_owned()),
        ]);

        assert_eq!(exit_status(&failed, false), 0);
        assert_eq!(exit_status(&failed, true), 2);
        assert_eq!(exit_status(&report_with(Vec::new()), true), 0);
    }

    #[test]
    fn maps_arguments_and_environment_into_config() {
        let params = Params::try_parse_from([
            "transcribe-srt",
            "--model",
            "tiny",
            "--no-convert",
            "-l",
            "en",
            "in/call.m4a",
            "in/call.wav",
        ])
        .expect("parse params");

        let config = params.into_config(|key| match key {
            "MM_WEBHOOK_URL" => Some("http://hooks.local/x".to_owned()),
            _ => None,
        });

        assert_eq!(config.subtitle_path, PathBuf::from("in/call.srt"));
        assert_eq!(config.audio_path_decoded, PathBuf::from("in/call.wav"));
        assert_eq!(config.model, "tiny");
        assert_eq!(config.language.as_deref(), Some("en"));
        assert!(!config.convert);
        assert_eq!(config.webhook_url.as_deref(), Some("http://hooks.local/x"));
        assert!(config.vocabulary_hint.is_none());
        assert_eq!(config.notify_timeout, Duration::from_secs(30));
    }

    #[test]
    fn defaults_convert_with_large_v2() {
        let params =
            Params::try_parse_from(["transcribe-srt", "a.m4a", "a.wav"]).expect("parse params");
        assert!(!params.strict);

        let config = params.into_config(|_| None);
        assert!(config.convert);
        assert_eq!(config.model, "large-v2");
        assert_eq!(config.models_dir, PathBuf::from("./models"));
    }
}
