//! Command-line argument parsing and lenient validation.
//!
//! Bad values never stop the program: they are reported as warnings and the
//! previous (or default) value is kept.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser};
use log::warn;
use std::ffi::OsString;
use std::fmt;
use std::num::IntErrorKind;
use std::path::PathBuf;

use crate::params::{Configuration, Mode, VALUE_LIMIT};

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "spectrum-scope", version)]
#[command(about = "Real-time audio spectrum analyser", long_about = None)]
pub struct Args {
    /// Mono: analyse one channel instead of two
    #[arg(short = 'm', action = ArgAction::Count)]
    pub mono: u8,

    /// Transform size in samples, a power of two (default 512), e.g. -s1024
    #[arg(short = 's', value_name = "N", action = ArgAction::Append)]
    pub transform_size: Vec<String>,

    /// Sample rate in Hz (default 44100), e.g. -r48000
    #[arg(short = 'r', value_name = "HZ", action = ArgAction::Append)]
    pub sample_rate: Vec<String>,

    /// Analyse a 16-bit PCM WAV file instead of the capture device
    #[arg(long, value_name = "PATH", conflicts_with = "sine")]
    pub wav: Option<PathBuf>,

    /// Analyse a synthetic sine wave of this frequency
    #[arg(long, value_name = "HZ", allow_negative_numbers = true)]
    pub sine: Option<String>,

    /// WGSL shader file with vs_main / fs_main entry points
    #[arg(long, value_name = "PATH")]
    pub shader: Option<PathBuf>,
}

/// Tokens passed through to clap as they are
const FLAG_OPTIONS: [&str; 5] = ["-m", "-h", "--help", "-V", "--version"];

/// Long options taking a value, either `--opt value` or `--opt=value`
const VALUE_OPTIONS: [&str; 3] = ["--wav", "--sine", "--shader"];

/// Where samples come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSelection {
    Device,
    Wav(PathBuf),
    Sine(f64),
}

/// A rejected option; the resolver keeps the previous value and carries on
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    UnknownOption(String),
    TooLarge { option: &'static str, value: String },
    NotPowerOfTwo(u64),
    NotANumber { option: &'static str, text: String },
    ZeroSampleRate,
    /// `--sine` frequency that is zero, negative or not finite
    InvalidFrequency(f64),
    /// Arguments could not be parsed at all; defaults are used
    Unparsable(String),
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::UnknownOption(option) => write!(f, "Unknown option {}", option),
            ConfigWarning::TooLarge { option, value } => write!(
                f,
                "Value {} for {} too large, limit set at {} for practical reasons. Option ignored.",
                value, option, VALUE_LIMIT
            ),
            ConfigWarning::NotPowerOfTwo(value) => write!(
                f,
                "Value {} is not a power of two. Only power of two transform sizes are supported. Option ignored.",
                value
            ),
            ConfigWarning::NotANumber { option, text } => write!(
                f,
                "Value '{}' for {} is not a valid number. Option ignored.",
                text, option
            ),
            ConfigWarning::ZeroSampleRate => {
                write!(f, "Sample rate must be greater than zero. Option ignored.")
            }
            ConfigWarning::InvalidFrequency(hz) => write!(
                f,
                "Sine frequency {}Hz must be positive and finite. Option ignored.",
                hz
            ),
            ConfigWarning::Unparsable(msg) => {
                write!(f, "Could not parse arguments ({}); using defaults", msg)
            }
        }
    }
}

/// Outcome of resolving the command line
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: Configuration,
    pub source: SourceSelection,
    pub shader: Option<PathBuf>,
    pub warnings: Vec<ConfigWarning>,
}

/// Resolve `argv` (program name first) into a configuration.
///
/// Each token is judged on its own: anything other than `-m`, `-s<N>`,
/// `-r<N>`, the long options and help/version is dropped with a warning,
/// and the remaining tokens still apply. Combined shorts such as `-ms1024`
/// count as unknown.
///
/// Only help and version requests come back as `Err`; callers usually
/// `exit()` on them. Everything else is resolved, with problems logged and
/// listed in [`Resolution::warnings`].
pub fn resolve<I, T>(argv: I) -> Result<Resolution, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut warnings = Vec::new();
    let mut tokens = screen_tokens(argv.into_iter().map(Into::into), &mut warnings);

    // Whatever clap still rejects (conflicts, missing values) is dropped one
    // option at a time until the rest parses
    let args = loop {
        match Args::try_parse_from(tokens.iter().cloned()) {
            Ok(args) => break args,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp
                        | ErrorKind::DisplayVersion
                        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                return Err(err)
            }
            Err(err) => {
                let Some(index) =
                    offending_token(&tokens, &err).or_else(|| removal_candidate(&tokens))
                else {
                    // Only the program name is left
                    let msg = err.to_string();
                    let first_line = msg.lines().next().unwrap_or_default();
                    warnings.push(ConfigWarning::Unparsable(first_line.to_string()));
                    break Args::default();
                };
                let removed = remove_option(&mut tokens, index);
                warnings.push(ConfigWarning::UnknownOption(removed));
            }
        }
    };

    let mut config = Configuration::default();

    if args.mono > 0 {
        config.mode = Mode::Mono;
    }

    for text in &args.transform_size {
        match parse_value("-s", text) {
            Ok(value) if !value.is_power_of_two() => {
                warnings.push(ConfigWarning::NotPowerOfTwo(value))
            }
            Ok(value) => config.transform_size = value as u32,
            Err(warning) => warnings.push(warning),
        }
    }

    for text in &args.sample_rate {
        match parse_value("-r", text) {
            Ok(0) => warnings.push(ConfigWarning::ZeroSampleRate),
            Ok(value) => config.sample_rate = value as u32,
            Err(warning) => warnings.push(warning),
        }
    }

    let source = match (args.wav, args.sine) {
        (Some(path), _) => SourceSelection::Wav(path),
        (None, Some(text)) => match text.parse::<f64>() {
            Ok(hz) if hz.is_finite() && hz > 0.0 => SourceSelection::Sine(hz),
            Ok(hz) => {
                warnings.push(ConfigWarning::InvalidFrequency(hz));
                SourceSelection::Device
            }
            Err(_) => {
                warnings.push(ConfigWarning::NotANumber {
                    option: "--sine",
                    text,
                });
                SourceSelection::Device
            }
        },
        (None, None) => SourceSelection::Device,
    };

    for warning in &warnings {
        warn!("{}", warning);
    }

    Ok(Resolution {
        config,
        source,
        shader: args.shader,
        warnings,
    })
}

/// Keep the program name and every recognised token, warning about the rest.
///
/// `-s` and `-r` need their value attached; a bare `-s` is unknown.
fn screen_tokens(
    argv: impl Iterator<Item = OsString>,
    warnings: &mut Vec<ConfigWarning>,
) -> Vec<OsString> {
    let mut argv = argv.peekable();
    let mut kept: Vec<OsString> = argv.next().into_iter().collect();

    while let Some(token) = argv.next() {
        let text = token.to_string_lossy().into_owned();
        let attached_value = (text.starts_with("-s") || text.starts_with("-r")) && text.len() > 2;
        let long_with_equals = VALUE_OPTIONS.iter().any(|option| {
            text.strip_prefix(*option)
                .is_some_and(|rest| rest.starts_with('='))
        });

        if VALUE_OPTIONS.contains(&text.as_str()) {
            kept.push(token);
            kept.extend(argv.next_if(|next| is_option_value(&next.to_string_lossy())));
        } else if FLAG_OPTIONS.contains(&text.as_str()) || attached_value || long_with_equals {
            kept.push(token);
        } else {
            warnings.push(ConfigWarning::UnknownOption(text));
        }
    }

    kept
}

/// A token that can be the separate value of a long option (negative numbers
/// included, other dash tokens are options of their own)
fn is_option_value(text: &str) -> bool {
    !text.starts_with('-') || text.parse::<f64>().is_ok()
}

/// Parse an unsigned base-10 option value no larger than [`VALUE_LIMIT`]
fn parse_value(option: &'static str, text: &str) -> Result<u64, ConfigWarning> {
    match text.parse::<u64>() {
        Ok(value) if value > VALUE_LIMIT => Err(ConfigWarning::TooLarge {
            option,
            value: text.to_string(),
        }),
        Ok(value) => Ok(value),
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => Err(ConfigWarning::TooLarge {
            option,
            value: text.to_string(),
        }),
        Err(_) => Err(ConfigWarning::NotANumber {
            option,
            text: text.to_string(),
        }),
    }
}

/// Index of the argv token clap complained about, never the program name.
///
/// Matches the flag exactly (or as `--flag=value`), taking the last
/// occurrence since clap reports the latest use.
fn offending_token(tokens: &[OsString], err: &clap::Error) -> Option<usize> {
    let invalid = match err.get(ContextKind::InvalidArg)? {
        ContextValue::String(invalid) => invalid.as_str(),
        _ => return None,
    };
    // "--sine <HZ>" / "--foo=bar" -> the flag itself
    let flag = invalid.split([' ', '=']).next().unwrap_or(invalid);
    if flag.is_empty() {
        return None;
    }

    tokens
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, token)| {
            let token = token.to_string_lossy();
            token == flag
                || token
                    .strip_prefix(flag)
                    .is_some_and(|rest| flag.starts_with("--") && rest.starts_with('='))
        })
        .map(|(index, _)| index)
        .last()
}

/// Latest token whose removal lets the rest parse, else the last token
fn removal_candidate(tokens: &[OsString]) -> Option<usize> {
    if tokens.len() <= 1 {
        return None;
    }

    (1..tokens.len())
        .rev()
        .find(|&index| {
            let mut trial = tokens.to_vec();
            trial.remove(index);
            Args::try_parse_from(trial).is_ok()
        })
        .or(Some(tokens.len() - 1))
}

/// Remove the token at `index`, with its value when it is a separate token
fn remove_option(tokens: &mut Vec<OsString>, index: usize) -> String {
    let mut removed = tokens.remove(index).to_string_lossy().into_owned();
    if VALUE_OPTIONS.contains(&removed.as_str())
        && tokens
            .get(index)
            .is_some_and(|next| is_option_value(&next.to_string_lossy()))
    {
        removed.push(' ');
        removed.push_str(&tokens.remove(index).to_string_lossy());
    }
    removed
}
