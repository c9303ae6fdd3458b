//! Lenient handling of the command line.
//!
//! Bad flags never abort a run: unrecognized ones are dropped before the command line reaches
//! argh, and malformed values fall back to their defaults. Both are reported as warnings.

use std::str::FromStr;

use g1_vm::memory::Keys;
use tracing::warn;

/// Flags that take no value.
const SWITCHES: &[&str] = &[
    "--show-fps",
    "-f",
    "--disable-log",
    "-d",
    "--unchecked",
    "--realtime",
    "--help",
];

/// Flags followed by a value.
const OPTIONS: &[&str] = &[
    "--scale", "-s", "--title", "-t", "--ticks", "--keys", "--output", "-o",
];

/// Older spellings of some flags, and their current form.
const ALIASES: &[(&str, &str)] = &[
    ("--show_fps", "--show-fps"),
    ("-fps", "--show-fps"),
    ("--disable_log", "--disable-log"),
    ("-dl", "--disable-log"),
];

/// Rewrites aliased flags and removes unrecognized ones from `args`.
///
/// Positional arguments, and everything after `--`, are kept as is.
pub fn sanitize<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--" {
            out.push(arg);
            out.extend(args);
            break;
        }
        if !arg.starts_with('-') || arg == "-" {
            out.push(arg);
            continue;
        }

        let arg = match ALIASES.iter().find(|(alias, _)| *alias == arg) {
            Some((_, canonical)) => (*canonical).to_owned(),
            None => arg,
        };

        if SWITCHES.contains(&arg.as_str()) {
            out.push(arg);
        } else if OPTIONS.contains(&arg.as_str()) {
            match args.next() {
                Some(value) => {
                    out.push(arg);
                    out.push(value);
                }
                None => warn!(flag = %arg, "ignoring flag without a value"),
            }
        } else {
            warn!(flag = %arg, "ignoring unrecognized flag");
        }
    }

    out
}

/// Parses the value of `flag`, warning and returning `None` if it is malformed.
pub fn parse_value<T: FromStr>(flag: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(flag, value, "ignoring malformed value");
            None
        }
    }
}

/// Parses a comma-separated list of key names, ignoring unknown ones.
pub fn parse_keys(list: &str) -> Keys {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .fold(Keys::empty(), |keys, name| match Keys::from_key_name(name) {
            Some(key) => keys | key,
            None => {
                warn!(key = name, "ignoring unknown key");
                keys
            }
        })
}
