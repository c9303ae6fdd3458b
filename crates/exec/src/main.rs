//! Runs g1 programs without a window.
//!
//! The program is loaded, its start routine run once, then its tick routine a fixed number of
//! times with the same keys held. The final frame can be exported as a PPM image.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use argh::FromArgs;
use g1_vm::error::{Error, LoadError};
use g1_vm::loader::{self, Format};
use g1_vm::memory::{InputSnapshot, Keys};
use g1_vm::program::Meta;
use g1_vm::trace::StdoutTrace;
use g1_vm::{Config, Session};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod flags;
mod ppm;

/// The number of ticks between two frame rate reports.
const FPS_WINDOW: u64 = 10;

/// The largest accepted upscaling factor of the exported image.
const MAX_SCALE: u32 = 64;

/// Runs a g1 program headlessly.
#[derive(FromArgs, Debug)]
struct Arguments {
    /// the program to run, `.g1b` files are loaded as binary and
    /// anything else as JSON
    #[argh(positional)]
    program: PathBuf,

    /// report the measured tick rate every 10 ticks
    #[argh(switch, short = 'f')]
    show_fps: bool,

    /// the upscaling factor of the exported image
    #[argh(option, short = 's')]
    scale: Option<String>,

    /// the title of the session
    #[argh(option, short = 't')]
    title: Option<String>,

    /// do not print the values of `log` instructions
    #[argh(switch, short = 'd')]
    disable_log: bool,

    /// the number of ticks to run,
    /// one second worth of ticks if not specified
    #[argh(option)]
    ticks: Option<String>,

    /// comma-separated keys held during every tick,
    /// among `return`, `shift`, `z`, `x`, `up`, `down`, `left`, `right`
    #[argh(option)]
    keys: Option<String>,

    /// whether memory accesses should not be bounds-checked
    #[argh(switch)]
    unchecked: bool,

    /// whether ticks should be spaced out to match the tick rate of the program
    #[argh(switch)]
    realtime: bool,

    /// the file to write the final frame to, as a binary PPM image
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum ExecError {
    #[error("failed to read `{}`: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to load `{}`: {source}", .path.display())]
    Load { path: PathBuf, source: LoadError },

    #[error("{routine} routine failed: {source}")]
    Runtime { routine: &'static str, source: Error },

    #[error("failed to write `{}`: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl ExecError {
    fn exit_code(&self) -> u8 {
        match self {
            ExecError::Read { .. } | ExecError::Write { .. } => 1,
            ExecError::Load { .. } => 2,
            ExecError::Runtime { .. } => 3,
        }
    }
}

/// Driver settings resolved from the command line.
#[derive(Debug)]
struct Settings {
    title: String,
    config: Config,
    scale: usize,
    ticks: Option<u64>,
    keys: Keys,
}

impl Settings {
    fn new(args: &Arguments) -> Self {
        let scale = args
            .scale
            .as_deref()
            .and_then(|value| flags::parse_value::<NonZeroU32>("--scale", value))
            .filter(|scale| {
                let valid = scale.get() <= MAX_SCALE;
                if !valid {
                    warn!(scale = scale.get(), max = MAX_SCALE, "ignoring oversized scale");
                }
                valid
            })
            .map_or(1, |scale| scale.get() as usize);

        Self {
            title: args
                .title
                .clone()
                .unwrap_or_else(|| args.program.display().to_string()),
            config: Config {
                strict: !args.unchecked,
                log_enabled: !args.disable_log,
            },
            scale,
            ticks: args
                .ticks
                .as_deref()
                .and_then(|value| flags::parse_value("--ticks", value)),
            keys: args.keys.as_deref().map_or(Keys::empty(), flags::parse_keys),
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = match parse_arguments(std::env::args()) {
        Ok(args) => args,
        Err(code) => return code,
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn parse_arguments<I>(args: I) -> Result<Arguments, ExitCode>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let command = args.next().unwrap_or_else(|| "g1".to_owned());
    let rest = flags::sanitize(args);
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

    Arguments::from_args(&[command.as_str()], &rest).map_err(|exit| match exit.status {
        Ok(()) => {
            println!("{}", exit.output);
            ExitCode::SUCCESS
        }
        Err(()) => {
            eprintln!("{}", exit.output);
            ExitCode::FAILURE
        }
    })
}

fn run(args: &Arguments) -> Result<(), ExecError> {
    let settings = Settings::new(args);

    let bytes = fs::read(&args.program).map_err(|source| ExecError::Read {
        path: args.program.clone(),
        source,
    })?;
    let format = Format::from_path(&args.program);
    let (program, memory) = loader::load(&bytes, format).map_err(|source| ExecError::Load {
        path: args.program.clone(),
        source,
    })?;

    let meta = *program.meta();
    info!(
        title = %settings.title,
        ?format,
        instructions = program.instructions().len(),
        memory = meta.memory_size,
        width = meta.width,
        height = meta.height,
        tickrate = meta.tickrate,
        "program loaded"
    );

    let mut session = Session::new(program, memory, settings.config);
    let mut trace = StdoutTrace;

    session
        .start(settings.keys, &mut trace)
        .map_err(|source| ExecError::Runtime {
            routine: "start",
            source,
        })?;

    if session.has_tick() {
        let ticks = settings.ticks.unwrap_or_else(|| default_ticks(&meta));
        run_ticks(&mut session, args, &settings, ticks, &mut trace)?;
    } else {
        info!("program has no tick routine");
    }

    if let Some(path) = &args.output {
        export(path, &session, &settings)?;
        info!(path = %path.display(), scale = settings.scale, "frame written");
    }

    Ok(())
}

/// One second worth of ticks, and at least one.
fn default_ticks(meta: &Meta) -> u64 {
    u64::from(meta.tickrate.max(1))
}

fn run_ticks(
    session: &mut Session,
    args: &Arguments,
    settings: &Settings,
    ticks: u64,
    trace: &mut StdoutTrace,
) -> Result<(), ExecError> {
    let interval = session
        .program()
        .meta()
        .frame_interval_ms()
        .map(|ms| Duration::from_millis(u64::from(ms)));

    let mut last = Instant::now();
    let mut window = Instant::now();

    for tick in 1..=ticks {
        if let Some(interval) = interval.filter(|_| args.realtime) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }

        let now = Instant::now();
        let elapsed_ms = i32::try_from(now.duration_since(last).as_millis()).unwrap_or(i32::MAX);
        last = now;

        session
            .tick(&InputSnapshot::new(settings.keys, elapsed_ms), trace)
            .map_err(|source| ExecError::Runtime {
                routine: "tick",
                source,
            })?;

        if args.show_fps && tick % FPS_WINDOW == 0 {
            let fps = FPS_WINDOW as f64 / window.elapsed().as_secs_f64();
            info!(title = %settings.title, tick, fps, "frame rate");
            window = Instant::now();
        }
    }

    Ok(())
}

fn export(path: &Path, session: &Session, settings: &Settings) -> Result<(), ExecError> {
    let write = || -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        ppm::write_ppm(
            &mut out,
            session.surface(),
            settings.scale,
            Some(settings.title.as_str()),
        )?;
        out.flush()
    };

    write().map_err(|source| ExecError::Write {
        path: path.to_owned(),
        source,
    })
}
