//! Command-line front end: descriptor in, tool run out.

use crate::settings::Settings;
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use ctd_sdk::{
    AsyncToolExecutor, CommandGenerator, ConfigFileCommandGenerator, ConfigFileFormat,
    DescriptorReader, NodeConfiguration, ProcessExecutor, SwitchCommandGenerator, ToolExecutor,
    write_descriptor,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

/// Exit code reported when the tool was killed.
const KILLED_EXIT_CODE: u8 = 130;

/// Runs a tool described by a Common Tool Descriptor.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Path to the CTD document.
    descriptor: PathBuf,

    /// Sets a parameter, e.g. `--param blast.evalue=1e-5`. Repeatable.
    #[arg(short, long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// Appends one element to a list parameter, e.g. `--append blast.db=nr`.
    #[arg(long = "append", value_parser = parse_key_value)]
    appends: Vec<(String, String)>,

    /// Pass the parameters through a configuration file behind this switch
    /// (e.g. `-ini`) instead of as individual switches.
    #[arg(long, allow_hyphen_values = true)]
    config_switch: Option<String>,

    /// Layout of the configuration file.
    #[arg(long, value_enum, default_value_t = FileFormat::Params)]
    config_format: FileFormat,

    /// Executable to launch; resolved from the descriptor when absent.
    #[arg(long)]
    executable: Option<String>,

    /// Working directory of the tool.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Installation root substituted for `$ROOT`.
    #[arg(long)]
    tool_root: Option<PathBuf>,

    /// Runner settings file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the descriptor with the applied values to this path.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print the command line instead of running it.
    #[arg(long)]
    dry_run: bool,
}

/// Configuration file layouts selectable on the command line.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum FileFormat {
    Params,
    Json,
}

impl From<FileFormat> for ConfigFileFormat {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Params => Self::Params,
            FileFormat::Json => Self::Json,
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

/// Runs the command.
pub fn run(args: &Args) -> Result<ExitCode> {
    let mut settings = Settings::load(args.settings.as_deref()).context("loading settings")?;
    if args.work_dir.is_some() {
        settings.work_dir.clone_from(&args.work_dir);
    }
    if args.tool_root.is_some() {
        settings.tool_root.clone_from(&args.tool_root);
    }

    let mut config = DescriptorReader::read_file(&args.descriptor)
        .with_context(|| format!("reading descriptor {}", args.descriptor.display()))?;
    apply_values(&mut config, args)?;

    if let Some(path) = &args.save {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_descriptor(&config, BufWriter::new(file))
            .with_context(|| format!("writing descriptor {}", path.display()))?;
        info!(path = %path.display(), "Saved descriptor");
    }

    let registry = settings.registry();
    let executor_config =
        registry.executor_config(&config, &settings.executor_config().context("invalid settings")?);

    let tokens = match &args.config_switch {
        Some(switch) => ConfigFileCommandGenerator::new(
            switch,
            &executor_config.work_dir,
            &executor_config.config_file_name,
        )
        .with_format(args.config_format.into())
        .generate_command(&config)?,
        None => SwitchCommandGenerator.generate_command(&config)?,
    };

    let Some(executable) = args.executable.clone().or_else(|| registry.resolve(&config)) else {
        bail!("descriptor of '{}' names no executable", config.name);
    };

    if args.dry_run {
        println!("{executable} {}", tokens.join(" "));
        return Ok(ExitCode::SUCCESS);
    }

    let run = Arc::new(AsyncToolExecutor::new(ProcessExecutor::new(
        &executable,
        tokens,
        &executor_config,
    )));
    {
        let run = Arc::clone(&run);
        ctrlc::set_handler(move || run.kill()).context("installing Ctrl-C handler")?;
    }

    run.invoke()?;
    run.wait_until_finished();

    let executor = run.executor();
    for line in executor.tool_output() {
        println!("{line}");
    }
    for line in executor.tool_error_output() {
        eprintln!("{line}");
    }

    if let Some(failure) = run.failure() {
        bail!("running {executable}: {failure}");
    }
    if run.is_killed() {
        warn!(tool = %config.name, "Tool run killed");
        return Ok(ExitCode::from(KILLED_EXIT_CODE));
    }

    let code = run.exit_code().unwrap_or(-1);
    info!(tool = %config.name, exit_code = code, "Tool run finished");
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

fn apply_values(config: &mut NodeConfiguration, args: &Args) -> Result<()> {
    for (key, value) in &args.params {
        config
            .set_value_from_string(key, value)
            .with_context(|| format!("setting {key}"))?;
    }
    for (key, value) in &args.appends {
        config
            .set_multi_value(key, value)
            .with_context(|| format!("appending to {key}"))?;
    }
    Ok(())
}
