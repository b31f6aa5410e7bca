//! Sense CLI - Command-line interface for Synheart Sense
//!
//! Commands:
//! - transform: Process a batch of signals into a snapshot (batch mode)
//! - run: Process streaming signals from stdin (streaming mode)
//! - validate: Validate signal payloads
//! - schema: Print sample input/output payloads

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use synheart_sense::pipeline::SenseProcessor;
use synheart_sense::types::Signal;
use synheart_sense::{Clock, SystemClock, SENSE_VERSION};

/// Stress below this and engagement below this suggest staying quiet.
///
/// The quiet predicate is host policy, not engine behavior; this binary
/// demonstrates one built from the exposed context scalars.
const QUIET_STRESS_MAX: f64 = 0.3;
const QUIET_ENGAGEMENT_MAX: f64 = 0.3;
/// Overwhelm above this always suggests staying quiet
const QUIET_OVERWHELM_MIN: f64 = 0.8;

/// Sense - On-device behavioral signal interpretation engine
#[derive(Parser)]
#[command(name = "sense")]
#[command(author = "Synheart AI Inc")]
#[command(version = SENSE_VERSION)]
#[command(about = "Interpret behavioral signals into context and impressions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a batch of signals into a snapshot (batch mode)
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Entity identifier the signals belong to
        #[arg(long, default_value = "default")]
        entity_id: String,

        /// Load engine state from file before processing
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save engine state to file after processing
        #[arg(long)]
        save_state: Option<PathBuf>,
    },

    /// Process streaming signals from stdin (streaming mode)
    Run {
        /// Entity identifier the signals belong to
        #[arg(long, default_value = "default")]
        entity_id: String,

        /// Load engine state from file on start
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save engine state to file on exit
        #[arg(long)]
        save_state: Option<PathBuf>,

        /// Emit a snapshot after every signal instead of interpretations only
        #[arg(long)]
        snapshots: bool,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Validate signal payloads
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print sample payloads
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one signal per line)
    Ndjson,
    /// JSON array of signals
    Json,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (signal payloads)
    Input,
    /// Output schema (state snapshot)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Transform {
            input,
            output,
            input_format,
            entity_id,
            load_state,
            save_state,
        } => cmd_transform(input, output, input_format, entity_id, load_state, save_state),
        Commands::Run {
            entity_id,
            load_state,
            save_state,
            snapshots,
            flush,
        } => cmd_run(entity_id, load_state, save_state, snapshots, flush),
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(input, input_format, json),
        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn read_input(path: &PathBuf) -> Result<String, String> {
    if path.to_str() == Some("-") {
        let mut content = String::new();
        io::Read::read_to_string(&mut io::stdin(), &mut content)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        Ok(content)
    } else {
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
    }
}

fn write_output(path: &PathBuf, content: &str) -> Result<(), String> {
    if path.to_str() == Some("-") {
        let mut stdout = io::stdout();
        stdout
            .write_all(content.as_bytes())
            .and_then(|()| stdout.write_all(b"\n"))
            .map_err(|e| format!("failed to write stdout: {e}"))
    } else {
        fs::write(path, content).map_err(|e| format!("failed to write {}: {e}", path.display()))
    }
}

fn parse_signals(content: &str, format: &InputFormat) -> Result<Vec<Signal>, String> {
    match format {
        InputFormat::Json => {
            serde_json::from_str(content).map_err(|e| format!("invalid signal array: {e}"))
        }
        InputFormat::Ndjson => content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| format!("invalid signal on line {}: {e}", i + 1))
            })
            .collect(),
    }
}

fn load_processor(entity_id: String, state_path: Option<&PathBuf>) -> Result<SenseProcessor, String> {
    let mut processor = SenseProcessor::new(entity_id);
    if let Some(path) = state_path {
        let json =
            fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        processor
            .load_state(&json)
            .map_err(|e| format!("failed to load state: {e}"))?;
    }
    Ok(processor)
}

fn persist_state(processor: &SenseProcessor, state_path: Option<&PathBuf>) -> Result<(), String> {
    if let Some(path) = state_path {
        let json = processor
            .save_state()
            .map_err(|e| format!("failed to save state: {e}"))?;
        fs::write(path, json).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    }
    Ok(())
}

fn cmd_transform(
    input: PathBuf,
    output: PathBuf,
    input_format: InputFormat,
    entity_id: String,
    load_state: Option<PathBuf>,
    save_state: Option<PathBuf>,
) -> Result<(), String> {
    let content = read_input(&input)?;
    let signals = parse_signals(&content, &input_format)?;

    let mut processor = load_processor(entity_id, load_state.as_ref())?;
    for signal in &signals {
        processor.process(signal);
    }

    let snapshot = processor
        .snapshot_json()
        .map_err(|e| format!("failed to encode snapshot: {e}"))?;
    write_output(&output, &snapshot)?;

    persist_state(&processor, save_state.as_ref())
}

fn cmd_run(
    entity_id: String,
    load_state: Option<PathBuf>,
    save_state: Option<PathBuf>,
    snapshots: bool,
    flush: bool,
) -> Result<(), String> {
    if atty::is(atty::Stream::Stdin) {
        eprintln!("reading signals from stdin (one JSON object per line); ctrl-d to finish");
    }

    let mut processor = load_processor(entity_id, load_state.as_ref())?;
    let clock = SystemClock;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.map_err(|e| format!("failed to read stdin: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let record = match processor.process_json(&line) {
            Ok(interpretations) => {
                if snapshots {
                    serde_json::to_value(processor.snapshot())
                } else {
                    let context = processor.context();
                    serde_json::to_value(serde_json::json!({
                        "interpretations": interpretations,
                        "context": context,
                        "quiet_hint": quiet_hint(
                            context.stress,
                            context.engagement,
                            context.overwhelm,
                        ),
                    }))
                }
            }
            Err(e) => serde_json::to_value(serde_json::json!({ "error": e.to_string() })),
        }
        .map_err(|e| format!("failed to encode record: {e}"))?;

        writeln!(stdout, "{record}").map_err(|e| format!("failed to write stdout: {e}"))?;
        if flush {
            stdout.flush().map_err(|e| format!("failed to flush: {e}"))?;
        }
    }

    // Final decay pass on wall-clock time before the state is persisted.
    processor.apply_decay(clock.now());
    persist_state(&processor, save_state.as_ref())
}

/// Example quiet-mode policy built from the exposed context scalars
fn quiet_hint(stress: f64, engagement: f64, overwhelm: f64) -> bool {
    (stress < QUIET_STRESS_MAX && engagement < QUIET_ENGAGEMENT_MAX)
        || overwhelm > QUIET_OVERWHELM_MIN
}

fn cmd_validate(input: PathBuf, input_format: InputFormat, json: bool) -> Result<(), String> {
    let content = read_input(&input)?;

    let (mut parsed, mut malformed, mut invalid) = (0u32, 0u32, 0u32);
    let mut errors: Vec<String> = Vec::new();

    let candidates: Vec<Result<Signal, String>> = match input_format {
        InputFormat::Json => match serde_json::from_str::<Vec<Signal>>(&content) {
            Ok(signals) => signals.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(format!("invalid signal array: {e}"))],
        },
        InputFormat::Ndjson => content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str::<Signal>(line)
                    .map_err(|e| format!("line {}: {e}", i + 1))
            })
            .collect(),
    };

    for candidate in candidates {
        match candidate {
            Ok(signal) => {
                parsed += 1;
                if !signal.is_valid() {
                    invalid += 1;
                    errors.push(format!("malformed payload: {:?}", signal.kind));
                }
            }
            Err(e) => {
                malformed += 1;
                errors.push(e);
            }
        }
    }

    if json {
        let report = serde_json::json!({
            "parsed": parsed,
            "unparseable": malformed,
            "invalid_payloads": invalid,
            "errors": errors,
        });
        println!("{report:#}");
    } else {
        println!("parsed:           {parsed}");
        println!("unparseable:      {malformed}");
        println!("invalid payloads: {invalid}");
        for error in &errors {
            println!("  - {error}");
        }
    }

    if malformed > 0 {
        return Err("input contains unparseable records".to_string());
    }
    Ok(())
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), String> {
    match schema_type {
        SchemaType::Input => {
            let samples = r#"[
  {"timestamp": "2024-01-15T14:00:00Z", "signal_type": "dwell", "duration_sec": 3.0, "target_id": "article-42"},
  {"timestamp": "2024-01-15T14:00:05Z", "signal_type": "velocity", "velocity": 2500.0},
  {"timestamp": "2024-01-15T14:00:08Z", "signal_type": "hesitation", "duration_sec": 2.0},
  {"timestamp": "2024-01-15T14:00:20Z", "signal_type": "typed_input", "keystroke_count": 40, "correction_count": 14, "duration_sec": 60.0},
  {"timestamp": "2024-01-15T14:00:30Z", "signal_type": "physiological", "rate": 72.0, "variability": 55.0},
  {"timestamp": "2024-01-15T14:00:40Z", "signal_type": "context_switch", "from_id": "app-a", "to_id": "app-b"},
  {"timestamp": "2024-01-15T14:00:45Z", "signal_type": "tap_pattern", "count": 5, "interval_sec": 0.2},
  {"timestamp": "2024-01-15T14:00:50Z", "signal_type": "motion", "is_moving": true, "speed": 1.4},
  {"timestamp": "2024-01-15T14:00:55Z", "signal_type": "proximity", "count": 1, "is_known": true}
]"#;
            println!("{samples}");
        }
        SchemaType::Output => {
            let processor = SenseProcessor::new("sample-entity");
            let snapshot = processor
                .snapshot_json()
                .map_err(|e| format!("failed to encode snapshot: {e}"))?;
            println!("{snapshot}");
        }
    }
    Ok(())
}
