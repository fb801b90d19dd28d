use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vitals_core::metrics;
use vitals_core::*;

#[derive(Parser)]
#[command(name = "vitals")]
#[command(about = "Personal vital-signs journal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one set of vital signs
    Record {
        /// Systolic blood pressure (mmHg)
        #[arg(long)]
        systolic: i32,

        /// Diastolic blood pressure (mmHg)
        #[arg(long)]
        diastolic: i32,

        /// Heart rate (bpm)
        #[arg(long)]
        heart_rate: i32,

        /// Oxygen saturation (%)
        #[arg(long)]
        oxygen_sat: i32,

        /// Body weight
        #[arg(long)]
        weight: f64,

        /// Body temperature
        #[arg(long)]
        temperature: f64,

        /// Blood sugar
        #[arg(long)]
        blood_sugar: i32,

        /// When the blood sugar was taken (fasting, before-meal, post-meal, random, bedtime)
        #[arg(long, default_value = "fasting")]
        sugar_type: String,

        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Show today's metrics and recent readings (default)
    Summary,

    /// Export the journal to CSV
    Export {
        /// Destination CSV file
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    vitals_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = FileStore::new(&data_dir);

    match cli.command {
        Some(Commands::Record {
            systolic,
            diastolic,
            heart_rate,
            oxygen_sat,
            weight,
            temperature,
            blood_sugar,
            sugar_type,
            notes,
        }) => cmd_record(
            store,
            ReadingFields {
                systolic,
                diastolic,
                heart_rate,
                oxygen_saturation: oxygen_sat,
                weight,
                temperature,
                blood_sugar,
                blood_sugar_context: BloodSugarContext::from(sugar_type),
                notes,
            },
        ),
        Some(Commands::Export { output }) => cmd_export(store, output),
        Some(Commands::Summary) | None => cmd_summary(store, &config),
    }
}

fn cmd_record(store: FileStore, fields: ReadingFields) -> Result<()> {
    tracing::debug!("Recording reading into {:?}", store.dir());
    let mut engine = Engine::load(store)?;
    warn_on_data_loss(engine.load_status());

    let snapshot = engine.record_entry(fields, &Local::now())?;

    println!("\n✓ Vitals saved successfully!");
    display_snapshot(&snapshot);
    Ok(())
}

fn cmd_summary(store: FileStore, config: &Config) -> Result<()> {
    let now = Local::now();
    tracing::debug!("Summarizing journal in {:?}", store.dir());
    let (engine, snapshot) = load_journal(store, &now)?;
    warn_on_data_loss(engine.load_status());

    display_snapshot(&snapshot);

    let today = metrics::today_entries(engine.journal(), &now);
    println!("  Today's readings:");
    if today.is_empty() {
        println!("    (none)");
    }
    for reading in today {
        println!("    {}", format_reading(reading));
    }
    println!();

    tracing::info!(
        "Journal has {} readings, listing up to {} recent",
        engine.journal().len(),
        config.display.recent_limit
    );
    let recent = metrics::recent_entries(engine.journal(), config.display.recent_limit);
    if !recent.is_empty() {
        println!("  Recent entries:");
        for reading in recent {
            println!(
                "    {}  {}",
                local_time(&reading.timestamp).format("%Y-%m-%d"),
                format_reading(reading)
            );
        }
        println!(
            "  Longest streak: {} day(s)",
            metrics::longest_streak(engine.journal(), &Local)
        );
        println!();
    }

    Ok(())
}

fn cmd_export(store: FileStore, output: PathBuf) -> Result<()> {
    tracing::debug!("Exporting journal in {:?} to {:?}", store.dir(), output);
    let engine = Engine::load(store)?;
    warn_on_data_loss(engine.load_status());

    let count = write_csv(engine.journal(), &output)?;

    println!("✓ Exported {} readings", count);
    println!("  CSV: {}", output.display());
    Ok(())
}

fn warn_on_data_loss(status: &LoadStatus) {
    if let Some(lines) = data_loss_warning(status) {
        for line in lines {
            eprintln!("{}", line);
        }
    }
}

fn data_loss_warning(status: &LoadStatus) -> Option<Vec<String>> {
    let LoadStatus::Recovered { reason, preserved } = status else {
        return None;
    };

    let backup = if *preserved {
        format!(
            "the unreadable data was kept as {}.json",
            vitals_core::journal::CORRUPT_KEY
        )
    } else {
        "the unreadable data could NOT be backed up and will be overwritten".to_string()
    };

    Some(vec![
        format!("⚠ Stored journal could not be read ({}).", reason),
        format!("  Starting with an empty journal; {}", backup),
    ])
}

fn local_time(timestamp: &DateTime<Utc>) -> DateTime<Local> {
    timestamp.with_timezone(&Local)
}

fn display_snapshot(snapshot: &MetricsSnapshot) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  VITALS JOURNAL");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Entries today: {}", snapshot.today_count);
    println!("  Streak: {} day(s)", snapshot.streak);
    println!("  Health score: {}%", snapshot.health_score);

    match snapshot.last_entry_time {
        Some(ref at) => println!("  Last entry: {}", local_time(at).format("%H:%M:%S")),
        None => println!("  No entries today"),
    }
    println!();
}

fn format_reading(reading: &Reading) -> String {
    let mut line = format!(
        "{}  BP {}/{}  HR {}  SpO2 {}%  Wt {}  Temp {}  Sugar {} ({})",
        local_time(&reading.timestamp).format("%H:%M"),
        reading.systolic,
        reading.diastolic,
        reading.heart_rate,
        reading.oxygen_saturation,
        reading.weight,
        reading.temperature,
        reading.blood_sugar,
        reading.blood_sugar_context
    );
    if !reading.notes.is_empty() {
        line.push_str("  - ");
        line.push_str(&reading.notes);
    }
    line
}
