//! atelier CLI: the classroom command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "atelier",
    version,
    about = "Classroom workshop tracker: photograph and grade student work"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List workshops with dashboard totals
    Workshops {
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List the students of a workshop
    Students {
        /// Workshop id
        #[arg(long)]
        workshop: String,

        /// Only show students whose name contains this text
        #[arg(long)]
        search: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Photograph a student's work and record a grade
    Evaluate {
        /// Workshop id
        #[arg(long)]
        workshop: String,

        /// Student id
        #[arg(long)]
        student: String,

        /// Grade: green, orange, red
        #[arg(long)]
        grade: String,

        /// Image file to use as the camera feed
        #[arg(long)]
        frame: Option<PathBuf>,

        /// Directory to export the photo and record into
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("atelier=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Workshops { format } => commands::workshops::execute(format),
        Commands::Students {
            workshop,
            search,
            format,
        } => commands::students::execute(workshop, search, format),
        Commands::Evaluate {
            workshop,
            student,
            grade,
            frame,
            output,
            config,
        } => commands::evaluate::execute(workshop, student, grade, frame, output, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
