//! syntaxdrill CLI: render, grade and validate drill exercises.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "syntaxdrill", version, about = "Procedural Python syntax drills")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an exercise for a learner
    Render {
        /// Path to .toml exercise set or directory
        #[arg(long)]
        exercises: PathBuf,

        /// Exercise slug
        #[arg(long)]
        slug: String,

        /// Learner id the exercise is generated for
        #[arg(long)]
        user: String,

        /// Calendar day (YYYY-MM-DD, default: today in UTC)
        #[arg(long)]
        date: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Grade an answer to an exercise
    Grade {
        /// Path to .toml exercise set or directory
        #[arg(long)]
        exercises: PathBuf,

        /// Exercise slug
        #[arg(long)]
        slug: String,

        /// Learner id the exercise was generated for
        #[arg(long)]
        user: String,

        /// The learner's answer
        #[arg(long)]
        answer: String,

        /// Calendar day the exercise was rendered on (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Time the learner took, in milliseconds
        #[arg(long, default_value = "0")]
        response_time_ms: u64,

        /// Whether the learner looked at a hint
        #[arg(long)]
        hint_used: bool,

        /// Self-reported recall quality (0-5)
        #[arg(long, default_value = "0")]
        quality: u8,
    },

    /// Validate exercise set TOML files
    Validate {
        /// Path to exercise set file or directory
        #[arg(long)]
        exercises: PathBuf,

        /// Also self-check every generator over this many seeds
        #[arg(long)]
        samples: Option<usize>,
    },

    /// List built-in generators
    Generators {
        /// Seeds to sample per generator
        #[arg(long, default_value = "50")]
        samples: usize,
    },

    /// Create starter config and example exercise set
    Init,
}

#[tokio::main]
async fn main() {
    let directive: tracing_subscriber::filter::Directive = match "syntaxdrill=info".parse() {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("Error: invalid log directive: {e}");
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            exercises,
            slug,
            user,
            date,
            format,
        } => commands::render::execute(exercises, slug, user, date, format),
        Commands::Grade {
            exercises,
            slug,
            user,
            answer,
            date,
            config,
            response_time_ms,
            hint_used,
            quality,
        } => {
            commands::grade::execute(commands::grade::GradeArgs {
                exercises,
                slug,
                user,
                answer,
                date,
                config,
                response_time_ms,
                hint_used,
                quality,
            })
            .await
        }
        Commands::Validate { exercises, samples } => {
            commands::validate::execute(exercises, samples)
        }
        Commands::Generators { samples } => commands::generators::execute(samples),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
