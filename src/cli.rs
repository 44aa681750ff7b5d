//! Command-line surface.
//!
//! This module handles:
//! - clap argument parsing with environment-variable fallbacks
//! - Dispatch to the agent facade
//! - The interactive question loop
//!
//! Commands print a styled status line per outcome and return a non-zero
//! exit code on unrecoverable failure; interactive mode prints errors and
//! keeps the loop running.

use crate::agent::Agent;
use crate::settings::{default_cache_dir, default_data_dir, Settings};
use crate::settings::{DEFAULT_MODEL, DEFAULT_STORE_DISPLAY_NAME};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const RULE: &str =
    "======================================================================";
const THIN_RULE: &str =
    "----------------------------------------------------------------------";

/// CLI arguments for askpdf
#[derive(Parser, Debug)]
#[command(
    name = "askpdf",
    version,
    about = "Upload PDF documents to a hosted file-search store and ask questions about them"
)]
pub struct Cli {
    /// API key for the hosted service
    #[arg(long, value_name = "KEY", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,
    /// Directory for application data
    #[arg(long, value_name = "DIR", env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    /// Directory for the upload-tracking cache
    #[arg(long, value_name = "DIR", env = "CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE", env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,
    /// Display name of the remote file-search store
    #[arg(
        long,
        value_name = "NAME",
        env = "FILE_SEARCH_STORE_NAME",
        default_value = DEFAULT_STORE_DISPLAY_NAME
    )]
    pub store_name: String,
    /// Model identifier for generation calls
    #[arg(long, value_name = "MODEL", env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a PDF file
    Upload {
        /// Path to the PDF file
        pdf_path: PathBuf,
    },
    /// Upload all PDF files from a directory (non-recursive)
    UploadDir {
        /// Directory containing PDFs
        directory: PathBuf,
    },
    /// List all uploaded files
    ListFiles,
    /// Ask a question about the uploaded documents
    Ask {
        question: String,
        /// Disable retry logic
        #[arg(long)]
        no_retry: bool,
    },
    /// Enter interactive Q&A mode
    Interactive,
    /// Clear the file tracking cache
    ClearCache {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    pub fn into_settings(self) -> (Settings, Commands) {
        let settings = Settings {
            api_key: self.api_key,
            data_dir: self.data_dir.unwrap_or_else(default_data_dir),
            cache_dir: self.cache_dir.unwrap_or_else(default_cache_dir),
            log_level: self.log_level,
            log_file: self.log_file,
            store_display_name: self.store_name,
            model: self.model,
        };
        (settings, self.command)
    }
}

/// Parse arguments, set up logging, run the selected command. Returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let (settings, command) = cli.into_settings();
    init_logger(&settings);

    let mut agent = match Agent::new(&settings).await {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match command {
        Commands::Upload { pdf_path } => cmd_upload(&mut agent, &pdf_path).await,
        Commands::UploadDir { directory } => cmd_upload_dir(&mut agent, &directory).await,
        Commands::ListFiles => cmd_list_files(&agent),
        Commands::Ask { question, no_retry } => cmd_ask(&agent, &question, !no_retry).await,
        Commands::Interactive => cmd_interactive(&agent).await,
        Commands::ClearCache { yes } => cmd_clear_cache(&mut agent, yes),
    }
}

fn init_logger(settings: &Settings) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&settings.log_level),
    );
    builder.format_timestamp_secs();
    if let Some(path) = &settings.log_file {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Warning: cannot open log file {}: {}", path.display(), e),
        }
    }
    let _ = builder.try_init();
}

async fn cmd_upload<B: crate::remote::FileSearchBackend>(
    agent: &mut Agent<B>,
    pdf_path: &Path,
) -> i32 {
    println!("Uploading {}...", pdf_path.display());
    match agent.upload_file(pdf_path).await {
        Some(result) => {
            println!("✓ File uploaded successfully!");
            println!("  Name: {}", result.name);
            println!("  URI: {}", result.uri);
            0
        }
        None => {
            eprintln!("✗ Failed to upload file");
            1
        }
    }
}

async fn cmd_upload_dir<B: crate::remote::FileSearchBackend>(
    agent: &mut Agent<B>,
    directory: &Path,
) -> i32 {
    println!("Uploading PDFs from {}...", directory.display());
    let results = agent.upload_directory(directory).await;
    if results.is_empty() {
        eprintln!("✗ No files were uploaded");
        return 1;
    }
    println!("✓ Successfully uploaded {} file(s)", results.len());
    for result in &results {
        println!("  - {}", result.name);
    }
    0
}

fn cmd_list_files<B: crate::remote::FileSearchBackend>(agent: &Agent<B>) -> i32 {
    let files = agent.list_files();
    if files.is_empty() {
        println!("No files uploaded yet.");
        return 0;
    }
    println!("Found {} uploaded file(s):\n", files.len());
    for (i, file) in files.iter().enumerate() {
        let short = Path::new(&file.original_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.original_path.clone());
        println!("{}. {}", i + 1, short);
        println!("   Uploaded: {}", file.upload_date);
        println!("   URI: {}", file.uri);
        if i + 1 < files.len() {
            println!();
        }
    }
    0
}

async fn cmd_ask<B: crate::remote::FileSearchBackend>(
    agent: &Agent<B>,
    question: &str,
    use_retry: bool,
) -> i32 {
    if agent.get_file_count() == 0 {
        println!("Warning: No files uploaded. Answer may not be based on your documents.\n");
    }
    println!("Thinking...");
    match agent.ask_question(question, use_retry).await {
        Ok(answer) => {
            println!("\n{}", RULE);
            println!("Answer:");
            println!("{}", RULE);
            println!("{}", answer);
            println!("{}", RULE);
            0
        }
        Err(message) => {
            eprintln!("\n✗ Error: {}", message);
            1
        }
    }
}

async fn cmd_interactive<B: crate::remote::FileSearchBackend>(agent: &Agent<B>) -> i32 {
    println!("askpdf - Interactive Mode");
    println!("{}", RULE);

    let file_count = agent.get_file_count();
    if file_count == 0 {
        println!("Warning: No files uploaded. Answers may not be based on your documents.");
        println!("Use 'upload' or 'upload-dir' commands to add PDF documents.");
    } else {
        println!("Loaded {} document(s) for context.", file_count);
    }
    println!("\nType your questions (or 'quit'/'exit' to exit):\n");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Question: ");
        let _ = std::io::stdout().flush();

        let question = match lines.next() {
            Some(Ok(line)) => line.trim().to_string(),
            // End of input or a read error both end the session.
            _ => {
                println!("\nGoodbye!");
                break;
            }
        };
        if question.is_empty() || matches!(question.to_lowercase().as_str(), "quit" | "exit" | "q")
        {
            println!("Goodbye!");
            break;
        }

        println!("\nThinking...");
        match agent.ask_question(&question, true).await {
            Ok(answer) => {
                println!("\n{}", THIN_RULE);
                println!("Answer:");
                println!("{}", THIN_RULE);
                println!("{}", answer);
                println!("{}\n", THIN_RULE);
            }
            // Errors end the question, not the session.
            Err(message) => println!("\nError: {}\n", message),
        }
    }
    0
}

fn cmd_clear_cache<B: crate::remote::FileSearchBackend>(agent: &mut Agent<B>, yes: bool) -> i32 {
    if !yes {
        print!("Are you sure you want to clear the file tracking cache? [y/N] ");
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            eprintln!("Aborted.");
            return 1;
        }
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return 0;
        }
    }

    if agent.clear_cache() {
        println!("✓ Cache cleared successfully");
        0
    } else {
        eprintln!("✗ Failed to clear cache");
        1
    }
}
