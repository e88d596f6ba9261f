use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "interview-prep-api")]
#[command(about = "Turn a job posting and a resume into an interview-prep report", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Run one analysis and print the report as JSON
    Analyze {
        /// URL of the job posting
        #[arg(long, value_name = "URL")]
        job_url: String,

        /// Resume PDF: a local path or an http(s) URL
        #[arg(long, value_name = "PATH_OR_URL")]
        resume: String,

        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}
