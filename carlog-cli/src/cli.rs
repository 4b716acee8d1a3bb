use carlog::SortDirective;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "carlog")]
#[command(about = "차량 경비 장부: track toll and fuel costs per trip")]
pub struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a trip
    Add {
        origin: String,
        destination: String,
        /// Toll fee in won; looked up from the toll schedule when omitted
        #[arg(long)]
        toll: Option<String>,
        /// Fuel cost in won
        #[arg(long, default_value = "0")]
        fuel: String,
    },
    /// Show one page of trips
    List {
        #[arg(long, short)]
        search: Option<String>,
        /// date-desc, date-asc, cost-desc, cost-asc or none
        #[arg(long, default_value = "none")]
        sort: SortDirective,
        #[arg(long, short, default_value_t = 1)]
        page: usize,
    },
    /// Print the running total
    Total,
    /// Delete a trip by id
    Remove { id: u64 },
    /// Delete every trip
    Reset,
    /// Write all trips to a CSV file
    Export { path: PathBuf },
    /// Append trips from a CSV file
    Import { path: PathBuf },
    /// Interactive session
    Shell,
    /// Print config path and create default file if missing
    ConfigPath,
}
