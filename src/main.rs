//! customer-segmenter: add customers, segment them with K-Means, clear the
//! store.
//!
//! This is the command-line shell over the library's three entry points.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use customer_segmenter::{
    viz, Args, ClearOutcome, ClusteringResult, Command, CustomerSegmentation,
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let app = CustomerSegmentation::open(&args.store);

    match &args.command {
        Command::Add { .. } => {
            let raw = args
                .command
                .raw_fields()
                .context("add command carried no customer fields")?;
            let record = app.add_customer(&raw)?;
            println!("Customer added successfully!");
            if args.verbose {
                println!(
                    "  {} {}: avg purchase {}, frequency {}, lifespan {}",
                    record.first_name,
                    record.last_name,
                    record.avg_purchase_value,
                    record.purchase_frequency,
                    record.customer_lifespan
                );
            }
        }
        Command::Cluster { output, no_plot } => {
            let start_time = Instant::now();
            let result = app.run_clustering()?;
            print_cluster_statistics(&result);

            if !no_plot {
                viz::create_cluster_visualization(&result, output, None)
                    .with_context(|| format!("failed to render plot to {}", output.display()))?;
                println!("\nCluster plot saved to: {}", output.display());
            }
            if args.verbose {
                println!(
                    "Processing time: {:.2}s",
                    start_time.elapsed().as_secs_f64()
                );
            }
        }
        Command::Clear => match app.clear_customer_data()? {
            ClearOutcome::Cleared { removed } => {
                println!("Customer data cleared successfully!");
                if args.verbose {
                    println!("  Removed {} customers", removed);
                }
            }
            ClearOutcome::AlreadyEmpty => println!("Customer data file is already empty."),
        },
        Command::List => {
            let customers = app.customers()?;
            if customers.is_empty() {
                println!("No customers stored.");
            }
            for (i, c) in customers.iter().enumerate() {
                println!(
                    "{:4}  {} {}  avg={} freq={} lifespan={}",
                    i + 1,
                    c.first_name,
                    c.last_name,
                    c.avg_purchase_value,
                    c.purchase_frequency,
                    c.customer_lifespan
                );
            }
        }
    }

    Ok(())
}

fn print_cluster_statistics(result: &ClusteringResult) {
    let total = result.labels.len();
    println!("=== Cluster Statistics ===");
    println!("Customers: {}", total);
    for (i, &size) in result.cluster_sizes().iter().enumerate() {
        let percentage = (size as f64 / total as f64) * 100.0;
        println!("Cluster {}: {} customers ({:.1}%)", i, size, percentage);
    }
    if result.empty_clusters() > 0 {
        println!(
            "Note: {} cluster(s) are empty; add more distinct customers for a full segmentation.",
            result.empty_clusters()
        );
    }
    println!("Within-cluster sum of squares: {:.2}", result.inertia);

    println!("\nAssignments:");
    for (record, label) in result.records.iter().zip(&result.labels) {
        println!(
            "  {} {} -> cluster {}",
            record.first_name, record.last_name, label
        );
    }
}
