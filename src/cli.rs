//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::data::RawCustomerFields;

/// Record customers and segment them with K-Means clustering
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the customer data CSV file
    #[arg(
        short,
        long,
        env = "CUSTOMER_STORE",
        default_value = "customer_data.csv",
        global = true
    )]
    pub store: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Add a customer record
    Add {
        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,

        /// Average purchase value (a number)
        #[arg(long, allow_hyphen_values = true)]
        avg_purchase: String,

        /// Purchase frequency (a whole number)
        #[arg(long, allow_hyphen_values = true)]
        frequency: String,

        /// Customer lifespan (a whole number)
        #[arg(long, allow_hyphen_values = true)]
        lifespan: String,
    },

    /// Segment stored customers and plot the result
    Cluster {
        /// Output path for the scatter plot
        #[arg(short, long, default_value = "customer_clusters.png")]
        output: PathBuf,

        /// Skip rendering the plot
        #[arg(long)]
        no_plot: bool,
    },

    /// Remove all stored customers, keeping the header
    Clear,

    /// List stored customers
    List,
}

impl Command {
    /// Raw fields of an `add` command; validation is left to the core.
    pub fn raw_fields(&self) -> Option<RawCustomerFields> {
        match self {
            Command::Add {
                first_name,
                last_name,
                avg_purchase,
                frequency,
                lifespan,
            } => Some(RawCustomerFields::new(
                first_name.as_str(),
                last_name.as_str(),
                avg_purchase.as_str(),
                frequency.as_str(),
                lifespan.as_str(),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "customer-segmenter",
            "add",
            "--first-name",
            "Ada",
            "--last-name",
            "Lovelace",
            "--avg-purchase",
            "12.5",
            "--frequency",
            "3",
            "--lifespan",
            "-1",
        ])
        .unwrap();

        let raw = args.command.raw_fields().unwrap();
        assert_eq!(raw, RawCustomerFields::new("Ada", "Lovelace", "12.5", "3", "-1"));
    }

    #[test]
    fn test_numeric_fields_are_not_parsed_by_clap() {
        let args = Args::try_parse_from([
            "customer-segmenter",
            "add",
            "--first-name",
            "Ada",
            "--last-name",
            "L",
            "--avg-purchase",
            "lots",
            "--frequency",
            "3",
            "--lifespan",
            "1",
        ])
        .unwrap();
        assert_eq!(args.command.raw_fields().unwrap().avg_purchase_value, "lots");
    }

    #[test]
    fn test_parse_cluster_and_globals() {
        let args = Args::try_parse_from([
            "customer-segmenter",
            "cluster",
            "--no-plot",
            "--store",
            "shop.csv",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.store, PathBuf::from("shop.csv"));
        assert!(args.verbose);
        assert_eq!(
            args.command,
            Command::Cluster {
                output: PathBuf::from("customer_clusters.png"),
                no_plot: true,
            }
        );
        assert!(args.command.raw_fields().is_none());
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Args::try_parse_from(["customer-segmenter"]).is_err());
    }
}
