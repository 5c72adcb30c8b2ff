use clap::Parser;

/// Cross-checks constituency and party-list results for twin-number anomalies.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the input and output locations and the analysis rules.
    /// Relative paths in this file are resolved against its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory) The constituency (MP) result documents, one JSON file per area.
    /// Overrides the value of the configuration file. Default: data/mp
    #[clap(long, value_parser)]
    pub mp_dir: Option<String>,

    /// (directory) The party-list (PL) result documents, named like the MP documents.
    /// Overrides the value of the configuration file. Default: data/pl
    #[clap(long, value_parser)]
    pub pl_dir: Option<String>,

    /// (file path, optional) The province table. Areas of unknown provinces are labelled 'Unknown (<prefix>)'.
    #[clap(short, long, value_parser)]
    pub provinces: Option<String>,

    /// (directory) Where the JSON reports are written. Default: data
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (repeatable) A ballot number that is never flagged. Replaces the configured exclusion set
    /// (default 6, 9, 11).
    #[clap(long, value_parser)]
    pub exclude: Option<Vec<u32>>,

    /// (default 7) The worst party-list rank at which a twin party is still flagged.
    #[clap(long, value_parser)]
    pub max_rank: Option<u32>,

    /// (default all) Which analysis to run: all, anomalies or nationwide.
    #[clap(long, value_parser)]
    pub mode: Option<String>,

    /// (file path) A reference anomaly report. If provided, twinaudit checks that the
    /// freshly computed report matches it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
