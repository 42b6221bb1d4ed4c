//! Command-line driver: read events from JSON, rerun the clustering,
//! validate against truth and an optional reference reconstruction.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::module_name_repetitions
)]

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rustcal_algorithms::reconstruct_event;
use rustcal_analysis::{
    associate, compare_aligned, efficiency, AggregateStats, ComparisonPair, KinematicsDelta,
    MatchCriterion, MetricKey,
};
use rustcal_core::cluster::MultiCluster;
use rustcal_core::diagnostics::EventDiagnostics;
use rustcal_core::hit::{RawHit, TruthCluster};
use rustcal_core::{ClusteringConfig, DistanceMetric};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] rustcal_core::Error),
}

/// Transverse metric selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Metric {
    /// (eta, phi) distance with phi wrapped across the seam
    EtaPhi,
    /// Plain planar distance
    Plane,
}

impl From<Metric> for DistanceMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::EtaPhi => DistanceMetric::EtaPhi,
            Metric::Plane => DistanceMetric::Plane,
        }
    }
}

/// Calorimeter shower clustering and validation.
#[derive(Parser)]
#[command(name = "rustcal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rerun the clustering on a JSON event file and summarize
    Process {
        /// Input JSON event file
        input: PathBuf,

        /// Output file for the JSON summary (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hit energy threshold in GeV
        #[arg(long, default_value = "0.060")]
        ecut: f64,

        /// Critical distance for the local density estimate
        #[arg(long, default_value = "0.05")]
        dc: f64,

        /// Density threshold separating halo from clusterable hits
        #[arg(long, default_value = "0.1")]
        rho_c: f64,

        /// Isolation threshold for seeds
        #[arg(long, default_value = "0.05")]
        delta_c: f64,

        /// Maximum centroid separation for linking
        #[arg(long, default_value = "0.015")]
        multicluster_radius: f64,

        /// Minimum component size for an emitted multi-cluster
        #[arg(long, default_value = "3")]
        min_clusters: usize,

        /// Transverse distance metric
        #[arg(long, value_enum, default_value = "eta-phi")]
        metric: Metric,

        /// Angular matching radius for the efficiency flags
        #[arg(long, default_value = "0.1")]
        match_dr: f64,

        /// Process events on all cores
        #[arg(long)]
        parallel: bool,
    },
}

/// One event as supplied by the ntuple exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRecord {
    hits: Vec<RawHit>,
    #[serde(default)]
    truth: Vec<TruthCluster>,
    /// Multi-clusters from the reference reconstruction, when exported.
    #[serde(default)]
    reference: Vec<MultiCluster>,
}

/// Everything accumulated from one event, merged commutatively across
/// the batch.
#[derive(Debug, Default)]
struct EventOutcome {
    events: usize,
    failed_events: usize,
    clusters2d: usize,
    multiclusters: usize,
    efficiency_pass: usize,
    efficiency_total: usize,
    diagnostics: EventDiagnostics,
    stats: AggregateStats,
}

impl EventOutcome {
    fn merge(mut self, other: Self) -> Self {
        self.events += other.events;
        self.failed_events += other.failed_events;
        self.clusters2d += other.clusters2d;
        self.multiclusters += other.multiclusters;
        self.efficiency_pass += other.efficiency_pass;
        self.efficiency_total += other.efficiency_total;
        self.diagnostics.merge(&other.diagnostics);
        self.stats.merge(&other.stats);
        self
    }
}

#[derive(Debug, Serialize)]
struct MetricSummary {
    key: MetricKey,
    n: u64,
    mean: Option<f64>,
    variance: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Summary {
    events: usize,
    failed_events: usize,
    clusters2d: usize,
    multiclusters: usize,
    efficiency_pass: usize,
    efficiency_total: usize,
    diagnostics: EventDiagnostics,
    undefined_ratios: usize,
    metrics: Vec<MetricSummary>,
}

fn process_one(index: usize, record: &EventRecord, config: &ClusteringConfig, match_dr: f64) -> EventOutcome {
    let mut outcome = EventOutcome {
        events: 1,
        ..EventOutcome::default()
    };

    let reco = match reconstruct_event(record.hits.iter().copied(), config) {
        Ok(reco) => reco,
        Err(err) => {
            error!("event {}: reconstruction failed: {}", index, err);
            outcome.failed_events = 1;
            return outcome;
        }
    };
    outcome.clusters2d = reco.clusters2d.len();
    outcome.multiclusters = reco.multiclusters.len();
    outcome.diagnostics = reco.diagnostics;

    // Truth association feeds the missing-id diagnostics even when the
    // kinematic comparison below is not applicable.
    let (store, _) = rustcal_core::HitStore::build(record.hits.iter().copied());
    for truth in &record.truth {
        let assoc = associate(truth, &store, config.ecut);
        outcome.diagnostics.missing_truth_hits += assoc.missing.len();
    }

    // Index-aligned kinematic comparison against truth and reference.
    for delta in compare_aligned(&reco.multiclusters, &record.truth) {
        outcome.stats.record_delta(ComparisonPair::RerunVsTruth, &delta);
    }
    for delta in compare_aligned(&reco.multiclusters, &record.reference) {
        outcome
            .stats
            .record_delta(ComparisonPair::RerunVsReference, &delta);
    }
    if !record.reference.is_empty() && record.reference.len() == record.truth.len() {
        for (reference, truth) in record.reference.iter().zip(record.truth.iter()) {
            outcome.stats.record_delta(
                ComparisonPair::ReferenceVsTruth,
                &KinematicsDelta::between(reference, truth),
            );
        }
    }

    let flags = efficiency(
        &record.truth,
        &reco.multiclusters,
        &reco.clusters2d,
        MatchCriterion::DeltaR(match_dr),
    );
    outcome.efficiency_total = flags.len();
    outcome.efficiency_pass = flags.iter().filter(|f| f.passed).count();

    info!(
        "event {}: {} hits, {} clusters, {} multi-clusters",
        index,
        record.hits.len(),
        outcome.clusters2d,
        outcome.multiclusters
    );

    outcome
}

fn run_process(
    input: &PathBuf,
    config: &ClusteringConfig,
    match_dr: f64,
    parallel: bool,
) -> Result<Summary> {
    config.validate()?;

    let payload = std::fs::read_to_string(input)?;
    let events: Vec<EventRecord> = serde_json::from_str(&payload)?;
    info!("loaded {} events from {}", events.len(), input.display());

    let start = Instant::now();
    let total = if parallel {
        events
            .par_iter()
            .enumerate()
            .map(|(i, record)| process_one(i, record, config, match_dr))
            .reduce(EventOutcome::default, EventOutcome::merge)
    } else {
        events
            .iter()
            .enumerate()
            .map(|(i, record)| process_one(i, record, config, match_dr))
            .fold(EventOutcome::default(), EventOutcome::merge)
    };
    info!("processed {} events in {:.2?}", total.events, start.elapsed());

    let metrics = total
        .stats
        .iter()
        .map(|(key, stats)| MetricSummary {
            key: *key,
            n: stats.n,
            mean: stats.mean(),
            variance: stats.variance(),
        })
        .collect();

    Ok(Summary {
        events: total.events,
        failed_events: total.failed_events,
        clusters2d: total.clusters2d,
        multiclusters: total.multiclusters,
        efficiency_pass: total.efficiency_pass,
        efficiency_total: total.efficiency_total,
        diagnostics: total.diagnostics,
        undefined_ratios: total.stats.undefined_ratios,
        metrics,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            ecut,
            dc,
            rho_c,
            delta_c,
            multicluster_radius,
            min_clusters,
            metric,
            match_dr,
            parallel,
        } => {
            let config = ClusteringConfig::new()
                .with_ecut(ecut)
                .with_dc(dc)
                .with_rho_c(rho_c)
                .with_delta_c(delta_c)
                .with_multicluster_radius(multicluster_radius)
                .with_min_clusters(min_clusters)
                .with_metric(metric.into());

            let summary = run_process(&input, &config, match_dr, parallel)?;
            let rendered = serde_json::to_string_pretty(&summary)?;
            match output {
                Some(path) => std::fs::write(path, rendered)?,
                None => println!("{}", rendered),
            }
            Ok(())
        }
    }
}
