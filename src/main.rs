//! Monobin: monotonic WoE binning CLI
//!
//! `fit` bins the numeric features of a dataset against a binary target and
//! stores the binnings as JSON; `apply` adds WoE columns to a dataset using a
//! stored binning file.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use monobin::cli::{ApplyArgs, Cli, Commands, FitArgs};
use monobin::pipeline::{
    apply_columns, count_outcomes, fit_columns, load_dataset, numeric_feature_columns,
    outcomes_from_column, save_dataset,
};
use monobin::report::{print_bin_table, read_export, write_export, BinningExport, ExportParams, FitReport};
use monobin::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success, print_warning,
    FitCard,
};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Fit(args) => run_fit(args, cli.infer_schema_length),
        Commands::Apply(args) => run_apply(args, cli.infer_schema_length),
    }
}

fn run_fit(args: &FitArgs, infer_schema_length: usize) -> Result<()> {
    let output_path = args.output_path();
    let strategy = args.cut_strategy();
    let config = args.merge_config();
    let mapping = args.target_mapping();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&FitCard {
        input: &args.input,
        target: &args.target,
        output: &output_path,
        strategy: &strategy.to_string(),
        direction: &config.direction.to_string(),
        min_bin_size: &config.min_bin_size.to_string(),
        max_bins: config.max_bins,
    });

    // Step 1: load the dataset and resolve outcomes
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();

    let spinner = create_spinner("Reading dataset...");
    let df = load_dataset(&args.input, infer_schema_length)?;
    finish_with_success(&spinner, "Dataset loaded");

    let outcomes = outcomes_from_column(&df, &args.target, mapping.as_ref())?;
    let (events, non_events, ignored) = count_outcomes(&outcomes);
    println!(
        "      {} rows x {} columns",
        style(df.height()).yellow().bold(),
        style(df.width()).yellow().bold()
    );
    print_count(
        "events",
        events,
        Some(&format!("({} non-events)", non_events)),
    );
    if ignored > 0 {
        print_warning(&format!(
            "{} rows have no usable outcome and are left out of fitting",
            ignored
        ));
    }

    let features = if args.features.is_empty() {
        numeric_feature_columns(&df, &args.target)
    } else {
        args.features.clone()
    };
    if features.is_empty() {
        anyhow::bail!("No numeric feature columns to bin besides '{}'", args.target);
    }
    print_count("features to bin", features.len(), None);

    let load_elapsed = step_start.elapsed();
    print_step_time(load_elapsed);

    // Step 2: fit one binning per feature
    print_step_header(2, "Monotonic Binning");
    let step_start = Instant::now();

    let fits = fit_columns(
        &df,
        &args.target,
        &features,
        mapping.as_ref(),
        &strategy,
        &config,
    )?;

    if !args.no_table {
        for column in &fits {
            if let Ok(binning) = &column.result {
                print_bin_table(&column.feature, binning);
            }
        }
    }

    let fit_elapsed = step_start.elapsed();
    print_success("Binning complete");
    print_step_time(fit_elapsed);

    let mut report = FitReport::from_fits(&fits);
    report.set_load_time(load_elapsed);
    report.set_fit_time(fit_elapsed);
    report.display();

    // Step 3: store the binnings
    print_step_header(3, "Save Binnings");
    let step_start = Instant::now();

    let input_file = args.input.display().to_string();
    let export = BinningExport::from_fits(
        &fits,
        &ExportParams {
            input_file: &input_file,
            target_column: &args.target,
            target_mapping: mapping.as_ref(),
            strategy: &strategy,
            merge: &config,
        },
    );
    write_export(&export, &output_path)?;

    print_success(&format!("Saved {}", output_path.display()));
    print_step_time(step_start.elapsed());

    if report.fitted_count() == 0 {
        print_warning("No feature could be binned");
    }
    print_completion("Fitting complete!");

    Ok(())
}

fn run_apply(args: &ApplyArgs, infer_schema_length: usize) -> Result<()> {
    let output_path = args.output_path();

    print_banner(env!("CARGO_PKG_VERSION"));

    // Step 1: read stored binnings and the dataset
    print_step_header(1, "Load Inputs");
    let step_start = Instant::now();

    let export = read_export(&args.binning)?;
    let binnings = export.binnings();
    print_count(
        "stored binnings",
        binnings.len(),
        Some(&format!("(target '{}')", export.metadata.target_column)),
    );

    let spinner = create_spinner("Reading dataset...");
    let mut df = load_dataset(&args.input, infer_schema_length)?;
    finish_with_success(&spinner, "Dataset loaded");
    print_step_time(step_start.elapsed());

    // Step 2: add WoE columns
    print_step_header(2, "Apply WoE");
    let step_start = Instant::now();

    if binnings.is_empty() {
        print_info("Binning file holds no fitted features");
    }
    let added = apply_columns(&mut df, &binnings)?;
    print_count("WoE columns added", added.len(), None);
    print_step_time(step_start.elapsed());

    // Step 3: save
    print_step_header(3, "Save Results");
    let step_start = Instant::now();

    save_dataset(&mut df, &output_path)?;
    print_success(&format!("Saved {}", output_path.display()));
    print_step_time(step_start.elapsed());

    print_completion("WoE applied!");

    Ok(())
}
