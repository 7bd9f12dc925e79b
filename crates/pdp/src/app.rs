//! Application entry point and stage dispatch.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use pdp_cli::{BatchProgressReporter, CliResultPresenter};
use pdp_core::completion::checker_for;
use pdp_core::constants::exit_codes;
use pdp_core::{GenomeCollection, PrimerSearchLocator, PrimerSet};
use pdp_orchestration::stages::{
    prepare_output_dir, run_primersearch, run_prodigal, PrimerSearchOptions,
};
use pdp_orchestration::{
    run_extraction, BatchReport, DispatchConfig, Dispatcher, ExecutionBackend, ExtractOptions,
    LocalBackend, ResultPresenter, SgeBackend,
};

use crate::config::{
    AppConfig, Commands, ConfigArgs, DedupeArgs, ExtractArgs, PrimerSearchArgs, ProdigalArgs,
    SchedulerArgs, SchedulerKind,
};
use crate::errors::{exit_code, AppError};

/// Run the selected subcommand and return the process exit code.
pub fn run(config: &AppConfig) -> i32 {
    let presenter = CliResultPresenter::new(config.common.quiet);
    match dispatch(config, &presenter) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "pdp stopped");
            presenter.present_error(&format!("{e:#}"));
            exit_code(&e)
        }
    }
}

fn dispatch(config: &AppConfig, presenter: &dyn ResultPresenter) -> Result<()> {
    let progress = BatchProgressReporter::new(config.common.show_progress());
    match &config.command {
        Commands::Completion { shell } => {
            let mut cmd = <AppConfig as clap::CommandFactory>::command();
            pdp_cli::completion::generate_completion(&mut cmd, *shell, &mut std::io::stdout());
            Ok(())
        }
        Commands::Config(args) => run_config(args),
        Commands::Dedupe(args) => run_dedupe(args),
        Commands::Prodigal(args) => run_prodigal_stage(args, &progress, presenter),
        Commands::Primersearch(args) => run_primersearch_stage(args, &progress, presenter),
        Commands::Extract(args) => {
            run_extract_stage(args, config.common.quiet, &progress, presenter)
        }
    }
}

/// Backend, completion policy and concurrency from the scheduler options.
pub fn build_dispatcher(args: &SchedulerArgs, workdir: &Path) -> Dispatcher {
    let backend: Arc<dyn ExecutionBackend> = match args.scheduler {
        SchedulerKind::Local => Arc::new(LocalBackend),
        SchedulerKind::Sge => Arc::new(SgeBackend::with_program(
            args.sge_submit.clone(),
            SgeBackend::DEFAULT_ARGS.iter().map(ToString::to_string).collect(),
        )),
    };
    let concurrency = args
        .workers
        .map_or_else(DispatchConfig::default_concurrency, usize::from);
    Dispatcher::new(
        backend,
        checker_for(args.strict_completion),
        DispatchConfig::new(concurrency, workdir),
    )
}

fn current_dispatcher(args: &SchedulerArgs) -> Result<Dispatcher> {
    let workdir = std::env::current_dir().context("could not read working directory")?;
    Ok(build_dispatcher(args, &workdir))
}

fn load_collection(path: &Path) -> Result<GenomeCollection> {
    let coll = GenomeCollection::load(path)?;
    coll.validate_files()?;
    tracing::info!(
        collection = coll.name(),
        genomes = coll.len(),
        "loaded genome collection"
    );
    Ok(coll)
}

fn stage_result(report: &BatchReport, presenter: &dyn ResultPresenter) -> Result<()> {
    presenter.present_batch(report);
    let failed = report.failures().len();
    if failed == 0 {
        Ok(())
    } else {
        Err(AppError::StageFailed {
            stage: report.stage.clone(),
            failed,
        }
        .into())
    }
}

fn run_config(args: &ConfigArgs) -> Result<()> {
    let coll = load_collection(&args.infile)?;
    println!("{}: {} genomes", coll.name(), coll.len());
    println!("groups: {}", coll.groups().join(", "));
    for genome in coll.genomes() {
        println!(
            "  {}\t{}\t{}",
            genome.name,
            genome.groups.join(","),
            genome.seqfile.display()
        );
    }
    if let Some(out) = &args.to_json {
        coll.save(out)?;
        tracing::info!(path = %out.display(), "wrote collection");
    }
    Ok(())
}

fn run_dedupe(args: &DedupeArgs) -> Result<()> {
    let primers = PrimerSet::load(&args.primerfile)?;
    let (kept, removed) = primers.dedupe();
    for name in &removed {
        tracing::info!(primer = %name, "removed duplicate primer");
    }
    kept.save(&args.outfile)?;
    println!(
        "kept {} of {} primers, wrote {}",
        kept.len(),
        primers.len(),
        args.outfile.display()
    );
    Ok(())
}

fn run_prodigal_stage(
    args: &ProdigalArgs,
    progress: &BatchProgressReporter,
    presenter: &dyn ResultPresenter,
) -> Result<()> {
    let mut coll = load_collection(&args.infile)?;
    prepare_output_dir(&args.outdir, args.force)?;
    let dispatcher = current_dispatcher(&args.scheduler)?;
    let report = run_prodigal(&mut coll, &args.prodigal, &args.outdir, &dispatcher, progress)?;
    coll.save(args.outfile.as_deref().unwrap_or(&args.infile))?;
    stage_result(&report, presenter)
}

fn run_primersearch_stage(
    args: &PrimerSearchArgs,
    progress: &BatchProgressReporter,
    presenter: &dyn ResultPresenter,
) -> Result<()> {
    let mut coll = load_collection(&args.infile)?;
    prepare_output_dir(&args.outdir, args.force)?;
    let dispatcher = current_dispatcher(&args.scheduler)?;
    let opts = PrimerSearchOptions {
        executable: args.primersearch.clone(),
        mismatch_percent: args.mismatchpercent,
        outdir: args.outdir.clone(),
    };
    let report = run_primersearch(&mut coll, &opts, &dispatcher, progress)?;
    coll.save(args.outfile.as_deref().unwrap_or(&args.infile))?;
    stage_result(&report, presenter)
}

fn run_extract_stage(
    args: &ExtractArgs,
    quiet: bool,
    progress: &BatchProgressReporter,
    presenter: &dyn ResultPresenter,
) -> Result<()> {
    let coll = load_collection(&args.infile)?;
    let primers = PrimerSet::load(&args.primerfile)?;
    let outdir = args.outdir.join(primers.name());
    prepare_output_dir(&outdir, args.force)?;

    let locator = PrimerSearchLocator::from_collection(&coll)?;
    if locator.primer_count() == 0 {
        tracing::warn!("collection records no PrimerSearch amplimers");
    }
    let dispatcher = current_dispatcher(&args.scheduler)?;
    let opts = ExtractOptions {
        outdir,
        aligner: (!args.noalign).then(|| args.mafft.clone()),
    };
    let outcome = run_extraction(&primers, &locator, &dispatcher, &opts, progress)?;

    presenter.present_warnings(&outcome.warnings);
    if !quiet {
        println!(
            "{} primers summarised in {}",
            outcome.rows.len(),
            outcome.summary_path.display()
        );
    }
    let failures: Vec<_> = outcome.failures.iter().collect();
    presenter.present_failures("extract", &failures);
    if failures.is_empty() {
        Ok(())
    } else {
        Err(AppError::StageFailed {
            stage: "extract".into(),
            failed: failures.len(),
        }
        .into())
    }
}
