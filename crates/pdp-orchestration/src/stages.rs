//! Collection-wide tool stages: gene calling and PrimerSearch screening.
//!
//! Each stage builds one task per unit of work, runs the batch through the
//! [`Dispatcher`], and records the outputs of successful tasks on the genome
//! collection. Genomes with a failed task keep their previous paths.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use pdp_core::collection::GenomeCollection;
use pdp_core::error::{PdpError, Result};
use pdp_core::primers::PrimerSet;
use pdp_core::task::Task;

use crate::aggregator::aggregate;
use crate::backend::{quote, quote_path};
use crate::dispatcher::{BatchReport, Dispatcher};
use crate::interfaces::ProgressReporter;

/// Create the stage output directory.
///
/// An existing directory is an error unless `force` is set; with `force` its
/// contents are kept so completed outputs can be reused.
pub fn prepare_output_dir(path: &Path, force: bool) -> Result<()> {
    if path.exists() {
        if !force {
            return Err(PdpError::Config(format!(
                "output directory {} exists (use --force to reuse it)",
                path.display()
            )));
        }
        tracing::warn!(path = %path.display(), "output directory exists, reusing it");
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| PdpError::io(path, e))?;
    tracing::info!(path = %path.display(), "created output directory");
    Ok(())
}

/// Append `&& mv partial output` so the final name only appears on success.
fn committed(command: String, partial: &Path, output: &Path) -> String {
    format!(
        "{command} && mv {} {}",
        quote_path(partial),
        quote_path(output)
    )
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// One gene-calling task per genome, identified by genome name.
#[must_use]
pub fn prodigal_tasks(coll: &GenomeCollection, prodigal: &str, outdir: &Path) -> Vec<Task> {
    coll.genomes()
        .iter()
        .map(|g| {
            let stem = g.stem();
            let features = outdir.join(format!("{stem}.features"));
            let genes = outdir.join(format!("{stem}.gff"));
            let partial = partial_path(&features);
            let command = format!(
                "{} -q -i {} -a {} -o {}",
                quote(prodigal),
                quote_path(&g.seqfile),
                quote_path(&partial),
                quote_path(&genes)
            );
            Task::new(g.name.clone(), committed(command, &partial, &features), features)
        })
        .collect()
}

/// Run gene calling and record each genome's feature file.
pub fn run_prodigal(
    coll: &mut GenomeCollection,
    prodigal: &str,
    outdir: &Path,
    dispatcher: &Dispatcher,
    reporter: &dyn ProgressReporter,
) -> Result<BatchReport> {
    let tasks = prodigal_tasks(coll, prodigal, outdir);
    let report = dispatcher.run_with_reporter("prodigal", &tasks, reporter)?;
    let outputs = aggregate(report.results.clone()).outputs;
    for genome in coll.genomes_mut() {
        if let Some(path) = outputs.get(&genome.name) {
            genome.features = Some(path.clone());
        }
    }
    Ok(report)
}

/// PrimerSearch work for one collection.
#[derive(Debug, Clone)]
pub struct PrimerSearchPlan {
    pub tasks: Vec<Task>,
    /// Source genome → (target genome → task identifier, report path).
    pub reports: BTreeMap<String, BTreeMap<String, (String, PathBuf)>>,
}

/// Options for PrimerSearch screening.
#[derive(Debug, Clone)]
pub struct PrimerSearchOptions {
    pub executable: String,
    pub mismatch_percent: u32,
    pub outdir: PathBuf,
}

/// Write each genome's primer table and plan a search of every genome in the
/// collection against it.
pub fn plan_primersearch(
    coll: &GenomeCollection,
    opts: &PrimerSearchOptions,
) -> Result<PrimerSearchPlan> {
    let mut tasks = Vec::new();
    let mut reports = BTreeMap::new();

    for source in coll.genomes() {
        let Some(primer_file) = source.primers.as_deref() else {
            tracing::warn!(genome = %source.name, "no primer file, not searching");
            continue;
        };
        let stem = source.stem();
        let table = opts.outdir.join(format!("{stem}_primers.primertab"));
        PrimerSet::load(primer_file)?.write_primersearch_table(&table)?;

        let mut targets = BTreeMap::new();
        for target in coll.genomes() {
            let output = opts
                .outdir
                .join(format!("{stem}_vs_{}.primersearch", target.stem()));
            let partial = partial_path(&output);
            let id = format!("{}_vs_{}", source.name, target.name);
            let command = format!(
                "{} -auto -seqall {} -infile {} -mismatchpercent {} -outfile {}",
                quote(&opts.executable),
                quote_path(target.search_seqfile()),
                quote_path(&table),
                opts.mismatch_percent,
                quote_path(&partial)
            );
            tasks.push(Task::new(
                id.clone(),
                committed(command, &partial, &output),
                output.clone(),
            ));
            targets.insert(target.name.clone(), (id, output));
        }
        reports.insert(source.name.clone(), targets);
    }
    Ok(PrimerSearchPlan { tasks, reports })
}

/// Run PrimerSearch and record each fully searched genome's report map.
pub fn run_primersearch(
    coll: &mut GenomeCollection,
    opts: &PrimerSearchOptions,
    dispatcher: &Dispatcher,
    reporter: &dyn ProgressReporter,
) -> Result<BatchReport> {
    let plan = plan_primersearch(coll, opts)?;
    let report = dispatcher.run_with_reporter("primersearch", &plan.tasks, reporter)?;
    let outputs = aggregate(report.results.clone()).outputs;

    for genome in coll.genomes_mut() {
        let Some(targets) = plan.reports.get(&genome.name) else {
            continue;
        };
        if !targets.values().all(|(id, _)| outputs.contains_key(id)) {
            tracing::warn!(genome = %genome.name, "PrimerSearch incomplete, map not written");
            continue;
        }
        let map: BTreeMap<&str, &Path> = targets
            .iter()
            .map(|(target, (_, path))| (target.as_str(), path.as_path()))
            .collect();
        let map_path = opts.outdir.join(format!("{}_primersearch.json", genome.stem()));
        let text = serde_json::to_string_pretty(&map)
            .map_err(|e| PdpError::io(&map_path, std::io::Error::other(e)))?;
        fs::write(&map_path, text).map_err(|e| PdpError::io(&map_path, e))?;
        genome.primersearch = Some(map_path);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatchConfig;
    use crate::interfaces::NullProgressReporter;
    use pdp_core::collection::GenomeData;

    fn genome(dir: &Path, name: &str, primers: Option<PathBuf>) -> GenomeData {
        let seqfile = dir.join(format!("{name}.fna"));
        fs::write(&seqfile, format!(">{name}\nACGT\n")).unwrap();
        GenomeData {
            name: name.into(),
            groups: vec![],
            seqfile,
            filtered_seqfile: None,
            features: None,
            primers,
            primersearch: None,
        }
    }

    fn collection(dir: &Path) -> GenomeCollection {
        let primers = dir.join("g1_primers.json");
        fs::write(
            &primers,
            r#"[{"name": "g1_p1", "forward_seq": "ACG", "reverse_seq": "CGT"}]"#,
        )
        .unwrap();
        GenomeCollection::new(
            "t",
            vec![genome(dir, "g1", Some(primers)), genome(dir, "g2", None)],
        )
        .unwrap()
    }

    #[test]
    fn output_dir_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("extract");
        prepare_output_dir(&out, false).unwrap();
        assert!(out.is_dir());
        assert!(prepare_output_dir(&out, false).unwrap_err().is_config());
        prepare_output_dir(&out, true).unwrap();
    }

    #[test]
    fn prodigal_task_layout() {
        let dir = tempfile::tempdir().unwrap();
        let coll = collection(dir.path());
        let tasks = prodigal_tasks(&coll, "prodigal", Path::new("out"));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].identifier(), "g1");
        assert_eq!(tasks[0].expected_output(), Path::new("out/g1.features"));
        assert!(tasks[0]
            .command()
            .ends_with("-a out/g1.features.partial -o out/g1.gff && mv out/g1.features.partial out/g1.features"));
    }

    #[test]
    fn primersearch_plan_covers_all_targets() {
        let dir = tempfile::tempdir().unwrap();
        let coll = collection(dir.path());
        let opts = PrimerSearchOptions {
            executable: "primersearch".into(),
            mismatch_percent: 10,
            outdir: dir.path().to_path_buf(),
        };
        let plan = plan_primersearch(&coll, &opts).unwrap();
        let ids: Vec<&str> = plan.tasks.iter().map(Task::identifier).collect();
        assert_eq!(ids, ["g1_vs_g1", "g1_vs_g2"]);
        assert!(plan.tasks[1].command().contains("-mismatchpercent 10"));
        assert_eq!(
            fs::read_to_string(dir.path().join("g1_primers.primertab")).unwrap(),
            "g1_p1\tACG\tCGT\n"
        );
        assert_eq!(plan.reports.len(), 1);
        assert_eq!(plan.reports["g1"].len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn primersearch_records_report_maps() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake_primersearch");
        fs::write(
            &fake,
            "#!/bin/sh\nfor last; do :; done\necho 'Primer name g1_p1' > \"$last\"\n",
        )
        .unwrap();
        fs::set_permissions(&fake, fs::Permissions::from_mode(0o755)).unwrap();

        let mut coll = collection(dir.path());
        let opts = PrimerSearchOptions {
            executable: fake.to_string_lossy().into_owned(),
            mismatch_percent: 5,
            outdir: dir.path().to_path_buf(),
        };
        let dispatcher = Dispatcher::local(DispatchConfig::new(2, dir.path()));
        let report = run_primersearch(&mut coll, &opts, &dispatcher, &NullProgressReporter).unwrap();
        assert!(report.is_success());

        let map_path = coll.get("g1").unwrap().primersearch.clone().unwrap();
        let map: BTreeMap<String, PathBuf> =
            serde_json::from_str(&fs::read_to_string(&map_path).unwrap()).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["g1", "g2"]);
        assert!(coll.get("g2").unwrap().primersearch.is_none());
        assert!(dir.path().join("g1_vs_g2.primersearch").exists());
    }
}
