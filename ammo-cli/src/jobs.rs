//! Run generation jobs concurrently and print what they wrote.

use std::collections::HashSet;
use std::path::PathBuf;

use ammo_workload::{Workload, WriteStats};
use anyhow::{Context, Result, bail};
use bytesize::ByteSize;
use yansi::Paint;

use crate::config::Job;

/// The outcome of a finished job.
#[derive(Debug)]
pub struct JobReport {
    /// Path of the written ammo file.
    pub output: PathBuf,
    /// The generated workload.
    pub workload: Workload,
    /// What was written to the file.
    pub stats: WriteStats,
}

/// Generates all `jobs` concurrently, each file from its own random sequence seeded with `seed`.
///
/// Every job is resolved and checked before the first file is created. Generation itself runs on
/// the blocking pool of the current runtime, one thread per job.
pub async fn run(
    jobs: Vec<Job>,
    seed: u64,
    default_value_len: ByteSize,
) -> Result<Vec<JobReport>> {
    let mut outputs = HashSet::new();
    let mut resolved = Vec::with_capacity(jobs.len());
    for job in jobs {
        if !outputs.insert(job.output.clone()) {
            bail!("more than one job writes to {}", job.output.display());
        }
        let workload = job.workload.to_workload(default_value_len)?;
        workload
            .records(seed)
            .with_context(|| format!("invalid job for {}", job.output.display()))?;
        resolved.push((job.output, workload));
    }

    let tasks: Vec<_> = resolved
        .into_iter()
        .map(|(output, workload)| {
            let span =
                tracing::info_span!("job", output = %output.display(), mode = workload.name());
            tokio::task::spawn_blocking(move || -> Result<JobReport> {
                let _guard = span.enter();
                let stats = workload
                    .write_file(seed, &output)
                    .with_context(|| format!("failed to generate {}", output.display()))?;
                Ok(JobReport {
                    output,
                    workload,
                    stats,
                })
            })
        })
        .collect();

    let mut reports = Vec::with_capacity(tasks.len());
    for task in futures::future::join_all(tasks).await {
        reports.push(task.context("generation job panicked")??);
    }
    Ok(reports)
}

/// Prints a summary of every report and the totals to stdout.
pub fn print_reports(reports: &[JobReport]) {
    let mut total = WriteStats::default();

    for report in reports {
        println!(
            "{} {} ({})",
            "## Ammo".bold(),
            report.output.display().bold().blue(),
            report.workload
        );
        print_stats(&report.stats);

        total.records += report.stats.records;
        total.puts += report.stats.puts;
        total.gets += report.stats.gets;
        total.bytes += report.stats.bytes;
    }

    if reports.len() > 1 {
        println!("{}", "## TOTALS".bold());
        print_stats(&total);
    }
}

fn print_stats(stats: &WriteStats) {
    println!(
        "  {} records ({} put, {} get), {}",
        stats.records.bold(),
        stats.puts.green(),
        stats.gets.green(),
        ByteSize::b(stats.bytes).bold()
    );
}

#[cfg(test)]
mod tests {
    use ammo_test::ammo::read_file;

    use super::*;
    use crate::config::WorkloadConfig;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .max_blocking_threads(2)
            .build()
            .unwrap()
    }

    #[test]
    fn runs_all_jobs() {
        ammo_test::tracing::init();
        let dir = tempfile::tempdir().unwrap();

        let jobs = vec![
            Job {
                output: dir.path().join("put.ammo"),
                workload: WorkloadConfig::Put {
                    shots: 20,
                    value_len: None,
                },
            },
            Job {
                output: dir.path().join("get.ammo"),
                workload: WorkloadConfig::Get {
                    shots: 30,
                    population_size: 20,
                },
            },
            Job {
                output: dir.path().join("mixed.ammo"),
                workload: WorkloadConfig::Mixed {
                    shots: 40,
                    value_len: Some(ByteSize::b(4)),
                    current_db_size: 20,
                },
            },
        ];

        let reports = runtime()
            .block_on(run(jobs, 0, ByteSize::b(16)))
            .unwrap();

        assert_eq!(reports.len(), 3);
        for report in &reports {
            let records = read_file(&report.output).unwrap();
            assert_eq!(records.len() as u64, report.stats.records);
        }
        assert_eq!(reports[0].stats.puts, 20);
        assert_eq!(
            reports[0].workload,
            Workload::Put {
                shots: 20,
                value_len: 16
            }
        );
        assert_eq!(reports[1].stats.gets, 30);
        assert!(reports[2].stats.puts <= 20);

        print_reports(&reports);
    }

    #[test]
    fn invalid_job_creates_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let put = dir.path().join("put.ammo");

        let jobs = vec![
            Job {
                output: put.clone(),
                workload: WorkloadConfig::Put {
                    shots: 20,
                    value_len: None,
                },
            },
            Job {
                output: dir.path().join("mixed.ammo"),
                workload: WorkloadConfig::Mixed {
                    shots: 40,
                    value_len: None,
                    current_db_size: 0,
                },
            },
        ];

        assert!(runtime().block_on(run(jobs, 0, ByteSize::b(16))).is_err());
        assert!(!put.exists());
    }

    #[test]
    fn duplicate_outputs_are_rejected() {
        let job = Job {
            output: "same.ammo".into(),
            workload: WorkloadConfig::Get {
                shots: 1,
                population_size: 1,
            },
        };

        let result = runtime().block_on(run(vec![job.clone(), job], 0, ByteSize::b(16)));
        assert!(result.is_err());
    }
}
