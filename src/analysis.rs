use crate::model::{Proportions, Record};
use crate::stats::{OnlineStats, StatsReport};
use anyhow::{Context, Result, bail};
use rmp_serde::decode;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter},
    path::Path,
};

/// Summary of a single proportion series.
#[derive(Debug, Serialize)]
pub struct SeriesReport {
    pub name: &'static str,
    /// Value at the last recorded generation.
    pub last: f64,
    /// Statistics over the second half of the records (the first half is burn-in).
    pub equil: StatsReport,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub n_records: usize,
    pub last_gen: usize,
    pub series: Vec<SeriesReport>,
}

/// Collects the history of a run from its trajectory files.
#[derive(Default)]
pub struct Analyzer {
    records: Vec<Record>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        // The number of records per file depends on where the run resumed.
        while !reader.fill_buf().context("failed to read file")?.is_empty() {
            let record = decode::from_read(&mut reader).context("failed to read record")?;
            self.records.push(record);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn report(&self) -> Result<RunReport> {
        let Some(last) = self.records.last() else {
            bail!("no records to analyze");
        };

        let equil = &self.records[self.records.len() / 2..];
        let mut stats_vec: Vec<_> = (0..Proportions::N_ENTRIES)
            .map(|_| OnlineStats::default())
            .collect();
        for record in equil {
            for (stats, (_, val)) in stats_vec.iter_mut().zip(record.props.entries()) {
                stats.add(val);
            }
        }

        let series = last
            .props
            .entries()
            .into_iter()
            .zip(stats_vec)
            .map(|((name, last), stats)| SeriesReport {
                name,
                last,
                equil: stats.report(),
            })
            .collect();

        Ok(RunReport {
            n_records: self.records.len(),
            last_gen: last.i_gen,
            series,
        })
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let report = self.report().context("failed to build report")?;
        log_final_props(&report);

        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &report).context("failed to serialize report")?;
        Ok(())
    }
}

fn log_final_props(report: &RunReport) {
    log::info!("final proportions at generation {}:", report.last_gen);
    for series in &report.series {
        log::info!("{:<28} {:.4}", series.name, series.last);
    }
}
