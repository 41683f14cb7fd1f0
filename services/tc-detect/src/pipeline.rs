//! Per-case driver.
//!
//! `prepare` turns model history into the tracker's inputs, writes them to
//! `{output}/tracker_inputs` and refreshes the tracker's parameter file; `label` turns the tracker's output into
//! labeled storms. The tracker itself runs in between, outside this tool.

use std::time::Instant;

use anyhow::{Context, Result};
use derived_fields::{
    DerivedFieldCache, DiagnosticSet, Diagnostics, VorticityEngine, TRACKER_INPUT_DIR,
};
use grid_store::{vars, FieldWriter, ModelSource, StoreError, ZarrModelSource};
use tc_labeler::{LabelJob, LabeledCase, TrackerParameters};
use tracing::{error, info};

use crate::config::TcDetectConfig;

/// Which stages to run for each case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    Label,
    Run,
}

impl Stage {
    fn prepares(self) -> bool {
        matches!(self, Stage::Prepare | Stage::Run)
    }

    fn labels(self) -> bool {
        matches!(self, Stage::Label | Stage::Run)
    }
}

/// Outcome of a multi-case run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

pub struct CasePipeline {
    config: TcDetectConfig,
    engine: VorticityEngine,
}

impl CasePipeline {
    pub fn new(config: TcDetectConfig) -> Result<Self> {
        let engine = VorticityEngine::from_config(&config.diagnostics)
            .context("Failed to start vorticity workers")?;
        info!(workers = engine.workers(), "Vorticity worker pool ready");
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &TcDetectConfig {
        &self.config
    }

    fn open_source(&self, case: &str) -> Result<ZarrModelSource> {
        let dir = self.config.history_dir(case);
        ZarrModelSource::open(&dir, self.config.level_floor_hpa)
            .with_context(|| format!("Failed to open model history in {}", dir.display()))
    }

    /// Compute or load every diagnostic the tracker consumes and write the
    /// set the tracker reads.
    pub fn prepare(&self, case: &str) -> Result<DiagnosticSet> {
        let source = self.open_source(case)?;
        let out_dir = self.config.output_dir(case);
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;

        if let Some(path) = self.config.parameter_file() {
            TrackerParameters::from_grid(source.grid(), source.time_axis().len())
                .update_file(&path)
                .with_context(|| format!("Failed to update tracker parameters {}", path.display()))?;
        }

        let cache = DerivedFieldCache::new(&out_dir, self.config.diagnostics.store.clone());
        let set = Diagnostics::new(
            case,
            &source,
            cache,
            &self.engine,
            self.config.diagnostics.invert_vorticity_sh,
        )
        .compute_all()
        .with_context(|| format!("Failed to compute diagnostics for {}", case))?;

        let input_dir = out_dir.join(TRACKER_INPUT_DIR);
        set.write_tracker_inputs(
            &input_dir,
            source.grid(),
            source.time_axis(),
            &FieldWriter::new(self.config.diagnostics.store.clone()),
        )
        .with_context(|| format!("Failed to write tracker inputs to {}", input_dir.display()))?;

        info!(case, steps = set.u300.nt, "Tracker inputs ready");
        Ok(set)
    }

    /// Filter, label and write the tracker's storms.
    pub fn label(&self, case: &str) -> Result<LabeledCase> {
        let source = self.open_source(case)?;
        let sst_name = source
            .first_available(&[vars::SST, vars::TS])
            .ok_or_else(|| StoreError::missing_variable("SST or TS"))?;
        let sst = source
            .read_field3(sst_name)
            .with_context(|| format!("Failed to read {}", sst_name))?;
        info!(case, variable = sst_name, "Using surface temperature");

        let level = source.levels().last().copied().unwrap_or_default();
        let out_dir = self.config.output_dir(case);
        let job = LabelJob {
            dir: &out_dir,
            grid: source.grid(),
            time: source.time_axis(),
            sst: &sst,
            level,
        };
        let labeled = job
            .run(self.config.diagnostics.store.clone())
            .with_context(|| format!("Failed to label storms in {}", out_dir.display()))?;

        info!(case, storms = labeled.summary.total, "Labeling complete");
        Ok(labeled)
    }

    /// Run `stage` for one case.
    pub fn run_case(&self, case: &str, stage: Stage) -> Result<()> {
        if stage.prepares() {
            self.prepare(case)?;
        }
        if stage.labels() {
            self.label(case)?;
        }
        Ok(())
    }

    /// Run `stage` for each case in order. The first failure ends the run
    /// unless `keep_going` is set, in which case it is logged and recorded.
    pub fn run_cases(&self, cases: &[String], stage: Stage, keep_going: bool) -> Result<RunReport> {
        let mut report = RunReport::default();

        for case in cases {
            let start = Instant::now();
            info!(case = %case, ?stage, "Processing case");

            match self.run_case(case, stage) {
                Ok(()) => {
                    info!(case = %case, elapsed_ms = start.elapsed().as_millis() as u64, "Case finished");
                    report.succeeded.push(case.clone());
                }
                Err(e) if keep_going => {
                    error!(case = %case, error = %format!("{:#}", e), "Case failed, continuing");
                    report.failed.push((case.clone(), format!("{:#}", e)));
                }
                Err(e) => return Err(e.context(format!("Case {} failed", case))),
            }
        }

        Ok(report)
    }
}
