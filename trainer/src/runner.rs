use std::path::Path;
use tracing::{info, warn};
use yolo_codebase::plan::{BootstrapPlan, Step};
use yolo_codebase::report::{RunReport, StepStatus};
use crate::client::{ExistingPolicy, FetchOutcome, ReleaseClient};
use crate::launcher::{exit_code, launch};

/// Executes plan steps one after another. A failed step never stops the ones after it
pub struct Runner<'a> {
    client: &'a ReleaseClient,
    policy: ExistingPolicy,
    dry_run: bool,
}

impl<'a> Runner<'a> {
    pub fn new(client: &'a ReleaseClient, policy: ExistingPolicy, dry_run: bool) -> Self {
        Self { client, policy, dry_run }
    }

    pub fn run(&self, plan: &BootstrapPlan) -> RunReport {
        for hazard in plan.ordering_hazards() {
            warn!("Step order: {} (pass --fetch-first to download first)", hazard);
        }

        let mut report = RunReport::default();
        let total = plan.steps.len();
        for (index, step) in plan.steps.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, total, step);

            let status = if self.dry_run {
                describe(step, &plan.work_dir);
                StepStatus::Succeeded
            } else {
                self.execute(step, &plan.work_dir)
            };

            if let StepStatus::Failed { code, message } = &status {
                warn!("{} failed with code {}: {}", step, code, message);
            }
            report.push(step.to_string(), status);
        }
        report
    }

    fn execute(&self, step: &Step, work_dir: &Path) -> StepStatus {
        match step {
            Step::Launch(job) => {
                let weights = work_dir.join(&job.weights);
                if !weights.exists() {
                    warn!("{} does not exist yet, the training program will likely reject it", weights.display());
                }
                match launch(&job.command(), work_dir) {
                    Ok(status) if status.success() => StepStatus::Succeeded,
                    Ok(status) => StepStatus::Failed {
                        code: exit_code(&status),
                        message: format!("training exited with {}", status),
                    },
                    Err(e) => StepStatus::failed(format!("{:#}", e)),
                }
            }
            Step::Fetch(artifact) => match self.client.fetch(artifact, self.policy) {
                Ok(FetchOutcome::Downloaded(bytes)) => {
                    info!("Saved {} ({} bytes)", artifact.local_path.display(), bytes);
                    StepStatus::Succeeded
                }
                Ok(FetchOutcome::AlreadyPresent) => {
                    info!("Kept existing {}", artifact.local_path.display());
                    StepStatus::Skipped
                }
                Err(e) => StepStatus::failed(format!("{:#}", e)),
            },
        }
    }
}

fn describe(step: &Step, work_dir: &Path) {
    match step {
        Step::Launch(job) => info!("Would run '{}' in {}", job.command(), work_dir.display()),
        Step::Fetch(artifact) => info!("Would download {} to {}", artifact.url, artifact.local_path.display()),
    }
}
