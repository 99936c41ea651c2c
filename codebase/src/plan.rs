use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use crate::assets::WeightArtifact;
use crate::launch::JobDescriptor;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Launch(JobDescriptor),
    Fetch(WeightArtifact),
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Launch(job) => write!(f, "launch {}", job.name),
            Step::Fetch(artifact) => write!(f, "fetch {}", artifact.file_name()),
        }
    }
}

/// Where the launch goes relative to the downloads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepOrder {
    /// Launch first, then every fetch
    #[default]
    AsWritten,
    FetchFirst,
}

/// A launch that reads a weight file which is only downloaded by a later step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderingHazard {
    pub launch_index: usize,
    pub fetch_index: usize,
    pub weights: PathBuf,
}

impl Display for OrderingHazard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} launches training with '{}' which step {} only downloads afterwards",
               self.launch_index + 1, self.weights.display(), self.fetch_index + 1)
    }
}

#[derive(Clone, Debug)]
pub struct BootstrapPlan {
    pub work_dir: PathBuf,
    pub steps: Vec<Step>,
}

impl BootstrapPlan {
    pub fn new(work_dir: &Path, job: Option<JobDescriptor>, artifacts: Vec<WeightArtifact>, order: StepOrder) -> Self {
        let fetches = artifacts.into_iter().map(Step::Fetch);
        let launch = job.map(Step::Launch);

        let steps = match order {
            StepOrder::AsWritten => launch.into_iter().chain(fetches).collect(),
            StepOrder::FetchFirst => fetches.chain(launch).collect(),
        };
        Self { work_dir: work_dir.to_owned(), steps }
    }

    pub fn launch_count(&self) -> usize {
        self.steps.iter().filter(|o| matches!(o, Step::Launch(_))).count()
    }

    pub fn fetch_count(&self) -> usize {
        self.steps.iter().filter(|o| matches!(o, Step::Fetch(_))).count()
    }

    /// Launch steps whose initial weights are produced by a fetch scheduled after them
    pub fn ordering_hazards(&self) -> Vec<OrderingHazard> {
        let mut hazards = Vec::new();
        for (launch_index, step) in self.steps.iter().enumerate() {
            let job = match step {
                Step::Launch(job) => job,
                Step::Fetch(_) => continue,
            };
            let weights = self.work_dir.join(&job.weights);

            let later_fetch = self.steps.iter().enumerate()
                .skip(launch_index + 1)
                .find(|(_, o)| matches!(o, Step::Fetch(artifact) if artifact.local_path == weights));
            if let Some((fetch_index, _)) = later_fetch {
                hazards.push(OrderingHazard { launch_index, fetch_index, weights: job.weights.clone() });
            }
        }
        hazards
    }
}
