use std::env::var;
use std::path::PathBuf;
use yolo_codebase::assets::{release_artifacts, WeightArtifact, WeightVariant, DEFAULT_RELEASE_URL};
use yolo_codebase::launch::JobDescriptor;

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub work_dir: PathBuf,
    pub release_url: String,
    pub python: String,
    pub train_script: String,
    pub data_path: String,
    pub cfg_path: String,
    pub hyp_path: String,
}

fn get_path(value: String) -> String {
    match value.strip_suffix('/') {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => value,
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvConfig {
    pub fn new() -> Self {
        Self::from_lookup(|name| var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let job = JobDescriptor::yolov7_custom();
        let read = |name: &str, default: String| get_path(lookup(name).unwrap_or(default));

        Self {
            work_dir: PathBuf::from(read("WORK_DIR", ".".to_owned())),
            release_url: read("RELEASE_URL", DEFAULT_RELEASE_URL.to_owned()),
            python: read("PYTHON", job.program),
            train_script: read("TRAIN_SCRIPT", job.script.display().to_string()),
            data_path: read("DATA_PATH", job.data.display().to_string()),
            cfg_path: read("CFG_PATH", job.cfg.display().to_string()),
            hyp_path: read("HYP_PATH", job.hyp.display().to_string()),
        }
    }

    /// The fixed training job with the paths of this environment
    pub fn job(&self) -> JobDescriptor {
        JobDescriptor {
            program: self.python.clone(),
            script: self.train_script.clone().into(),
            data: self.data_path.clone().into(),
            cfg: self.cfg_path.clone().into(),
            hyp: self.hyp_path.clone().into(),
            ..JobDescriptor::yolov7_custom()
        }
    }

    pub fn artifacts(&self, variants: &[WeightVariant]) -> Vec<WeightArtifact> {
        release_artifacts(variants, &self.release_url, &self.work_dir)
    }
}
