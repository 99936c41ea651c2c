use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use crate::assets::WeightVariant;

pub const RUN_NAME: &str = "yolov7-custom";

/// Arguments of one invocation of the YOLOv7 training entry point.
/// Nothing here is validated; the training program owns that.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobDescriptor {
    pub program: String,
    pub script: PathBuf,
    pub workers: u32,
    pub device: String,
    pub batch_size: u32,
    pub data: PathBuf,
    pub img: (u32, u32),
    pub cfg: PathBuf,
    pub weights: PathBuf,
    pub name: String,
    pub hyp: PathBuf,
}

impl JobDescriptor {
    pub fn yolov7_custom() -> Self {
        Self {
            program: "python".to_owned(),
            script: PathBuf::from("train.py"),
            workers: 8,
            device: "0".to_owned(),
            batch_size: 32,
            data: PathBuf::from("data/custom.yaml"),
            img: (640, 640),
            cfg: PathBuf::from("cfg/training/yolov7-custom.yaml"),
            weights: PathBuf::from(WeightVariant::Base.file_name()),
            name: RUN_NAME.to_owned(),
            hyp: PathBuf::from("data/hyp.scratch.custom.yaml"),
        }
    }

    /// Flags passed after the script, in the order the training program documents them
    pub fn args(&self) -> Vec<String> {
        vec![
            "--workers".into(),
            self.workers.to_string(),
            "--device".into(),
            self.device.clone(),
            "--batch-size".into(),
            self.batch_size.to_string(),
            "--data".into(),
            self.data.display().to_string(),
            "--img".into(),
            self.img.0.to_string(),
            self.img.1.to_string(),
            "--cfg".into(),
            self.cfg.display().to_string(),
            "--weights".into(),
            self.weights.display().to_string(),
            "--name".into(),
            self.name.clone(),
            "--hyp".into(),
            self.hyp.display().to_string(),
        ]
    }

    pub fn command(&self) -> LaunchCommand {
        let mut args = vec![self.script.display().to_string()];
        args.extend(self.args());
        LaunchCommand { program: self.program.clone(), args }
    }
}

impl Default for JobDescriptor {
    fn default() -> Self {
        Self::yolov7_custom()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Display for LaunchCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
