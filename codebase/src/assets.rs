use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use serde::Serialize;

pub const DEFAULT_RELEASE_URL: &str = "https://github.com/WongKinYiu/yolov7/releases/download/v0.1";

/// Pretrained checkpoints published with the YOLOv7 release, in download order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WeightVariant {
    Base,
    X,
    W6,
    E6,
    D6,
    E6e,
}

impl WeightVariant {
    pub const ALL: [WeightVariant; 6] = [
        WeightVariant::Base,
        WeightVariant::X,
        WeightVariant::W6,
        WeightVariant::E6,
        WeightVariant::D6,
        WeightVariant::E6e,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            WeightVariant::Base => "yolov7_training.pt",
            WeightVariant::X => "yolov7x_training.pt",
            WeightVariant::W6 => "yolov7-w6_training.pt",
            WeightVariant::E6 => "yolov7-e6_training.pt",
            WeightVariant::D6 => "yolov7-d6_training.pt",
            WeightVariant::E6e => "yolov7-e6e_training.pt",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            WeightVariant::Base => "base",
            WeightVariant::X => "x",
            WeightVariant::W6 => "w6",
            WeightVariant::E6 => "e6",
            WeightVariant::D6 => "d6",
            WeightVariant::E6e => "e6e",
        }
    }
}

impl Display for WeightVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown weight variant '{0}', expected one of base, x, w6, e6, d6, e6e")]
pub struct UnknownVariant(pub String);

impl FromStr for WeightVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        WeightVariant::ALL.into_iter()
            .find(|o| o.short_name() == lowered)
            .ok_or_else(|| UnknownVariant(s.to_owned()))
    }
}

/// A remote weight file and where it lands locally
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightArtifact {
    pub variant: WeightVariant,
    pub url: String,
    pub local_path: PathBuf,
}

impl WeightArtifact {
    /// Artifact for `variant` under `release_url`, stored in `work_dir` under the name the URL implies
    pub fn new(variant: WeightVariant, release_url: &str, work_dir: &Path) -> Self {
        let url = format!("{}/{}", release_url.trim_end_matches('/'), variant.file_name());
        let local_path = work_dir.join(file_name_from_url(&url).unwrap_or(variant.file_name()));
        Self { variant, url, local_path }
    }

    pub fn file_name(&self) -> &str {
        self.local_path.file_name()
            .and_then(|o| o.to_str())
            .unwrap_or(self.variant.file_name())
    }
}

/// Last path segment of a URL, without query or fragment
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    if name.is_empty() || !path.contains('/') {
        None
    } else {
        Some(name)
    }
}

/// Artifacts for `variants` in the order given
pub fn release_artifacts(variants: &[WeightVariant], release_url: &str, work_dir: &Path) -> Vec<WeightArtifact> {
    variants.iter()
        .map(|&variant| WeightArtifact::new(variant, release_url, work_dir))
        .collect()
}
