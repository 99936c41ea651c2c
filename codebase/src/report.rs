use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    /// Nothing to do, e.g. the file was already present
    Skipped,
    Failed { code: i32, message: String },
}

impl StepStatus {
    pub fn failed(message: impl Into<String>) -> Self {
        StepStatus::Failed { code: 1, message: message.into() }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            StepStatus::Succeeded | StepStatus::Skipped => 0,
            StepStatus::Failed { code, .. } => *code,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepStatus::Failed { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
}

impl Display for StepOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            StepStatus::Succeeded => write!(f, "{}: ok", self.step),
            StepStatus::Skipped => write!(f, "{}: skipped", self.step),
            StepStatus::Failed { code, message } => write!(f, "{}: failed ({}) {}", self.step, code, message),
        }
    }
}

/// Outcomes of the executed steps, in execution order
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<StepOutcome>,
}

impl RunReport {
    pub fn push(&mut self, step: impl Into<String>, status: StepStatus) {
        self.outcomes.push(StepOutcome { step: step.into(), status });
    }

    /// Status of the last executed step only. Earlier failures do not count
    pub fn exit_code(&self) -> i32 {
        self.outcomes.last().map(|o| o.status.exit_code()).unwrap_or(0)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failure()).count()
    }
}
