#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStage {
    ValidatingConfig,
    BuildingGrid,
    Simulating,
    Completed,
}

impl SweepStage {
    pub fn label(&self) -> &'static str {
        match self {
            SweepStage::ValidatingConfig => "validating",
            SweepStage::BuildingGrid => "building grid",
            SweepStage::Simulating => "simulating",
            SweepStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepProgressEvent {
    pub stage: SweepStage,
    /// Pairs finished so far (successful or failed).
    pub completed: usize,
    pub total: usize,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl SweepProgressEvent {
    pub fn stage(
        stage: SweepStage,
        completed: usize,
        total: usize,
        elapsed_wall_s: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            stage,
            completed,
            total,
            elapsed_wall_s,
            message,
        }
    }

    pub fn fraction_complete(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}
