use crate::{LifecycleState, SolveParams};

/// Display-side description of the submitted (or server-echoed) parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsSummary {
    pub input: String,
    pub input_chars: usize,
    pub parallel_mode: bool,
    pub min_chars: u32,
    pub regex: String,
}

impl ParamsSummary {
    pub fn from_params(params: &SolveParams) -> Self {
        Self {
            input: params.input.clone(),
            input_chars: params.input.chars().count(),
            parallel_mode: params.parallel_mode,
            min_chars: params.min_chars,
            regex: params.regex.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerViewModel {
    pub lifecycle: LifecycleState,
    pub operation_id: Option<String>,
    pub summary: Option<ParamsSummary>,
    pub percent_done: Option<f64>,
    pub total: Option<u64>,
    pub elapsed_ms: Option<u64>,
    pub solutions: Vec<String>,
    pub last_error: Option<String>,
    pub timer_running: bool,
    pub poll_in_flight: bool,
    pub polls_issued: u64,
    pub dirty: bool,
}
