//! Engine configuration and validation

use crate::error::GraphError;
use serde::{Deserialize, Serialize};

/// Weights for the impact score, combined as
/// `wD * direct + wI * indirect + wB * breaking` and then normalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImpactWeights {
    pub direct: f32,
    pub indirect: f32,
    pub breaking: f32,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        ImpactWeights {
            direct: 1.0,
            indirect: 0.5,
            breaking: 2.0,
        }
    }
}

/// Construction-time knobs for the engine. Validated once at startup;
/// invalid bounds are fatal rather than clamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// BFS bound for single-project impact analysis and dependency views.
    pub max_analysis_depth: usize,
    /// BFS bound for cross-project cascading impact.
    pub max_propagation_depth: usize,
    /// Chunk size for batch ingestion; the ingest loop yields between chunks.
    pub batch_processing_size: usize,
    /// Traversals check their deadline every this many visited nodes.
    pub deadline_check_interval: usize,
    /// Ceiling for the effort-hours heuristic.
    pub max_effort_hours: f32,
    pub impact_weights: ImpactWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_analysis_depth: 10,
            max_propagation_depth: 20,
            batch_processing_size: 50,
            deadline_check_interval: 64,
            max_effort_hours: 400.0,
            impact_weights: ImpactWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations the traversal bounds cannot work with.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.max_analysis_depth == 0 {
            return Err(GraphError::InvalidConfig(
                "max_analysis_depth must be positive".into(),
            ));
        }
        if self.max_propagation_depth == 0 {
            return Err(GraphError::InvalidConfig(
                "max_propagation_depth must be positive".into(),
            ));
        }
        if self.batch_processing_size == 0 {
            return Err(GraphError::InvalidConfig(
                "batch_processing_size must be positive".into(),
            ));
        }
        if self.deadline_check_interval == 0 {
            return Err(GraphError::InvalidConfig(
                "deadline_check_interval must be positive".into(),
            ));
        }
        if self.max_effort_hours <= 0.0 {
            return Err(GraphError::InvalidConfig(
                "max_effort_hours must be positive".into(),
            ));
        }
        Ok(())
    }
}
