use thiserror::Error;

/// Error type for configuration and runtime failures.
///
/// Configuration variants are raised while a catchment is being built and abort
/// construction before any time step runs. At runtime the only failure is a
/// ponded-depth integration that does not converge, which terminates the run.
#[derive(Error, Debug)]
pub enum RunoffError {
    #[error("Undefined {kind} '{name}' referenced by '{referenced_by}'")]
    MissingObject {
        kind: String,
        name: String,
        referenced_by: String,
    },
    #[error("Invalid value for {field} of '{object}': {value}")]
    InvalidNumber {
        object: String,
        field: String,
        value: f64,
    },
    #[error("Percentage {field}={value} of '{object}' is outside the range [0, 100]")]
    PercentOutOfRange {
        object: String,
        field: String,
        value: f64,
    },
    #[error("Subcatchment '{0}' names both a node and a subcatchment as its outlet")]
    AmbiguousOutlet(String),
    #[error("LID area {lid_area} of subcatchment '{subcatchment}' exceeds its area {area}")]
    LidAreaExceedsArea {
        subcatchment: String,
        lid_area: f64,
        area: f64,
    },
    #[error("Could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Ponded depth integration failed over [{t_start}, {t_end}]: {reason}")]
    IntegrationFailed {
        t_start: f64,
        t_end: f64,
        reason: String,
    },
    #[error("Subcatchment '{name}': {source}")]
    Subcatchment {
        name: String,
        #[source]
        source: Box<RunoffError>,
    },
}

impl RunoffError {
    /// Attach the name of the subcatchment being processed to an error.
    pub fn in_subcatchment(self, name: &str) -> Self {
        RunoffError::Subcatchment {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

/// Convenience type for `Result<T, RunoffError>`.
pub type RunoffResult<T> = Result<T, RunoffError>;
