use crate::domain::{DomainError, DomainResult};
use garde::{Report, Validate};

/// Validate a request, folding every garde violation into one `ValidationError`
pub fn validate_struct<T>(value: &T) -> DomainResult<()>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| DomainError::ValidationError(describe(&report)))
}

fn describe(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            let path = path.to_string();
            if path.is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
