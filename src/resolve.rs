use crate::error::{QueryError, Result};
use crate::models::{ResolvedColumnPlan, VariableSpec};
use crate::topics::TopicRegistry;

/// Turn requested topics and raw codes into the column plan.
///
/// Topics expand in request order (`all` expands to every topic in catalog
/// order), raw codes follow with their code as label, and the result keeps
/// only the first occurrence of each code.
pub fn resolve_variables<S: AsRef<str>>(
    registry: &TopicRegistry,
    topics: &[S],
    raw_codes: &[S],
) -> Result<ResolvedColumnPlan> {
    let raw_codes: Vec<&str> = raw_codes
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .collect();
    if topics.is_empty() && raw_codes.is_empty() {
        return Err(QueryError::NoSelection);
    }

    let mut specs: Vec<VariableSpec> = Vec::new();
    for name in topics {
        specs.extend(registry.lookup(name.as_ref().trim())?);
    }
    specs.extend(raw_codes.into_iter().map(VariableSpec::raw));

    Ok(ResolvedColumnPlan::from_specs(specs))
}
