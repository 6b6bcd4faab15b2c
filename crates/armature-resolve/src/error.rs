use armature_core::{ModelError, TargetId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Target `{target}` depends on unknown target `{dependency}`")]
    UnknownDependency {
        target: TargetId,
        dependency: TargetId,
    },

    #[error("Target `{target}` declares unknown test host `{host}`")]
    UnknownTestHost { target: TargetId, host: TargetId },

    #[error("Dependency cycle detected: {}", cycle_display(.0))]
    DependencyCycle(Vec<TargetId>),

    #[error("Resource bundle `{bundle}` of target `{target}` has no product")]
    UnknownResourceBundle { target: TargetId, bundle: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn cycle_display(cycle: &[TargetId]) -> String {
    let mut ids: Vec<&str> = cycle.iter().map(TargetId::as_str).collect();
    if let Some(first) = ids.first().copied() {
        ids.push(first);
    }
    ids.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_closes_the_loop() {
        let err = ResolveError::DependencyCycle(vec![
            TargetId::from("A"),
            TargetId::from("B"),
            TargetId::from("C"),
        ]);
        assert_eq!(
            err.to_string(),
            "Dependency cycle detected: A -> B -> C -> A"
        );
    }
}
