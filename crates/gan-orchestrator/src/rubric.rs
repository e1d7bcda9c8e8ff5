//! Default audit rubric: ordered dimensions, each with a name and a
//! weight in (0,1]. A reasonable, fixed default a caller may override by
//! constructing its own `AuditRequest` rubric directly.

use gan_core::RubricDimension;

pub fn default_rubric() -> Vec<RubricDimension> {
    vec![
        RubricDimension {
            name: "correctness".to_string(),
            weight: 0.4,
            description: Some("Does the candidate do what it claims, with no regressions?".to_string()),
        },
        RubricDimension {
            name: "maintainability".to_string(),
            weight: 0.25,
            description: Some("Is the change easy to read, extend, and reason about?".to_string()),
        },
        RubricDimension {
            name: "test_coverage".to_string(),
            weight: 0.2,
            description: Some("Are the behaviors this change touches exercised by tests?".to_string()),
        },
        RubricDimension {
            name: "security".to_string(),
            weight: 0.15,
            description: Some("Does the change avoid introducing exploitable weaknesses?".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rubric_weights_in_range() {
        for dim in default_rubric() {
            assert!(dim.weight > 0.0 && dim.weight <= 1.0);
        }
    }

    #[test]
    fn test_default_rubric_names_unique() {
        let rubric = default_rubric();
        let mut names: Vec<_> = rubric.iter().map(|d| d.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), rubric.len());
    }
}
