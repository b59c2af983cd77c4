use super::{
    registry::ParamRegistry,
    value::{ParamDef, ParamOptions},
};

/// Transition progress shared by every shader, `0.0` to `1.0`
pub const PROGRESS: &str = "uProgress";

/// Defines the built-in parameters followed by any extra definitions
///
/// Extra definitions that clash with an existing name are skipped.
pub fn define_defaults(registry: &mut ParamRegistry, extra: &[ParamDef]) {
    let _ = registry.define(PROGRESS, 0.0, ParamOptions::range(0.0, 1.0, 0.01));
    for def in extra {
        let _ = registry.define(&def.name, def.default.clone(), def.options.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn progress_is_defined_first() {
        let mut registry = ParamRegistry::new();
        define_defaults(
            &mut registry,
            &[
                ParamDef {
                    name: "uIntensity".into(),
                    default: ParamValue::Number(1.0),
                    options: ParamOptions::range(0.0, 2.0, 0.1),
                },
                ParamDef {
                    name: PROGRESS.into(),
                    default: ParamValue::Number(0.5),
                    options: ParamOptions::default(),
                },
            ],
        );

        let names: Vec<_> = registry.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec![PROGRESS, "uIntensity"]);
        assert_eq!(registry.get(PROGRESS), Some(&ParamValue::Number(0.0)));
        assert_eq!(registry.definition(PROGRESS).and_then(|p| p.options.max), Some(1.0));
    }
}
