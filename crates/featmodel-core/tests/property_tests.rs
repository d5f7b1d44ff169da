#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Property tests for diff reflexivity and assembly idempotence.

use std::collections::BTreeMap;

use featmodel_core::assembly::{assemble, BuilderContext, MapFeatureProvider};
use featmodel_core::diff::{diff, SectionFilter};
use featmodel_core::model::{
    structural_eq, ArtifactId, ConfigValue, Configuration, Extension, ExtensionKind, Feature,
    Include, Module,
};
use proptest::prelude::*;

fn artifact_id(name: &str, major: u64, minor: u64) -> ArtifactId {
    ArtifactId::new("org.prop", name, format!("{}.{}.0", major, minor), None, None).unwrap()
}

fn config_value() -> impl Strategy<Value = ConfigValue> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(ConfigValue::Bool),
        any::<i64>().prop_map(ConfigValue::Long),
        (-1.0e6..1.0e6f64).prop_map(ConfigValue::Double),
        "[a-z/]{0,8}".prop_map(ConfigValue::String),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(ConfigValue::Sequence),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(ConfigValue::Map),
        ]
    })
}

fn module() -> impl Strategy<Value = Module> {
    ("[a-e]", 0u64..3, 0u64..3, prop::option::of(0u32..40)).prop_map(
        |(name, major, minor, start_order)| {
            let module = Module::new(artifact_id(&name, major, minor));
            match start_order {
                Some(level) => module.with_metadata("start-order", level.to_string()),
                None => module,
            }
        },
    )
}

fn configuration() -> impl Strategy<Value = Configuration> {
    (
        "[a-c]\\.pid",
        prop::collection::btree_map("[a-z]{1,5}", config_value(), 0..4),
    )
        .prop_map(|(pid, properties)| {
            let mut cfg = Configuration::new(pid);
            cfg.properties = properties;
            cfg
        })
}

prop_compose! {
    fn feature(name: &'static str)(
        modules in prop::collection::vec(module(), 0..5),
        configurations in prop::collection::vec(configuration(), 0..3),
        properties in prop::collection::btree_map("[a-z.]{1,8}", "[a-z*,]{0,8}", 0..3),
        repoinit in prop::option::of("[a-z /]{0,16}"),
    ) -> Feature {
        let mut f = Feature::new(artifact_id(name, 1, 0));
        for m in modules {
            if !f.modules.contains_same(&m.id) {
                f.modules.add(m);
            }
        }
        for cfg in configurations {
            if f.configurations.get(&cfg.pid).is_none() {
                f.configurations.add(cfg);
            }
        }
        f.properties = properties;
        if let Some(text) = repoinit {
            f.extensions.add(Extension::text("repoinit", ExtensionKind::Optional, text));
        }
        f
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_structural_eq_is_reflexive(value in config_value()) {
        prop_assert!(structural_eq(&value, &value.clone()));
    }

    #[test]
    fn prop_diff_with_itself_is_empty(f in feature("self")) {
        let result = diff(&f, &f, SectionFilter::all()).unwrap();
        prop_assert!(result.is_empty());
        prop_assert!(result.descriptor.prototype.unwrap().removals.is_empty());
    }

    #[test]
    fn prop_assembly_is_idempotent(
        base in feature("base"),
        mut top in feature("top"),
        remove_properties in prop::collection::vec("[a-z.]{1,8}", 0..2),
    ) {
        top.includes.push(Include {
            id: base.id.clone(),
            removals: featmodel_core::model::Removals {
                properties: remove_properties,
                ..Default::default()
            },
        });
        let provider = MapFeatureProvider::new().with_feature(base);
        let context = BuilderContext::new(&provider);

        let once = assemble(&top, &context).unwrap();
        let twice = assemble(&once, &context).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.includes.is_empty());
    }

    #[test]
    fn prop_base_case_is_copy(f in feature("plain")) {
        let provider = MapFeatureProvider::new();
        let assembled = assemble(&f, &BuilderContext::new(&provider)).unwrap();
        let mut expected = f.clone();
        expected.assembled = true;
        prop_assert_eq!(assembled, expected);
    }

    #[test]
    fn prop_diff_descriptor_round_trips_properties(
        previous in feature("site"),
        current_properties in prop::collection::btree_map("[a-z.]{1,8}", "[a-z*,]{0,8}", 0..4),
    ) {
        let mut current = previous.clone();
        current.id = artifact_id("site", 2, 0);
        current.properties = current_properties;

        let result = diff(&previous, &current, SectionFilter::include(["framework-properties"]))
            .unwrap();
        let provider = MapFeatureProvider::new().with_feature(previous);
        let rebuilt = assemble(&result.descriptor, &BuilderContext::new(&provider)).unwrap();
        let expected: BTreeMap<String, String> = current.properties.clone();
        prop_assert_eq!(rebuilt.properties, expected);
    }
}
