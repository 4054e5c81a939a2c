//! Deep merge algorithm for layered config values.
//!
//! Every source is folded onto the accumulated result in precedence order.
//!
//! # Merge Rules
//!
//! - Mappings are merged key-wise, recursively
//! - Sequences are replaced entirely (networks, synced folders, ...)
//! - Null values in the overlay delete the corresponding key from the base
//! - Scalars in the overlay replace whatever the base held

use serde_yaml::{Mapping, Value};

/// Deep merge two YAML values; `overlay` wins at every point of conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    result.remove(key);
                } else if let Some(base_value) = base_map.get(key) {
                    result.insert(key.clone(), deep_merge(base_value, overlay_value));
                } else {
                    result.insert(key.clone(), overlay_value.clone());
                }
            }

            Value::Mapping(result)
        }

        // A missing layer leaves the base untouched
        (base, Value::Null) => base.clone(),

        (_, overlay) => overlay.clone(),
    }
}

/// Merge layers in order (later overrides earlier).
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a Value>) -> Value {
    layers
        .into_iter()
        .fold(Value::Mapping(Mapping::new()), |acc, layer| {
            deep_merge(&acc, layer)
        })
}

/// Copy of `value` with every null mapping entry removed.
///
/// Nulls are merge directives, not data, so they are dropped before a
/// single source is checked against the schema.
pub fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.iter().map(strip_nulls).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn overlay_wins_on_conflicting_scalars() {
        let base = yaml("ssh:\n  port: 2222\n  username: hangar\n");
        let overlay = yaml("ssh:\n  port: 100\n");

        let result = deep_merge(&base, &overlay);

        assert_eq!(result["ssh"]["port"], 100);
        assert_eq!(result["ssh"]["username"], "hangar");
    }

    #[test]
    fn sequences_are_replaced_not_merged() {
        let base = yaml(
            r#"
vm:
  networks:
    - { type: forwarded_port, guest: 80, host: 8080 }
    - { type: private_network, ip: 10.0.0.2 }
"#,
        );
        let overlay = yaml(
            r#"
vm:
  networks:
    - { type: forwarded_port, guest: 443, host: 8443 }
"#,
        );

        let result = deep_merge(&base, &overlay);
        let networks = result["vm"]["networks"].as_sequence().unwrap();

        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0]["guest"], 443);
    }

    #[test]
    fn null_removes_inherited_value() {
        let base = yaml("vm:\n  box: base\n  hostname: web\n");
        let overlay = yaml("vm:\n  box: null\n");

        let result = deep_merge(&base, &overlay);

        assert!(result["vm"].get("box").is_none());
        assert_eq!(result["vm"]["hostname"], "web");
    }

    #[test]
    fn null_overlay_document_keeps_base() {
        let base = yaml("vm:\n  box: base\n");
        let result = deep_merge(&base, &Value::Null);
        assert_eq!(result, base);
    }

    #[test]
    fn provider_sections_merge_key_wise() {
        let base = yaml("providers:\n  virtualbox:\n    memory: 512\n    cpus: 1\n");
        let overlay = yaml("providers:\n  virtualbox:\n    memory: 2048\n  docker:\n    image: x\n");

        let result = deep_merge(&base, &overlay);

        assert_eq!(result["providers"]["virtualbox"]["memory"], 2048);
        assert_eq!(result["providers"]["virtualbox"]["cpus"], 1);
        assert_eq!(result["providers"]["docker"]["image"], "x");
    }

    #[test]
    fn scalar_overlay_replaces_mapping_base() {
        let base = yaml("providers:\n  virtualbox:\n    memory: 512\n");
        let overlay = yaml("providers:\n  virtualbox: off\n");

        let result = deep_merge(&base, &overlay);
        assert_eq!(result["providers"]["virtualbox"], "off");
    }

    #[test]
    fn merge_layers_applies_in_order() {
        let layers = [yaml("a: 1\nb: 2"), yaml("b: 3\nc: 4"), yaml("c: 5")];

        let result = merge_layers(&layers);

        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 3);
        assert_eq!(result["c"], 5);
    }

    #[test]
    fn merge_no_layers_returns_empty_mapping() {
        let result = merge_layers(&[]);
        assert!(result.as_mapping().unwrap().is_empty());
    }

    #[test]
    fn strip_nulls_removes_nested_nulls() {
        let value = yaml("vm:\n  box: null\n  hostname: web\nssh: null\n");
        let stripped = strip_nulls(&value);

        assert!(stripped.get("ssh").is_none());
        assert!(stripped["vm"].get("box").is_none());
        assert_eq!(stripped["vm"]["hostname"], "web");
    }
}
