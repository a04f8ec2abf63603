//! Key-with-default lookups into raw config mappings

use serde_json::{Map, Value};

/// Value under `name`, or `default` when the key is absent
///
/// A key that is present with a `null` value returns `null`.
#[must_use]
pub fn get_scalar_param(params: &Map<String, Value>, name: &str, default: Value) -> Value {
    params.get(name).cloned().unwrap_or(default)
}

/// List under `name`, or `default` when the key is absent
///
/// A present value that is not a list is returned as-is, like the scalar lookup.
#[must_use]
pub fn get_list_param(params: &Map<String, Value>, name: &str, default: Vec<Value>) -> Value {
    params
        .get(name)
        .cloned()
        .unwrap_or(Value::Array(default))
}

/// Mapping under `name`, or `default` when the key is absent
#[must_use]
pub fn get_dict_param(
    params: &Map<String, Value>,
    name: &str,
    default: Map<String, Value>,
) -> Value {
    params
        .get(name)
        .cloned()
        .unwrap_or(Value::Object(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> Map<String, Value> {
        match json!({"steps": 10, "betas": [0.9, 0.999], "offload": {"device": "cpu"}, "seed": null}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn scalar_present_and_absent() {
        let params = params();
        assert_eq!(get_scalar_param(&params, "steps", json!(1)), json!(10));
        assert_eq!(get_scalar_param(&params, "epochs", json!(1)), json!(1));
        assert_eq!(get_scalar_param(&params, "seed", json!(42)), Value::Null);
    }

    #[test]
    fn list_present_and_absent() {
        let params = params();
        assert_eq!(get_list_param(&params, "betas", vec![]), json!([0.9, 0.999]));
        assert_eq!(
            get_list_param(&params, "eps", vec![json!(1e-8)]),
            json!([1e-8])
        );
    }

    #[test]
    fn dict_present_and_absent() {
        let params = params();
        assert_eq!(
            get_dict_param(&params, "offload", Map::new()),
            json!({"device": "cpu"})
        );
        assert_eq!(get_dict_param(&params, "zero", Map::new()), json!({}));
    }
}
