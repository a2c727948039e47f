//! Total helpers for reading effect parameters out of a JSON object.
//!
//! Each helper takes the params value, a key, and a default. A missing key or
//! a value of the wrong type yields the default, so effects can always be
//! built from whatever configuration they are handed.

use std::time::Duration;

use serde_json::Value;

use crate::color::Rgba;

/// Reads a non-negative integer as `usize`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Reads a non-negative integer as `u64`.
pub fn param_u64(params: &Value, name: &str, default: u64) -> u64 {
    params.get(name).and_then(Value::as_u64).unwrap_or(default)
}

/// Reads a hex color string (`"#rrggbb"` or `"#rrggbbaa"`).
///
/// Unparseable strings fall back to `default` like any other wrong value.
pub fn param_color(params: &Value, name: &str, default: Rgba) -> Rgba {
    params
        .get(name)
        .and_then(Value::as_str)
        .and_then(|s| Rgba::from_hex(s).ok())
        .unwrap_or(default)
}

/// Reads a whole number of milliseconds.
pub fn param_millis(params: &Value, name: &str, default: Duration) -> Duration {
    params
        .get(name)
        .and_then(Value::as_u64)
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_usize_reads_count() {
        assert_eq!(param_usize(&json!({"count": 12}), "count", 0), 12);
    }

    #[test]
    fn param_usize_rejects_negative_and_float() {
        assert_eq!(param_usize(&json!({"count": -1}), "count", 4), 4);
        assert_eq!(param_usize(&json!({"count": 2.5}), "count", 4), 4);
    }

    #[test]
    fn param_u64_reads_large_seed() {
        let params = json!({"seed": u64::MAX});
        assert_eq!(param_u64(&params, "seed", 0), u64::MAX);
    }

    #[test]
    fn param_color_parses_hex() {
        let params = json!({"color": "#ff000080"});
        assert_eq!(
            param_color(&params, "color", Rgba::WHITE),
            Rgba::new(255, 0, 0, 128)
        );
    }

    #[test]
    fn param_color_defaults_on_bad_hex() {
        let params = json!({"color": "red"});
        assert_eq!(param_color(&params, "color", Rgba::WHITE), Rgba::WHITE);
        let params = json!({"color": 255});
        assert_eq!(param_color(&params, "color", Rgba::BLACK), Rgba::BLACK);
    }

    #[test]
    fn param_millis_reads_duration() {
        let params = json!({"period": 2500});
        assert_eq!(
            param_millis(&params, "period", Duration::ZERO),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn param_millis_defaults_on_negative() {
        let params = json!({"period": -10});
        assert_eq!(
            param_millis(&params, "period", Duration::from_secs(1)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn helpers_tolerate_non_object_params() {
        let params = json!([1, 2, 3]);
        assert_eq!(param_usize(&params, "count", 7), 7);
        assert_eq!(param_color(&params, "color", Rgba::WHITE), Rgba::WHITE);
    }
}
