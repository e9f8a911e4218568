//! Canonical configuration templates and the placeholder substitution used
//! to specialize them.
//!
//! Templates are JSON documents with `{{ key }}` placeholders. Callers fetch
//! a template, resolve its placeholders with [`resolve_placeholders`], and
//! compare resulting documents structurally with [`semantically_equal`]
//! (whitespace and key order never matter).

use std::collections::HashMap;

use serde_json::Value;

/// Top-level engine bootstrap template.
pub fn config_template() -> &'static str {
    r#"{
  "node": {
    "id": "aqueduct",
    "metadata": {
      "app_id": "{{ app_id }}",
      "app_version": "{{ app_version }}"
    }
  },
  "connect_timeout": "{{ connect_timeout_seconds }}s",
  "dns": {
    "refresh_rate": "{{ dns_refresh_seconds }}s",
    "min_refresh_rate": "{{ dns_min_refresh_seconds }}s",
    "query_timeout": "{{ dns_query_timeout_seconds }}s",
    "failure_refresh_rate": {
      "base_interval": "{{ dns_failure_refresh_seconds_base }}s",
      "max_interval": "{{ dns_failure_refresh_seconds_max }}s"
    }
  },
  "stats_flush_interval": "{{ stats_flush_seconds }}s",
  "stream_idle_timeout": "{{ stream_idle_timeout_seconds }}s",
  "per_try_idle_timeout": "{{ per_try_idle_timeout_seconds }}s",
  "filters": "{{ filter_chain }}"
}"#
}

/// Entry inserted into the chain for each platform-registered filter.
pub fn platform_filter_template() -> &'static str {
    r#"{
  "name": "{{ filter_name }}",
  "typed_config": {
    "type": "platform_bridge",
    "platform_filter_name": "{{ filter_name }}"
  }
}"#
}

/// Entry inserted into the chain for a natively-configured filter.
pub fn native_filter_template() -> &'static str {
    r#"{
  "name": "{{ filter_name }}",
  "typed_config": "{{ filter_config }}"
}"#
}

/// Filter insert that persists alternate-protocol (HTTP/3) discoveries.
pub fn alt_protocol_cache_filter_insert() -> &'static str {
    r#"{
  "name": "alternate_protocols_cache",
  "typed_config": {
    "alternate_protocols_cache_options": {
      "name": "default_alternate_protocols_cache"
    }
  }
}"#
}

/// Filter insert enabling gzip response decompression.
pub fn gzip_config_insert() -> &'static str {
    r#"{
  "name": "decompressor_gzip",
  "typed_config": {
    "decompressor_library": { "name": "gzip" },
    "request_direction_config": { "common_config": { "enabled": { "default_value": false } } },
    "response_direction_config": { "common_config": { "enabled": { "default_value": true } } }
  }
}"#
}

/// Filter insert enabling brotli response decompression.
pub fn brotli_config_insert() -> &'static str {
    r#"{
  "name": "decompressor_brotli",
  "typed_config": {
    "decompressor_library": { "name": "brotli" },
    "request_direction_config": { "common_config": { "enabled": { "default_value": false } } },
    "response_direction_config": { "common_config": { "enabled": { "default_value": true } } }
  }
}"#
}

/// DNS cache persistence config, keyed to the registered key-value store.
pub fn persistent_dns_cache_config_insert() -> &'static str {
    r#"{
  "key_value_config": {
    "name": "dns_persistent_cache",
    "config": {
      "save_interval": "{{ dns_cache_save_interval_seconds }}s"
    }
  }
}"#
}

/// Filter insert applying socket tags from request headers.
pub fn socket_tag_config_insert() -> &'static str {
    r#"{
  "name": "socket_tag",
  "typed_config": { "type": "socket_tag" }
}"#
}

/// Certificate validation context. With `use_platform` the chain is handed
/// to the host platform's verifier instead of the built-in one.
pub fn cert_validation_template(use_platform: bool) -> &'static str {
    if use_platform {
        r#"{
  "custom_validator_config": {
    "name": "platform_cert_validator"
  }
}"#
    } else {
        r#"{
  "trusted_ca": { "filename": "{{ ca_bundle_path }}" }
}"#
    }
}

/// Replaces every `{{ key }}` placeholder in `template` with its value from
/// `values`. Placeholders without a value are left untouched so that a later
/// pass (or a comparison failure) makes the omission visible.
pub fn resolve_placeholders(template: &str, values: &HashMap<String, String>) -> String {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        let (head, tail) = rest.split_at(open);
        resolved.push_str(head);
        match tail.find("}}") {
            Some(close) => {
                let key = tail[2..close].trim();
                match values.get(key) {
                    Some(value) => resolved.push_str(value),
                    None => resolved.push_str(&tail[..close + 2]),
                }
                rest = &tail[close + 2..];
            }
            None => {
                resolved.push_str(tail);
                rest = "";
            }
        }
    }
    resolved.push_str(rest);
    resolved
}

/// Structural equality of two JSON documents. Formatting and object key
/// order are irrelevant; a parse failure on either side is unequal.
pub fn semantically_equal(a: &str, b: &str) -> bool {
    match (
        serde_json::from_str::<Value>(a),
        serde_json::from_str::<Value>(b),
    ) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn placeholders_resolve_with_arbitrary_spacing() {
        let out = resolve_placeholders(
            "{{a}} {{ a }} {{  a  }}",
            &values(&[("a", "x")]),
        );
        assert_eq!(out, "x x x");
    }

    #[test]
    fn unknown_placeholders_are_left_intact() {
        let out = resolve_placeholders("{{ known }}/{{ unknown }}", &values(&[("known", "v")]));
        assert_eq!(out, "v/{{ unknown }}");
    }

    #[test]
    fn platform_filter_template_resolves_to_valid_json() {
        let out = resolve_placeholders(
            platform_filter_template(),
            &values(&[("filter_name", "test_filter")]),
        );
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["name"], "test_filter");
        assert_eq!(parsed["typed_config"]["platform_filter_name"], "test_filter");
    }

    #[test]
    fn semantic_equality_ignores_key_order_and_whitespace() {
        assert!(semantically_equal(
            r#"{"a": 1, "b": [1, 2]}"#,
            "{ \"b\": [1, 2],\n  \"a\": 1 }"
        ));
        assert!(!semantically_equal(r#"{"a": 1}"#, r#"{"a": 2}"#));
        assert!(!semantically_equal("not json", "{}"));
    }

    #[test]
    fn compression_inserts_are_valid_json() {
        for insert in [
            gzip_config_insert(),
            brotli_config_insert(),
            alt_protocol_cache_filter_insert(),
            socket_tag_config_insert(),
            cert_validation_template(true),
        ] {
            serde_json::from_str::<Value>(insert).unwrap();
        }
    }
}
