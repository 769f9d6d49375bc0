//! Request builder - operation + argument map → concrete HTTP request shape
//!
//! The builder is pure: it never performs IO and fails only on configuration
//! problems (missing base URL, unparseable URL).

use std::collections::BTreeMap;

use serde_json::Value;
use url::Url;

use crate::plugins::{AuthDescriptor, HttpMethod, OperationDescriptor, PluginRecord};
use crate::{Error, Result};

/// Argument map for one invocation
pub type Arguments = serde_json::Map<String, Value>;

/// A fully assembled request, ready for the invoker
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL, query parameters included for GET
    pub url: Url,
    /// Headers derived from the auth descriptor
    pub headers: BTreeMap<String, String>,
    /// HTTP basic credentials, when the plugin uses basic auth
    pub basic_auth: Option<(String, String)>,
    /// JSON body for body-carrying methods; `None` when no arguments
    pub body: Option<Value>,
}

/// Build a concrete request for `operation` on `plugin` with `args`.
///
/// GET serializes every non-null argument as a query parameter; other
/// methods serialize the argument map as a single JSON object body (no body
/// when the map is empty). The base URL's trailing slash is stripped and the
/// path's leading slash enforced, so the joined URL is never double-slashed.
///
/// # Errors
///
/// Returns [`Error::Config`] when the plugin has no base URL or the joined
/// URL does not parse.
pub fn build_request(
    plugin: &PluginRecord,
    operation: &OperationDescriptor,
    args: &Arguments,
) -> Result<BuiltRequest> {
    let base_url = plugin
        .base_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Config(format!("plugin {} has no base URL", plugin.id)))?;

    let joined = join_url(base_url, &operation.path);
    let mut url = Url::parse(&joined)
        .map_err(|e| Error::Config(format!("invalid URL `{joined}`: {e}")))?;

    let body = if operation.method.carries_body() {
        if args.is_empty() {
            None
        } else {
            Some(Value::Object(args.clone()))
        }
    } else {
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in args {
                if value.is_null() {
                    continue;
                }
                pairs.append_pair(key, &render_query_value(value));
            }
        }
        // query_pairs_mut serializes an empty query as a bare `?`.
        if url.query() == Some("") {
            url.set_query(None);
        }
        None
    };

    let mut headers = BTreeMap::new();
    let mut basic_auth = None;
    match &plugin.auth {
        AuthDescriptor::None => {}
        AuthDescriptor::ApiKey { header, key } => {
            if !key.is_empty() {
                headers.insert(header.clone(), key.clone());
            }
        }
        AuthDescriptor::Bearer { token } => {
            if !token.is_empty() {
                headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            }
        }
        AuthDescriptor::Basic { username, password } => {
            basic_auth = Some((username.clone(), password.clone()));
        }
        AuthDescriptor::Custom {
            headers: custom_headers,
        } => {
            for (name, value) in custom_headers {
                headers.insert(name.clone(), value.clone());
            }
        }
    }

    Ok(BuiltRequest {
        method: operation.method,
        url,
        headers,
        basic_auth,
        body,
    })
}

/// Join a base URL and a path without doubling or dropping the separator
fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Render one argument as a query-parameter value
///
/// Scalars render as their plain string form; structured values as compact
/// JSON.
fn render_query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plugin_with(base_url: Option<&str>, auth: AuthDescriptor) -> PluginRecord {
        PluginRecord {
            id: "plugin_test".into(),
            name: "Test".into(),
            description: None,
            base_url: base_url.map(str::to_string),
            auth,
            enabled: true,
            operations: Vec::new(),
        }
    }

    fn operation(method: HttpMethod, path: &str) -> OperationDescriptor {
        OperationDescriptor {
            operation_id: "op".into(),
            name: None,
            method,
            path: path.into(),
            description: None,
            input_schema: None,
            output_schema: None,
        }
    }

    fn args(pairs: &[(&str, Value)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn url_join_never_double_slashes() {
        let cases = [
            ("http://host/api", "/sensor"),
            ("http://host/api/", "/sensor"),
            ("http://host/api", "sensor"),
            ("http://host/api/", "sensor"),
        ];
        for (base, path) in cases {
            let plugin = plugin_with(Some(base), AuthDescriptor::None);
            let op = operation(HttpMethod::Get, path);
            let built = build_request(&plugin, &op, &Arguments::new()).unwrap();
            assert_eq!(built.url.as_str(), "http://host/api/sensor");
        }
    }

    #[test]
    fn get_arguments_become_query_parameters() {
        let plugin = plugin_with(Some("http://host"), AuthDescriptor::None);
        let op = operation(HttpMethod::Get, "/data");
        let built = build_request(
            &plugin,
            &op,
            &args(&[("a", json!("1")), ("b", json!("2"))]),
        )
        .unwrap();

        let query = built.url.query().unwrap();
        assert!(query.contains("a=1"));
        assert!(query.contains("b=2"));
        assert!(built.body.is_none());
    }

    #[test]
    fn get_without_arguments_has_no_query_marker() {
        let plugin = plugin_with(Some("http://host/api"), AuthDescriptor::None);
        let op = operation(HttpMethod::Get, "/sensor");

        let built = build_request(&plugin, &op, &Arguments::new()).unwrap();
        assert_eq!(built.url.as_str(), "http://host/api/sensor");
        assert_eq!(built.url.query(), None);

        // All-null arguments serialize nothing and must not leave a `?`.
        let built =
            build_request(&plugin, &op, &args(&[("a", Value::Null), ("b", Value::Null)])).unwrap();
        assert_eq!(built.url.as_str(), "http://host/api/sensor");
        assert_eq!(built.url.query(), None);
    }

    #[test]
    fn get_skips_null_arguments() {
        let plugin = plugin_with(Some("http://host"), AuthDescriptor::None);
        let op = operation(HttpMethod::Get, "/data");
        let built =
            build_request(&plugin, &op, &args(&[("a", json!("1")), ("b", Value::Null)])).unwrap();
        assert_eq!(built.url.query(), Some("a=1"));
    }

    #[test]
    fn get_renders_scalars_plainly() {
        let plugin = plugin_with(Some("http://host"), AuthDescriptor::None);
        let op = operation(HttpMethod::Get, "/data");
        let built = build_request(
            &plugin,
            &op,
            &args(&[("port", json!(2)), ("on", json!(true))]),
        )
        .unwrap();
        let query = built.url.query().unwrap();
        assert!(query.contains("port=2"));
        assert!(query.contains("on=true"));
    }

    #[test]
    fn post_arguments_become_json_body() {
        let plugin = plugin_with(Some("http://host"), AuthDescriptor::None);
        let op = operation(HttpMethod::Post, "/data");
        let built = build_request(
            &plugin,
            &op,
            &args(&[("a", json!("1")), ("b", json!("2"))]),
        )
        .unwrap();

        assert!(built.url.query().is_none());
        assert_eq!(built.body, Some(json!({"a": "1", "b": "2"})));
    }

    #[test]
    fn post_without_arguments_has_no_body() {
        let plugin = plugin_with(Some("http://host"), AuthDescriptor::None);
        let op = operation(HttpMethod::Post, "/data");
        let built = build_request(&plugin, &op, &Arguments::new()).unwrap();
        assert!(built.body.is_none());
    }

    #[test]
    fn missing_base_url_is_a_configuration_error() {
        for base in [None, Some(""), Some("  ")] {
            let plugin = plugin_with(base, AuthDescriptor::None);
            let op = operation(HttpMethod::Get, "/data");
            let err = build_request(&plugin, &op, &Arguments::new()).unwrap_err();
            assert!(err.is_configuration(), "base {base:?} should be rejected");
        }
    }

    #[test]
    fn api_key_auth_sets_named_header() {
        let plugin = plugin_with(
            Some("http://host"),
            AuthDescriptor::ApiKey {
                header: "X-API-Key".into(),
                key: "k123".into(),
            },
        );
        let op = operation(HttpMethod::Get, "/data");
        let built = build_request(&plugin, &op, &Arguments::new()).unwrap();
        assert_eq!(built.headers.get("X-API-Key").map(String::as_str), Some("k123"));
    }

    #[test]
    fn bearer_auth_sets_authorization_header() {
        let plugin = plugin_with(
            Some("http://host"),
            AuthDescriptor::Bearer {
                token: "t0k".into(),
            },
        );
        let op = operation(HttpMethod::Get, "/data");
        let built = build_request(&plugin, &op, &Arguments::new()).unwrap();
        assert_eq!(
            built.headers.get("Authorization").map(String::as_str),
            Some("Bearer t0k")
        );
    }

    #[test]
    fn basic_auth_carries_credentials() {
        let plugin = plugin_with(
            Some("http://host"),
            AuthDescriptor::Basic {
                username: "u".into(),
                password: "p".into(),
            },
        );
        let op = operation(HttpMethod::Get, "/data");
        let built = build_request(&plugin, &op, &Arguments::new()).unwrap();
        assert_eq!(built.basic_auth, Some(("u".into(), "p".into())));
        assert!(built.headers.is_empty());
    }

    #[test]
    fn custom_auth_applies_header_map_verbatim() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Tenant".to_string(), "acme".to_string());
        headers.insert("X-Trace".to_string(), "1".to_string());
        let plugin = plugin_with(Some("http://host"), AuthDescriptor::Custom { headers });
        let op = operation(HttpMethod::Get, "/data");
        let built = build_request(&plugin, &op, &Arguments::new()).unwrap();
        assert_eq!(built.headers.len(), 2);
        assert_eq!(built.headers.get("X-Tenant").map(String::as_str), Some("acme"));
    }
}
