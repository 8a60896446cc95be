//! Node name, namespace and topic name validation and expansion.
//!
//! Rules follow the usual ROS naming conventions: tokens are made of
//! alphanumerics and underscores and may not start with a digit, fully
//! qualified names start with `/`, and relative topic names are resolved
//! against the node namespace. `~` expands to the node's own fully qualified
//! name and `{node}` / `{ns}` / `{namespace}` are substituted.

use crate::error::{UrosError, UrosResult};
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_NODE_NAME_LEN: usize = 255;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static FULLY_QUALIFIED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/[A-Za-z_][A-Za-z0-9_]*)+$").unwrap());

pub fn validate_node_name(name: &str) -> UrosResult<()> {
    let invalid = |reason: &str| UrosError::NodeInvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_NODE_NAME_LEN {
        return Err(invalid("name is too long"));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("name starts with a digit"));
    }
    if !TOKEN.is_match(name) {
        return Err(invalid("only alphanumerics and '_' are allowed"));
    }
    Ok(())
}

/// Turn a user supplied namespace into its absolute form (`""` becomes `/`)
pub fn normalize_namespace(namespace: &str) -> UrosResult<String> {
    if namespace.is_empty() || namespace == "/" {
        return Ok("/".to_string());
    }

    let absolute = if namespace.starts_with('/') {
        namespace.to_string()
    } else {
        format!("/{}", namespace)
    };

    if absolute.ends_with('/') {
        return Err(UrosError::NodeInvalidNamespace {
            namespace: namespace.to_string(),
            reason: "namespace ends with '/'".to_string(),
        });
    }
    if !FULLY_QUALIFIED.is_match(&absolute) {
        return Err(UrosError::NodeInvalidNamespace {
            namespace: namespace.to_string(),
            reason: describe_invalid(&absolute),
        });
    }
    Ok(absolute)
}

/// Fully qualified name of a node, e.g. `/robot/driver`
pub fn node_fqn(node_name: &str, namespace: &str) -> String {
    if namespace == "/" {
        format!("/{}", node_name)
    } else {
        format!("{}/{}", namespace, node_name)
    }
}

/// Expand `topic` into a fully qualified topic name for a node.
///
/// `namespace` must already be normalized.
pub fn expand_topic_name(topic: &str, node_name: &str, namespace: &str) -> UrosResult<String> {
    let invalid = |reason: String| UrosError::TopicNameInvalid {
        name: topic.to_string(),
        reason,
    };

    if topic.is_empty() {
        return Err(invalid("topic name is empty".to_string()));
    }

    let mut expanded = if let Some(rest) = topic.strip_prefix('~') {
        if !rest.is_empty() && !rest.starts_with('/') {
            return Err(invalid("'~' must be followed by '/'".to_string()));
        }
        format!("{}{}", node_fqn(node_name, namespace), rest)
    } else if topic.contains('~') {
        return Err(invalid("'~' is only allowed at the start".to_string()));
    } else {
        topic.to_string()
    };

    let ns_value = if namespace == "/" { "" } else { namespace };
    expanded = expanded
        .replace("{node}", node_name)
        .replace("{namespace}", ns_value)
        .replace("{ns}", ns_value);

    if expanded.contains('{') || expanded.contains('}') {
        return Err(invalid("unknown substitution".to_string()));
    }

    if !expanded.starts_with('/') {
        expanded = if namespace == "/" {
            format!("/{}", expanded)
        } else {
            format!("{}/{}", namespace, expanded)
        };
    }

    if !FULLY_QUALIFIED.is_match(&expanded) {
        return Err(invalid(describe_invalid(&expanded)));
    }
    Ok(expanded)
}

fn describe_invalid(name: &str) -> String {
    if name.contains("//") {
        "contains repeated '/'".to_string()
    } else if name.len() > 1 && name.ends_with('/') {
        "ends with '/'".to_string()
    } else if name
        .split('/')
        .any(|token| token.starts_with(|c: char| c.is_ascii_digit()))
    {
        "a token starts with a digit".to_string()
    } else {
        "only alphanumerics, '_' and '/' are allowed".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_names() {
        assert!(validate_node_name("freertos_int32_publisher").is_ok());
        assert!(validate_node_name("_hidden").is_ok());
        assert!(validate_node_name("").is_err());
        assert!(validate_node_name("9lives").is_err());
        assert!(validate_node_name("with-dash").is_err());
        assert!(validate_node_name("a/b").is_err());
    }

    #[test]
    fn namespaces() {
        assert_eq!(normalize_namespace("").unwrap(), "/");
        assert_eq!(normalize_namespace("/").unwrap(), "/");
        assert_eq!(normalize_namespace("robot").unwrap(), "/robot");
        assert_eq!(normalize_namespace("/robot/arm").unwrap(), "/robot/arm");
        assert!(normalize_namespace("/robot/").is_err());
        assert!(normalize_namespace("/1robot").is_err());
    }

    #[test]
    fn relative_topics_resolve_against_namespace() {
        assert_eq!(
            expand_topic_name("freertos_int32_publisher", "node", "/").unwrap(),
            "/freertos_int32_publisher"
        );
        assert_eq!(
            expand_topic_name("chatter", "node", "/robot").unwrap(),
            "/robot/chatter"
        );
        assert_eq!(
            expand_topic_name("/microROS/int32_subscriber", "node", "/robot").unwrap(),
            "/microROS/int32_subscriber"
        );
    }

    #[test]
    fn private_and_substituted_topics() {
        assert_eq!(expand_topic_name("~", "talker", "/").unwrap(), "/talker");
        assert_eq!(
            expand_topic_name("~/status", "talker", "/robot").unwrap(),
            "/robot/talker/status"
        );
        assert_eq!(
            expand_topic_name("{node}/out", "talker", "/").unwrap(),
            "/talker/out"
        );
        assert_eq!(
            expand_topic_name("{ns}/out", "talker", "/robot").unwrap(),
            "/robot/out"
        );
    }

    #[test]
    fn invalid_topics() {
        let err = expand_topic_name("", "n", "/").unwrap_err();
        assert_eq!(err.code(), 103);

        for bad in ["a//b", "a/", "1abc", "a b", "~x", "a~", "{unknown}"] {
            assert!(
                expand_topic_name(bad, "n", "/").is_err(),
                "'{}' should be rejected",
                bad
            );
        }
    }
}
