//! Endpoint eligibility predicate.
//!
//! Pure name-set matching; parameter values are never inspected.

use std::collections::HashSet;

use crate::endpoint::Parameters;

/// Whether an endpoint can service a request.
///
/// True if the request carries no parameters, or every requested parameter
/// name is among the endpoint's supported names. Evaluated once per
/// (endpoint, request) pair at dispatch time.
///
/// Note the asymmetry with the empty-request rule: an endpoint with an empty
/// supported set matches only the empty request.
pub fn matches(supported: &HashSet<String>, parameters: &Parameters) -> bool {
    parameters.is_empty() || parameters.keys().all(|name| supported.contains(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn request(keys: &[&str]) -> Parameters {
        keys.iter().map(|k| (k.to_string(), json!(1))).collect()
    }

    #[test]
    fn test_empty_request_matches_everything() {
        assert!(matches(&names(&["x", "y"]), &request(&[])));
        assert!(matches(&names(&[]), &request(&[])));
    }

    #[test]
    fn test_subset_of_supported_matches() {
        assert!(matches(&names(&["x", "y"]), &request(&["x"])));
        assert!(matches(&names(&["x", "y"]), &request(&["x", "y"])));
    }

    #[test]
    fn test_unsupported_name_excludes() {
        assert!(!matches(&names(&["x"]), &request(&["y"])));
        assert!(!matches(&names(&["x"]), &request(&["x", "y"])));
    }

    #[test]
    fn test_empty_supported_set_matches_only_empty_request() {
        assert!(matches(&names(&[]), &request(&[])));
        assert!(!matches(&names(&[]), &request(&["x"])));
    }
}
