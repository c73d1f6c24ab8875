//! API endpoint resolution for generated clients.

use crate::config::ApiConfig;
use crate::error::{SyncError, SyncResult};

const HOSTED_CONTENT_HOST: &str = "content.contentsync.dev";

/// Resolve the endpoint the generated client talks to.
///
/// Precedence: an explicit override URL is used verbatim; a local port (dev
/// mode) points at the loopback endpoint; otherwise the hosted endpoint is
/// derived from branch + client id + token, and the error enumerates exactly
/// which of those are missing, in checked order.
pub fn resolve_api_url(api: &ApiConfig, local_port: Option<u16>) -> SyncResult<String> {
    if let Some(url) = &api.override_url {
        return Ok(url.clone());
    }

    if let Some(port) = local_port {
        return Ok(format!("http://localhost:{port}/graphql"));
    }

    let mut missing = Vec::new();
    if api.branch.is_none() {
        missing.push("branch");
    }
    if api.client_id.is_none() {
        missing.push("clientId");
    }
    if api.token.is_none() {
        missing.push("token");
    }
    if !missing.is_empty() {
        return Err(SyncError::Configuration { missing });
    }

    let branch = api.branch.as_deref().unwrap_or_default();
    let client_id = api.client_id.as_deref().unwrap_or_default();
    Ok(format!(
        "https://{HOSTED_CONTENT_HOST}/content/{client_id}/github/{branch}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_url_wins_verbatim() {
        let api = ApiConfig {
            override_url: Some("https://example.com/graphql?x=1".to_string()),
            ..ApiConfig::default()
        };
        // Even with a port supplied, the override is used as-is
        let url = resolve_api_url(&api, Some(4001)).unwrap();
        assert_eq!(url, "https://example.com/graphql?x=1");
    }

    #[test]
    fn local_port_points_at_loopback() {
        let url = resolve_api_url(&ApiConfig::default(), Some(4001)).unwrap();
        assert_eq!(url, "http://localhost:4001/graphql");
    }

    #[test]
    fn hosted_url_from_connection_parameters() {
        let api = ApiConfig {
            branch: Some("main".to_string()),
            client_id: Some("abc123".to_string()),
            token: Some("secret".to_string()),
            override_url: None,
        };
        let url = resolve_api_url(&api, None).unwrap();
        assert!(url.contains("/content/abc123/github/main"));
    }

    #[test]
    fn missing_fields_are_enumerated_in_order() {
        let api = ApiConfig {
            client_id: Some("abc123".to_string()),
            ..ApiConfig::default()
        };
        let err = resolve_api_url(&api, None).unwrap_err();
        match err {
            SyncError::Configuration { missing } => {
                assert_eq!(missing, vec!["branch", "token"]);
            }
            other => panic!("expected Configuration error, got {other}"),
        }
    }

    #[test]
    fn all_three_missing_lists_all_three() {
        let err = resolve_api_url(&ApiConfig::default(), None).unwrap_err();
        match err {
            SyncError::Configuration { missing } => {
                assert_eq!(missing, vec!["branch", "clientId", "token"]);
            }
            other => panic!("expected Configuration error, got {other}"),
        }
    }
}
