//! Workitem intake: reading payloads and turning them into search requests.
//!
//! The input file holds a JSON array of payloads such as:
//!
//! ```json
//! [
//!   { "search_query": "wildfire", "category": "California", "months": 2 },
//!   { "search_query": "housing", "months": "1" }
//! ]
//! ```

use crate::error::WorkItemError;
use crate::models::SearchRequest;
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Read the raw payloads from the JSON array at `path`.
///
/// Payloads are kept as untyped values so that one malformed entry fails
/// only its own workitem.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_payloads(path: &Path) -> Result<Vec<Value>, Box<dyn Error>> {
    let raw = fs::read_to_string(path).await?;
    let payloads: Vec<Value> = serde_json::from_str(&raw)?;
    info!(count = payloads.len(), "Loaded workitem payloads");
    Ok(payloads)
}

/// Check one payload and build the [`SearchRequest`] it describes.
///
/// - `search_query`: required non-empty string
/// - `category`: optional; when given, a non-empty string
/// - `months`: optional non-negative integer, as a number or a numeric
///   string; absent or `0` both mean the current month only
pub fn validate_payload(payload: &Value) -> Result<SearchRequest, WorkItemError> {
    let object = payload.as_object().ok_or(WorkItemError::NotAnObject)?;

    let search_query = match object.get("search_query") {
        Some(Value::String(q)) if !q.trim().is_empty() => q.trim().to_string(),
        _ => return Err(WorkItemError::MissingQuery),
    };

    let category = match object.get("category") {
        None | Some(Value::Null) => None,
        Some(Value::String(c)) if !c.trim().is_empty() => Some(c.trim().to_string()),
        Some(_) => return Err(WorkItemError::EmptyCategory),
    };

    let months = match object.get("months") {
        None | Some(Value::Null) => 1,
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| WorkItemError::InvalidMonths(n.to_string()))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| WorkItemError::InvalidMonths(s.clone()))?,
        Some(other) => return Err(WorkItemError::InvalidMonths(other.to_string())),
    };

    Ok(SearchRequest {
        search_query,
        category,
        months: months.max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_payload() {
        let request = validate_payload(&json!({
            "search_query": " wildfire ",
            "category": "California",
            "months": 3
        }))
        .unwrap();
        assert_eq!(
            request,
            SearchRequest {
                search_query: "wildfire".to_string(),
                category: Some("California".to_string()),
                months: 3,
            }
        );
    }

    #[test]
    fn test_months_forms() {
        let months = |v: Value| validate_payload(&json!({ "search_query": "q", "months": v })).map(|r| r.months);
        assert_eq!(months(json!(2)), Ok(2));
        assert_eq!(months(json!("4")), Ok(4));
        assert_eq!(months(json!(0)), Ok(1));
        assert_eq!(months(json!("0")), Ok(1));
        assert_eq!(months(Value::Null), Ok(1));
        assert_eq!(months(json!(-1)), Err(WorkItemError::InvalidMonths("-1".to_string())));
        assert_eq!(months(json!(1.5)), Err(WorkItemError::InvalidMonths("1.5".to_string())));
        assert_eq!(months(json!("two")), Err(WorkItemError::InvalidMonths("two".to_string())));
        assert_eq!(months(json!([1])), Err(WorkItemError::InvalidMonths("[1]".to_string())));
    }

    #[test]
    fn test_months_absent_means_one() {
        let request = validate_payload(&json!({ "search_query": "q" })).unwrap();
        assert_eq!(request.months, 1);
        assert_eq!(request.category, None);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(validate_payload(&json!(["q"])), Err(WorkItemError::NotAnObject));
        assert_eq!(validate_payload(&json!({})), Err(WorkItemError::MissingQuery));
        assert_eq!(
            validate_payload(&json!({ "search_query": "   " })),
            Err(WorkItemError::MissingQuery)
        );
        assert_eq!(
            validate_payload(&json!({ "search_query": 42 })),
            Err(WorkItemError::MissingQuery)
        );
        assert_eq!(
            validate_payload(&json!({ "search_query": "q", "category": "" })),
            Err(WorkItemError::EmptyCategory)
        );
        assert_eq!(
            validate_payload(&json!({ "search_query": "q", "category": 7 })),
            Err(WorkItemError::EmptyCategory)
        );
    }

    #[tokio::test]
    async fn test_load_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workitems.json");
        fs::write(&path, r#"[{"search_query": "a"}, "not an object"]"#)
            .await
            .unwrap();

        let payloads = load_payloads(&path).await.unwrap();
        assert_eq!(payloads.len(), 2);
        assert!(validate_payload(&payloads[0]).is_ok());
        assert_eq!(validate_payload(&payloads[1]), Err(WorkItemError::NotAnObject));
    }

    #[tokio::test]
    async fn test_load_payloads_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workitems.json");
        fs::write(&path, r#"{"search_query": "a"}"#).await.unwrap();

        assert!(load_payloads(&path).await.is_err());
    }
}
