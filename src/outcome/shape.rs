use super::model::{BatchStatistics, RequestContext, SingleResult, TestOutcome};

pub const EXECUTION_FAILED: &str = "Request execution failed";

/// Maps executed results onto the shape the rendering layer expects. One
/// result is reported as-is; several must come with statistics, since the
/// batch wall-clock time cannot be recovered from the results alone.
pub fn shape(
    mut results: Vec<SingleResult>,
    statistics: Option<BatchStatistics>,
    context: RequestContext,
) -> TestOutcome {
    match results.len() {
        0 => TestOutcome::error(EXECUTION_FAILED, Some("no requests were executed".to_string())),
        1 => TestOutcome::Single {
            result: results.remove(0),
            context,
            cancelled: false,
        },
        _ => match statistics {
            Some(statistics) => TestOutcome::Batch {
                first_result: results[0].clone(),
                statistics,
                all_results: results,
                context,
                cancelled: false,
            },
            None => TestOutcome::error(
                EXECUTION_FAILED,
                Some(format!("no statistics for a batch of {}", results.len())),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ResponseData;
    use crate::route::HttpMethod;
    use crate::validate::HeaderMapping;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn context() -> RequestContext {
        RequestContext {
            url: "http://localhost/api/ping".to_string(),
            method: HttpMethod::Get,
            request_headers: HeaderMapping::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            request_body: None,
        }
    }

    fn ok(number: u32, time: u64) -> SingleResult {
        SingleResult {
            success: true,
            status: 200,
            status_text: "OK".to_string(),
            headers: HeaderMapping::new(),
            data: ResponseData::Json(json!({"ok": true})),
            response_time_ms: time,
            request_number: number,
            error: false,
        }
    }

    #[test]
    fn one_result_is_single() {
        let outcome = shape(vec![ok(1, 5)], None, context());
        assert_eq!(outcome.kind(), "single");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["result"]["data"], json!({"ok": true}));
        assert_eq!(value["context"]["method"], json!("GET"));
        assert_eq!(value["context"]["requestBody"], json!(null));
        assert!(outcome.statistics().is_none());
        assert!(value.get("cancelled").is_none());
    }

    #[test]
    fn several_results_form_a_batch() {
        let stats = BatchStatistics {
            total_requests: 2,
            successful_requests: 2,
            failed_requests: 0,
            total_time_ms: 40,
            avg_response_time_ms: 15,
            min_response_time_ms: 10,
            max_response_time_ms: 20,
        };
        let outcome = shape(vec![ok(1, 10), ok(2, 20)], Some(stats), context());

        match &outcome {
            TestOutcome::Batch {
                first_result,
                statistics,
                all_results,
                cancelled,
                ..
            } => {
                assert_eq!(first_result.request_number, 1);
                assert_eq!(*statistics, stats);
                assert_eq!(all_results.len(), 2);
                assert!(!cancelled);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["kind"], json!("batch"));
        assert_eq!(value["firstResult"]["requestNumber"], json!(1));
        assert_eq!(value["statistics"]["totalTimeMs"], json!(40));
        assert_eq!(value["allResults"].as_array().unwrap().len(), 2);
        assert!(value.get("cancelled").is_none());
    }

    #[test]
    fn batch_without_statistics_is_an_error() {
        match shape(vec![ok(1, 10), ok(2, 30)], None, context()) {
            TestOutcome::Error { message, details } => {
                assert_eq!(message, EXECUTION_FAILED);
                assert_eq!(details.as_deref(), Some("no statistics for a batch of 2"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn cancelled_single_carries_the_flag() {
        let outcome = shape(vec![ok(1, 5)], None, context()).with_cancelled(true);
        assert_eq!(outcome.kind(), "single");
        assert!(outcome.is_cancelled());
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["cancelled"], json!(true));
    }

    #[test]
    fn no_results_is_an_error() {
        let outcome = shape(Vec::new(), None, context());
        assert!(outcome.is_error());
    }
}
