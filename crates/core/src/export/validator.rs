//! Classification of completed HTTP exchanges

use course_export_domain::constants::SUCCESS_STATUS;
use course_export_domain::HttpStatusError;

/// Accept exactly `200`; every other status, including `0`, is a failure
/// carrying the status and the raw response body.
pub fn validate_response(body: &str, status: u16) -> Result<(), HttpStatusError> {
    if status == SUCCESS_STATUS {
        Ok(())
    } else {
        Err(HttpStatusError { status, body: body.to_string() })
    }
}
