//! Round ids and register-action replies

use campusgate_core::records::{RegistrationOutcome, RoundIds};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static ROUND_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"getLichDangKyByDotDKId\s*\(\s*this\s*,\s*(\d+)\s*,\s*(\d+)").unwrap()
});

const BYTE_ORDER_MARK: char = '\u{FEFF}';
const SUCCESS_CODE: &str = "SUCCESS";

/// Round ids of the first round listed for a period (`getDanhSachDotDK` fragment)
pub fn parse_round_ids(html: &str) -> Option<RoundIds> {
    ROUND_LINK.captures(html).map(|caps| RoundIds {
        round_student_id: caps[1].to_string(),
        round_id: caps[2].to_string(),
    })
}

/// Interpret the JSON reply of the register action.
///
/// A forced registration counts as successful whatever the portal answered.
/// An unreadable reply is an unsuccessful outcome, never an error.
pub fn parse_registration_response(body: &str, force: bool) -> RegistrationOutcome {
    let body = body.strip_prefix(BYTE_ORDER_MARK).unwrap_or(body);
    let reply: Value = serde_json::from_str(body.trim()).unwrap_or_else(|e| {
        debug!("Register reply is not JSON: {}", e);
        Value::Null
    });

    // Fields are read one by one so a malformed `code` keeps the portal's message
    let code = reply.get("code").and_then(scalar_text);
    let msg = reply.get("msg").and_then(scalar_text);

    let success = force || code.as_deref() == Some(SUCCESS_CODE);
    let message = msg.unwrap_or_else(|| {
        if success {
            "Sent".to_string()
        } else {
            "Failed".to_string()
        }
    });

    RegistrationOutcome {
        success,
        message,
        code,
        forced: force,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
