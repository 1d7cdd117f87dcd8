//! Wire types: one JSON object per line in each direction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A client request, tagged by its `command` field.
///
/// Keys and values are UTF-8 strings on the wire; the engine stores their
/// raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    /// Store a key-value pair.
    Put { key: String, value: String },
    /// Look up a key.
    Get { key: String },
    /// Delete a key.
    Delete { key: String },
    /// Store several pairs, durable as a unit. `keys` and `values` must
    /// have equal length.
    BatchPut {
        keys: Vec<String>,
        values: Vec<String>,
    },
    /// All pairs with `start_key <= key <= end_key`, ascending.
    GetRange {
        start_key: String,
        end_key: String,
    },
}

/// A server response, tagged by its `status` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// The operation succeeded; `result` is command-specific (`true` for
    /// writes, a string or `null` for `get`, an array of `[key, value]`
    /// pairs for `get_range`).
    Ok { result: Value },
    /// The operation failed; `message` explains why.
    Error { message: String },
}

impl Response {
    pub fn ok(result: Value) -> Self {
        Response::Ok { result }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_parse_from_their_wire_form() {
        let req: Request =
            serde_json::from_str(r#"{"command":"put","key":"k","value":"v"}"#).unwrap();
        assert_eq!(
            req,
            Request::Put {
                key: "k".into(),
                value: "v".into()
            }
        );

        let req: Request = serde_json::from_str(
            r#"{"command":"batch_put","keys":["a","b"],"values":["1","2"]}"#,
        )
        .unwrap();
        assert!(matches!(req, Request::BatchPut { .. }));

        let req: Request = serde_json::from_str(
            r#"{"command":"get_range","start_key":"a","end_key":"z"}"#,
        )
        .unwrap();
        assert!(matches!(req, Request::GetRange { .. }));
    }

    #[test]
    fn unknown_commands_fail_to_parse() {
        assert!(serde_json::from_str::<Request>(r#"{"command":"drop_tables"}"#).is_err());
        assert!(serde_json::from_str::<Request>(r#"{"key":"no-command"}"#).is_err());
    }

    #[test]
    fn responses_serialize_with_status_tags() {
        let ok = serde_json::to_value(Response::ok(json!(true))).unwrap();
        assert_eq!(ok, json!({"status":"ok","result":true}));

        let absent = serde_json::to_value(Response::ok(Value::Null)).unwrap();
        assert_eq!(absent, json!({"status":"ok","result":null}));

        let err = serde_json::to_value(Response::error("boom")).unwrap();
        assert_eq!(err, json!({"status":"error","message":"boom"}));
    }
}
