//! Wire codec: `SOFA::<Type>:<json>` framing.
//!
//! The tag before the first `:` selects the schema of the JSON object that
//! follows. Unknown tags are rejected outright; nothing ever falls back to
//! `Message`.
//!
//! Decoding is strict about types (a present field of the wrong JSON type is
//! an error) but tolerant about absence where the client historically was:
//! a `Message` without `body` decodes with an empty body.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::control::{Control, ControlValue};
use crate::envelope::{
    Attachment, Command, Envelope, InitialRequest, InitialResponse, Message, Payment,
    PaymentRequest, SofaType, Status, TxStatus,
};
use crate::error::DecodeError;
use crate::wei::Wei;

pub const SOFA_PREFIX: &str = "SOFA::";

type Object = Map<String, Value>;

/// Parse one raw envelope. Surrounding whitespace (a trailing newline from a
/// line-oriented transport) is ignored.
pub fn decode(raw: &str) -> Result<Envelope, DecodeError> {
    let rest = raw
        .trim()
        .strip_prefix(SOFA_PREFIX)
        .ok_or(DecodeError::NotSofa)?;
    let (tag, body) = rest.split_once(':').ok_or(DecodeError::NotSofa)?;
    let sofa_type =
        SofaType::from_tag(tag).ok_or_else(|| DecodeError::UnknownType(tag.to_string()))?;

    let body: Value =
        serde_json::from_str(body).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    let Value::Object(body) = body else {
        return Err(DecodeError::InvalidJson("body must be a JSON object".into()));
    };

    match sofa_type {
        SofaType::Message => decode_message(&body).map(Envelope::Message),
        SofaType::PaymentRequest => decode_payment_request(&body).map(Envelope::PaymentRequest),
        SofaType::Payment => decode_payment(&body).map(Envelope::Payment),
        SofaType::InitialRequest => decode_initial_request(&body).map(Envelope::InitialRequest),
        SofaType::InitialResponse => {
            decode_initial_response(&body).map(Envelope::InitialResponse)
        }
        SofaType::Command => decode_command(&body).map(Envelope::Command),
        SofaType::Status => decode_status(&body).map(Envelope::Status),
    }
}

/// Serialise an envelope. Total: every constructible envelope encodes, and
/// `decode(&encode(e)) == Ok(e)`.
pub fn encode(envelope: &Envelope) -> String {
    let body = match envelope {
        Envelope::Message(m) => to_json(m),
        Envelope::PaymentRequest(r) => to_json(r),
        Envelope::Payment(p) => to_json(p),
        Envelope::InitialRequest(r) => to_json(r),
        Envelope::InitialResponse(r) => to_json(r),
        Envelope::Command(c) => to_json(c),
        Envelope::Status(s) => to_json(s),
    };
    format!("{SOFA_PREFIX}{}:{body}", envelope.sofa_type().tag())
}

// Payloads hold only strings, string-keyed maps and numbers, so
// serialisation cannot fail.
fn to_json<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_default()
}

// ── Decoding ─────────────────────────────────────────────────────────────────

fn decode_message(body: &Object) -> Result<Message, DecodeError> {
    let controls = match present(body, "controls") {
        Some(list) => Control::parse_list(list)?,
        None => Vec::new(),
    };
    let attachments = match present(body, "attachments") {
        Some(list) => decode_attachments(list)?,
        None => Vec::new(),
    };
    Ok(Message {
        body: optional_str(body, "body")?.unwrap_or_default(),
        controls,
        show_keyboard: optional_bool(body, "showKeyboard")?,
        attachments,
    })
}

fn decode_attachments(list: &Value) -> Result<Vec<Attachment>, DecodeError> {
    const FIELD: &str = "attachments";
    let items = list
        .as_array()
        .ok_or_else(|| DecodeError::wrong_type(FIELD, "an array"))?;
    items
        .iter()
        .map(|item| {
            let object = item
                .as_object()
                .ok_or_else(|| DecodeError::wrong_type(FIELD, "an array of objects"))?;
            let field = |key: &str| {
                object
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| DecodeError::missing(&format!("{FIELD}.{key}")))
            };
            Ok(Attachment {
                kind: field("type")?,
                url: field("url")?,
            })
        })
        .collect()
}

fn decode_payment_request(body: &Object) -> Result<PaymentRequest, DecodeError> {
    Ok(PaymentRequest {
        value_wei: required_wei(body, "value")?,
        destination_address: required_str(body, "destinationAddress")?,
        memo: optional_str(body, "body")?,
    })
}

fn decode_payment(body: &Object) -> Result<Payment, DecodeError> {
    let status = match optional_str(body, "status")? {
        Some(raw) => Some(
            TxStatus::parse(&raw)
                .ok_or_else(|| DecodeError::wrong_type("status", "unconfirmed, confirmed or error"))?,
        ),
        None => None,
    };
    Ok(Payment {
        value_wei: required_wei(body, "value")?,
        tx_hash: optional_str(body, "txHash")?,
        memo: optional_str(body, "body")?,
        from_address: optional_str(body, "fromAddress")?,
        to_address: optional_str(body, "toAddress")?,
        status,
    })
}

fn decode_initial_request(body: &Object) -> Result<InitialRequest, DecodeError> {
    const FIELD: &str = "values";
    let list = present(body, FIELD).ok_or_else(|| DecodeError::missing(FIELD))?;
    let items = list
        .as_array()
        .ok_or_else(|| DecodeError::wrong_type(FIELD, "an array of strings"))?;
    let requested_fields = items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| DecodeError::wrong_type(FIELD, "an array of strings"))
        })
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(InitialRequest { requested_fields })
}

fn decode_initial_response(body: &Object) -> Result<InitialResponse, DecodeError> {
    const FIELD: &str = "values";
    let values = present(body, FIELD)
        .ok_or_else(|| DecodeError::missing(FIELD))?
        .as_object()
        .ok_or_else(|| DecodeError::wrong_type(FIELD, "an object of strings"))?;
    let provided_values = values
        .iter()
        .map(|(key, value)| {
            value
                .as_str()
                .map(|v| (key.clone(), v.to_string()))
                .ok_or_else(|| DecodeError::wrong_type(FIELD, "an object of strings"))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let in_reply_to = match present(body, "inReplyTo") {
        Some(Value::Object(request)) => Some(decode_initial_request(request).map_err(|e| {
            match e {
                DecodeError::MalformedPayload { field, reason } => {
                    DecodeError::MalformedPayload {
                        field: format!("inReplyTo.{field}"),
                        reason,
                    }
                }
                other => other,
            }
        })?),
        Some(_) => return Err(DecodeError::wrong_type("inReplyTo", "an object")),
        None => None,
    };

    Ok(InitialResponse {
        in_reply_to,
        provided_values,
    })
}

fn decode_command(body: &Object) -> Result<Command, DecodeError> {
    const FIELD: &str = "value";
    let raw = present(body, FIELD).ok_or_else(|| DecodeError::missing(FIELD))?;
    let value = ControlValue::from_json(raw)
        .ok_or_else(|| DecodeError::wrong_type(FIELD, "a string or number"))?;
    Ok(Command {
        value,
        body: optional_str(body, "body")?,
    })
}

fn decode_status(body: &Object) -> Result<Status, DecodeError> {
    Ok(Status {
        text: required_str(body, "body")?,
    })
}

// ── Field helpers ────────────────────────────────────────────────────────────

/// `null` counts as absent.
fn present<'a>(body: &'a Object, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|v| !v.is_null())
}

fn optional_str(body: &Object, key: &str) -> Result<Option<String>, DecodeError> {
    match present(body, key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::wrong_type(key, "a string")),
        None => Ok(None),
    }
}

fn required_str(body: &Object, key: &str) -> Result<String, DecodeError> {
    optional_str(body, key)?.ok_or_else(|| DecodeError::missing(key))
}

fn optional_bool(body: &Object, key: &str) -> Result<Option<bool>, DecodeError> {
    match present(body, key) {
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(DecodeError::wrong_type(key, "a boolean")),
        None => Ok(None),
    }
}

fn required_wei(body: &Object, key: &str) -> Result<Wei, DecodeError> {
    let raw = required_str(body, key)?;
    Wei::from_hex(&raw).map_err(|e| DecodeError::MalformedPayload {
        field: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Button;

    #[test]
    fn decodes_message_with_controls() {
        let raw = r#"SOFA::Message:{"body":"Pick one","showKeyboard":false,"controls":[{"type":"button","label":"Red Cross","value":"red-cross"}]}"#;
        let Envelope::Message(message) = decode(raw).unwrap() else {
            panic!("expected message");
        };
        assert_eq!(message.body, "Pick one");
        assert_eq!(message.show_keyboard, Some(false));
        assert_eq!(
            message.controls,
            vec![Control::Button(Button::new("Red Cross").with_value("red-cross"))]
        );
    }

    #[test]
    fn message_without_body_is_empty() {
        let Envelope::Message(message) = decode("SOFA::Message:{}").unwrap() else {
            panic!("expected message");
        };
        assert_eq!(message, Message::default());
    }

    #[test]
    fn unknown_tag_is_rejected_not_defaulted() {
        assert_eq!(
            decode(r#"SOFA::Hologram:{"body":"hi"}"#),
            Err(DecodeError::UnknownType("Hologram".into()))
        );
        assert_eq!(
            decode(r#"SOFA::message:{"body":"hi"}"#),
            Err(DecodeError::UnknownType("message".into()))
        );
    }

    #[test]
    fn text_without_frame_is_not_sofa() {
        assert_eq!(decode("hello there"), Err(DecodeError::NotSofa));
        assert_eq!(decode("SOFA::Message"), Err(DecodeError::NotSofa));
        assert_eq!(decode(""), Err(DecodeError::NotSofa));
    }

    #[test]
    fn body_must_be_a_json_object() {
        assert!(matches!(
            decode("SOFA::Message:not json"),
            Err(DecodeError::InvalidJson(_))
        ));
        assert!(matches!(
            decode(r#"SOFA::Message:["body"]"#),
            Err(DecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn payment_request_names_missing_field() {
        let err = decode(r#"SOFA::PaymentRequest:{"value":"0x1"}"#).unwrap_err();
        assert_eq!(err.field(), Some("destinationAddress"));

        let err = decode(r#"SOFA::PaymentRequest:{"destinationAddress":"0xabc"}"#).unwrap_err();
        assert_eq!(err.field(), Some("value"));
    }

    #[test]
    fn decimal_or_float_wei_is_rejected() {
        for value in [r#""1000""#, r#""0x1.5""#, "1000", "1.5e18"] {
            let raw = format!(r#"SOFA::Payment:{{"value":{value}}}"#);
            let err = decode(&raw).unwrap_err();
            assert_eq!(err.field(), Some("value"), "accepted {value}");
        }
    }

    #[test]
    fn payment_request_wei_is_exact() {
        let raw = r#"SOFA::PaymentRequest:{"value":"0xde0b6b3a7640000","destinationAddress":"0xabc","body":"Request for $1.00."}"#;
        let Envelope::PaymentRequest(request) = decode(raw).unwrap() else {
            panic!("expected payment request");
        };
        assert_eq!(request.value_wei, Wei::from(1_000_000_000_000_000_000u64));
        assert_eq!(request.memo.as_deref(), Some("Request for $1.00."));
    }

    #[test]
    fn payment_status_must_be_known() {
        let err = decode(r#"SOFA::Payment:{"value":"0x1","status":"pending"}"#).unwrap_err();
        assert_eq!(err.field(), Some("status"));
    }

    #[test]
    fn wrong_json_type_is_malformed() {
        let err = decode(r#"SOFA::Message:{"body":42}"#).unwrap_err();
        assert_eq!(err.field(), Some("body"));
        let err = decode(r#"SOFA::Message:{"showKeyboard":"yes"}"#).unwrap_err();
        assert_eq!(err.field(), Some("showKeyboard"));
        let err = decode(r#"SOFA::InitRequest:{"values":["a",1]}"#).unwrap_err();
        assert_eq!(err.field(), Some("values"));
        let err = decode(r#"SOFA::Command:{"value":true}"#).unwrap_err();
        assert_eq!(err.field(), Some("value"));
    }

    #[test]
    fn init_response_decodes_without_pairing() {
        let raw = r#"SOFA::Init:{"values":{"paymentAddress":"0xabc","language":"en"}}"#;
        let Envelope::InitialResponse(response) = decode(raw).unwrap() else {
            panic!("expected init");
        };
        assert_eq!(response.in_reply_to, None);
        assert_eq!(response.provided_values["paymentAddress"], "0xabc");
    }

    #[test]
    fn nested_in_reply_to_errors_are_qualified() {
        let raw = r#"SOFA::Init:{"values":{},"inReplyTo":{"values":"language"}}"#;
        assert_eq!(decode(raw).unwrap_err().field(), Some("inReplyTo.values"));
    }

    #[test]
    fn status_requires_body() {
        assert_eq!(
            decode("SOFA::Status:{}").unwrap_err().field(),
            Some("body")
        );
    }

    #[test]
    fn trailing_newline_is_ignored() {
        assert!(decode("SOFA::Status:{\"body\":\"joined\"}\n").is_ok());
    }

    #[test]
    fn encode_uses_wire_tags() {
        let request = Envelope::InitialRequest(InitialRequest::new(["language"]));
        assert_eq!(encode(&request), r#"SOFA::InitRequest:{"values":["language"]}"#);
        let status = Envelope::Status(Status {
            text: "joined".into(),
        });
        assert_eq!(encode(&status), r#"SOFA::Status:{"body":"joined"}"#);
    }

    #[test]
    fn encoded_wei_is_hex() {
        let payment = Envelope::Payment(Payment::new(Wei::from(1_000_000_000_000_000_000u64)));
        assert_eq!(encode(&payment), r#"SOFA::Payment:{"value":"0xde0b6b3a7640000"}"#);
    }

    #[test]
    fn encoding_omits_absent_and_empty_fields() {
        let message = Envelope::Message(Message::new("hi"));
        assert_eq!(encode(&message), r#"SOFA::Message:{"body":"hi"}"#);

        let mut request = PaymentRequest {
            value_wei: Wei::from(1u64),
            destination_address: "0xabc".into(),
            memo: Some("lunch".into()),
        };
        let wire: Value = serde_json::from_str(
            encode(&Envelope::PaymentRequest(request.clone()))
                .trim_start_matches("SOFA::PaymentRequest:"),
        )
        .unwrap();
        assert_eq!(
            wire,
            serde_json::json!({"value": "0x1", "destinationAddress": "0xabc", "body": "lunch"})
        );

        request.memo = None;
        assert!(!encode(&Envelope::PaymentRequest(request)).contains("body"));
    }
}
