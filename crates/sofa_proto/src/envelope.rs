//! Envelope variants, one per SOFA type tag.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::Serialize;

use crate::control::{Button, ButtonEffect, Control, ControlValue};
use crate::error::DecodeError;
use crate::wei::Wei;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SofaType {
    Message,
    PaymentRequest,
    Payment,
    InitialRequest,
    InitialResponse,
    Command,
    Status,
}

impl SofaType {
    pub const ALL: [Self; 7] = [
        Self::Message,
        Self::PaymentRequest,
        Self::Payment,
        Self::InitialRequest,
        Self::InitialResponse,
        Self::Command,
        Self::Status,
    ];

    /// Tag as it appears after `SOFA::` on the wire.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Message => "Message",
            Self::PaymentRequest => "PaymentRequest",
            Self::Payment => "Payment",
            Self::InitialRequest => "InitRequest",
            Self::InitialResponse => "Init",
            Self::Command => "Command",
            Self::Status => "Status",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

/// Media reference carried by a message. Only `image` is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.kind == "image"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<Control>,
    /// `Some(true)` asks the client to raise the keyboard, `Some(false)` to
    /// dismiss it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn has_image(&self) -> bool {
        self.attachments.iter().any(Attachment::is_image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(rename = "value")]
    pub value_wei: Wei,
    pub destination_address: String,
    #[serde(rename = "body", skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Chain status reported alongside a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Unconfirmed,
    Confirmed,
    Error,
}

impl TxStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfirmed => "unconfirmed",
            Self::Confirmed => "confirmed",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unconfirmed" => Some(Self::Unconfirmed),
            "confirmed" => Some(Self::Confirmed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "value")]
    pub value_wei: Wei,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(rename = "body", skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TxStatus>,
}

impl Payment {
    pub fn new(value_wei: Wei) -> Self {
        Self {
            value_wei,
            tx_hash: None,
            memo: None,
            from_address: None,
            to_address: None,
            status: None,
        }
    }
}

/// Asks the peer for profile fields (`paymentAddress`, `language`, ...).
/// Field names are an open vocabulary and pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InitialRequest {
    #[serde(rename = "values")]
    pub requested_fields: BTreeSet<String>,
}

impl InitialRequest {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            requested_fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InitialResponse {
    /// The request being answered. The wire carries no correlation id, so a
    /// freshly received response usually has `None` here until the thread
    /// pairs it with its outstanding request.
    #[serde(rename = "inReplyTo", skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<InitialRequest>,
    #[serde(rename = "values")]
    pub provided_values: BTreeMap<String, String>,
}

impl InitialResponse {
    /// Answer `request` with whatever `lookup` knows. Fields it cannot
    /// provide are left out.
    pub fn answering<F>(request: InitialRequest, mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let provided_values = request
            .requested_fields
            .iter()
            .filter_map(|field| lookup(field).map(|value| (field.clone(), value)))
            .collect();
        Self {
            in_reply_to: Some(request),
            provided_values,
        }
    }
}

/// Echo of a pressed button's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub value: ControlValue,
    /// Label of the button that produced the command, shown in the transcript.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Command {
    /// `None` when the button does not resolve to a command (it has no value,
    /// or it requests a local effect instead).
    pub fn from_button(button: &Button) -> Option<Self> {
        match button.effect() {
            ButtonEffect::Command(value) => Some(Self {
                value,
                body: Some(button.label.clone()),
            }),
            ButtonEffect::Local(_) | ButtonEffect::Inert => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    #[serde(rename = "body")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Message(Message),
    PaymentRequest(PaymentRequest),
    Payment(Payment),
    InitialRequest(InitialRequest),
    InitialResponse(InitialResponse),
    Command(Command),
    Status(Status),
}

impl Envelope {
    pub fn sofa_type(&self) -> SofaType {
        match self {
            Self::Message(_) => SofaType::Message,
            Self::PaymentRequest(_) => SofaType::PaymentRequest,
            Self::Payment(_) => SofaType::Payment,
            Self::InitialRequest(_) => SofaType::InitialRequest,
            Self::InitialResponse(_) => SofaType::InitialResponse,
            Self::Command(_) => SofaType::Command,
            Self::Status(_) => SofaType::Status,
        }
    }

    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        crate::codec::decode(raw)
    }

    pub fn encode(&self) -> String {
        crate::codec::encode(self)
    }

    /// Handshake envelopes are protocol plumbing and never appear in a
    /// transcript.
    pub fn is_handshake(&self) -> bool {
        matches!(self, Self::InitialRequest(_) | Self::InitialResponse(_))
    }

    pub fn is_payment(&self) -> bool {
        matches!(self, Self::PaymentRequest(_) | Self::Payment(_))
    }
}

impl FromStr for Envelope {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl From<Message> for Envelope {
    fn from(value: Message) -> Self {
        Self::Message(value)
    }
}

impl From<PaymentRequest> for Envelope {
    fn from(value: PaymentRequest) -> Self {
        Self::PaymentRequest(value)
    }
}

impl From<Payment> for Envelope {
    fn from(value: Payment) -> Self {
        Self::Payment(value)
    }
}

impl From<Command> for Envelope {
    fn from(value: Command) -> Self {
        Self::Command(value)
    }
}
