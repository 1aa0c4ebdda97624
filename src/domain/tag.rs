use crate::error::PaymentError;

/// Bytes preceding the text of an NDEF text record: status byte plus the
/// two-letter language code.
pub const TEXT_RECORD_HEADER_LEN: usize = 3;
/// Text a tag must carry to authorise a payment.
pub const PAYMENT_MARKER: &str = "PAY";

/// What the tag reader produced for one physical tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRead {
    Payload(Vec<u8>),
    /// The tag carried no NDEF message.
    NoData,
    /// The reader failed while talking to the tag.
    Unreadable,
}

impl TagRead {
    pub fn evaluate(&self) -> Result<(), PaymentError> {
        match self {
            TagRead::Payload(payload) => evaluate_payload(Some(payload.as_slice())),
            TagRead::NoData => evaluate_payload(None),
            TagRead::Unreadable => Err(PaymentError::DecodeError),
        }
    }
}

impl From<Option<Vec<u8>>> for TagRead {
    fn from(payload: Option<Vec<u8>>) -> Self {
        payload.map_or(TagRead::NoData, TagRead::Payload)
    }
}

/// Decides whether a tag payload authorises a payment.
pub fn evaluate_payload(payload: Option<&[u8]>) -> Result<(), PaymentError> {
    let payload = payload.ok_or(PaymentError::NoNdefData)?;
    if payload.len() <= TEXT_RECORD_HEADER_LEN {
        return Err(PaymentError::InvalidCardPayload);
    }
    let text = std::str::from_utf8(&payload[TEXT_RECORD_HEADER_LEN..])
        .map_err(|_| PaymentError::DecodeError)?;
    if text.trim().eq_ignore_ascii_case(PAYMENT_MARKER) {
        Ok(())
    } else {
        Err(PaymentError::InvalidCardPayload)
    }
}

/// Builds an English NDEF text record payload carrying `text`.
pub fn text_record(text: &str) -> Vec<u8> {
    let mut payload = vec![0x02, b'e', b'n'];
    payload.extend_from_slice(text.as_bytes());
    payload
}
