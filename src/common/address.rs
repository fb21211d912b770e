use base64::{engine::general_purpose::STANDARD, Engine};
use lettre::{
    message::{header::ContentType, Mailbox},
    Address, Message,
};
use snafu::ResultExt;

use super::{AddressSnafu, ComposeSnafu, Mail, Recipient, Result, SenderIdentity};

fn non_empty(alias: Option<&str>) -> Option<&str> {
    alias.map(str::trim).filter(|alias| !alias.is_empty())
}

/// Longest encoded-word RFC 2047 allows, delimiters included.
const MAX_ENCODED_WORD: usize = 75;

/// Raw bytes that fit in one `=?utf-8?b?...?=` word once base64 encoded.
const MAX_WORD_BYTES: usize = (MAX_ENCODED_WORD - "=?utf-8?b??=".len()) / 4 * 3;

/// RFC 2047 encoded-words for header values that are not plain ASCII.
/// Long values are split on character boundaries into several words
/// separated by a space.
fn encode_word(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut start = 0;
    for (idx, ch) in value.char_indices() {
        if idx + ch.len_utf8() - start > MAX_WORD_BYTES {
            words.push(&value[start..idx]);
            start = idx;
        }
    }
    words.push(&value[start..]);

    words
        .into_iter()
        .map(|chunk| format!("=?utf-8?b?{}?=", STANDARD.encode(chunk)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format an address like `Alice<123@abc.xyz>`, or the bare address when
/// there is no alias.
pub fn format_address(address: &str, alias: Option<&str>) -> String {
    match non_empty(alias) {
        Some(alias) => format!("{}<{address}>", encode_word(alias)),
        None => address.to_string(),
    }
}

pub(crate) fn mailbox(address: &str, alias: Option<&str>) -> Result<Mailbox> {
    let parsed: Address = address.trim().parse().context(AddressSnafu { address })?;
    Ok(Mailbox::new(non_empty(alias).map(String::from), parsed))
}

/// Build the plain-text message sent on every attempt of a session.
pub fn compose_message(
    sender: &SenderIdentity,
    recipients: &[Recipient],
    mail: &Mail,
) -> Result<Message> {
    let mut builder = Message::builder()
        .from(mailbox(&sender.address, sender.alias.as_deref())?)
        .subject(mail.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    for recipient in recipients {
        builder = builder.to(mailbox(&recipient.address, recipient.alias.as_deref())?);
    }

    builder.body(mail.body.clone()).context(ComposeSnafu)
}
