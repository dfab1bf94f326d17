//! Raw submission data.
//!
//! A [`Submission`] is what a browser POSTs to a form: a flat, ordered,
//! multi-valued mapping of keys to text, byte or file values. Keys and byte
//! values stay undecoded until [`decode`](Submission::decode) is called with
//! the charset the browser declared, so a `latin-1` page and a `utf-8` page
//! produce the same strings.

use formal_core::utils::MultiValueDict;
use formal_core::FormalResult;

use crate::charset::Charset;
use crate::upload::UploadedFile;

/// One raw value of a submission key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Already-decoded text.
    Text(String),
    /// Bytes in the submission's declared charset.
    Bytes(Vec<u8>),
    /// An uploaded file.
    File(UploadedFile),
}

/// One decoded value of a submission key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text(String),
    File(UploadedFile),
}

impl FieldInput {
    /// Returns the text, or `None` for a file.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::File(_) => None,
        }
    }
}

/// A flat, multi-valued form submission.
///
/// # Examples
///
/// ```
/// use formal_http::{Charset, Submission};
///
/// let sub = Submission::parse_urlencoded(b"name=Ada+Lovelace&tag=a&tag=b");
/// assert_eq!(sub.len(), 2);
///
/// let decoded = sub.decode(Charset::Utf8);
/// let name = decoded.get(&"name".to_string()).and_then(|v| v.as_text());
/// assert_eq!(name, Some("Ada Lovelace"));
/// assert_eq!(decoded.get_list(&"tag".to_string()).map(<[_]>::len), Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Submission {
    data: MultiValueDict<Vec<u8>, RawValue>,
}

impl Submission {
    /// Creates an empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    ///
    /// `+` becomes a space and percent escapes are decoded to raw bytes;
    /// the bytes are interpreted later with the declared charset.
    pub fn parse_urlencoded(body: &[u8]) -> Self {
        let mut data = MultiValueDict::new();

        for pair in body.split(|&b| b == b'&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair
                .iter()
                .position(|&b| b == b'=')
                .map_or((pair, &[][..]), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));

            data.append(percent_decode(key), RawValue::Bytes(percent_decode(value)));
        }

        Self { data }
    }

    /// Appends a text value, builder style.
    #[must_use]
    pub fn with_text(mut self, key: &str, value: impl Into<String>) -> Self {
        self.append_text(key, value);
        self
    }

    /// Appends a file, builder style.
    #[must_use]
    pub fn with_file(mut self, key: &str, file: UploadedFile) -> Self {
        self.append_file(key, file);
        self
    }

    /// Appends a text value.
    pub fn append_text(&mut self, key: &str, value: impl Into<String>) {
        self.data
            .append(key.as_bytes().to_vec(), RawValue::Text(value.into()));
    }

    /// Appends an undecoded byte value under an undecoded key.
    pub fn append_bytes(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.data.append(key.into(), RawValue::Bytes(value.into()));
    }

    /// Appends an uploaded file.
    pub fn append_file(&mut self, key: &str, file: UploadedFile) {
        self.data.append(key.as_bytes().to_vec(), RawValue::File(file));
    }

    /// Returns the last raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.data.get(&key.as_bytes().to_vec())
    }

    /// Returns all raw values for `key`.
    pub fn get_list(&self, key: &str) -> Option<&[RawValue]> {
        self.data.get_list(&key.as_bytes().to_vec())
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(&key.as_bytes().to_vec())
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the last value of a reserved ASCII key (such as the form or
    /// charset key) as text. Files are ignored.
    pub fn reserved(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Bytes(b) => Some(Charset::Ascii.decode(b)),
            RawValue::File(_) => None,
        }
    }

    /// Resolves the charset the submission declares under `charset_key`,
    /// falling back to `default` when none is declared.
    ///
    /// # Errors
    ///
    /// Returns [`FormalError::UnsupportedCharset`](formal_core::FormalError::UnsupportedCharset)
    /// if the declared or default charset is not supported.
    pub fn charset(&self, charset_key: &str, default: &str) -> FormalResult<Charset> {
        match self.reserved(charset_key) {
            Some(label) if !label.trim().is_empty() => Charset::from_label(&label),
            _ => Charset::from_label(default),
        }
    }

    /// Decodes every key and byte value with `charset`.
    ///
    /// Keys that decode to the same string are merged in submission order.
    pub fn decode(&self, charset: Charset) -> MultiValueDict<String, FieldInput> {
        let mut decoded = MultiValueDict::new();
        for (key, values) in self.data.iter() {
            let key = charset.decode(key);
            for value in values {
                let input = match value {
                    RawValue::Text(s) => FieldInput::Text(s.clone()),
                    RawValue::Bytes(b) => FieldInput::Text(charset.decode(b)),
                    RawValue::File(f) => FieldInput::File(f.clone()),
                };
                decoded.append(key.clone(), input);
            }
        }
        tracing::trace!(keys = decoded.len(), %charset, "Decoded submission");
        decoded
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Submission {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut sub = Self::new();
        for (k, v) in iter {
            sub.append_text(k.as_ref(), v);
        }
        sub
    }
}

/// Decodes `+` as space, then percent escapes, without interpreting the bytes.
fn percent_decode(input: &[u8]) -> Vec<u8> {
    let replaced: Vec<u8> = input
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    percent_encoding::percent_decode(&replaced).collect()
}
