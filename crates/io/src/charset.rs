// Charset lookup and transcoding

use encoding_rs::{Encoding, EncoderResult, UTF_16BE, UTF_16LE, UTF_8};
use twofile_recon::ReconError;

/// Look up a WHATWG encoding label such as `UTF-8`, `ISO-8859-1` or `windows-1251`.
///
/// `ISO-8859-1` and `latin1` resolve to windows-1252: bytes 0x80-0x9F decode
/// to the windows-1252 characters (`€`, `‚`, ...) instead of C1 controls.
pub fn resolve_charset(label: &str) -> Result<&'static Encoding, ReconError> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| ReconError::UnknownCharset(label.to_string()))
}

/// Decode `bytes` with the configured encoding. A byte-order mark is only
/// stripped when it belongs to that encoding; it never switches encodings.
/// The flag is set when malformed sequences were replaced.
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> (String, bool) {
    let (text, had_errors) = if encoding == UTF_8 || encoding == UTF_16LE || encoding == UTF_16BE {
        encoding.decode_with_bom_removal(bytes)
    } else {
        encoding.decode_without_bom_handling(bytes)
    };
    (text.into_owned(), had_errors)
}

/// Encode `text`. Unmappable characters are written as `?` and set the flag.
pub fn encode(text: &str, encoding: &'static Encoding) -> (Vec<u8>, bool) {
    let mut encoder = encoding.output_encoding().new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut had_errors = false;
    let mut input = text;
    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(input.len())
            .unwrap_or(input.len() * 4 + 16);
        out.reserve(needed);
        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(input, &mut out, true);
        input = &input[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(_) => {
                had_errors = true;
                out.push(b'?');
            }
        }
    }
    (out, had_errors)
}
