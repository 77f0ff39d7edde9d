pub const MAX_INPUT_SIZE: usize = 64 * 1024;

/// The longest valid UTF-8 prefix of `data`, capped at [`MAX_INPUT_SIZE`].
///
/// Invalid bytes before the cap reject the input; a codepoint cut by the cap
/// itself is dropped.
pub fn truncate_utf8(data: &[u8]) -> Option<&str> {
    let capped = &data[..data.len().min(MAX_INPUT_SIZE)];
    match std::str::from_utf8(capped) {
        Ok(text) => Some(text),
        Err(err) if err.error_len().is_none() => {
            std::str::from_utf8(&capped[..err.valid_up_to()]).ok()
        }
        Err(_) => None,
    }
}
