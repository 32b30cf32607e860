/// Detects the query language, keeping only confident detections. Short or
/// code-like queries routinely confuse language identification, so an absent
/// language is the common case and never an error.
pub fn detect_language(text: &str) -> Option<String> {
	let info = whatlang::detect(text)?;

	if !info.is_reliable() {
		return None;
	}

	Some(info.lang().code().to_string())
}
