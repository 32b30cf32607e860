use regex::Regex;

/// Coarse query intent used to shade retrieval and synthesis. Heuristic,
/// pattern-based; `Unknown` is an acceptable answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
	Informational,
	HowTo,
	Location,
	Temporal,
	Unknown,
}
impl Intent {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Informational => "informational",
			Self::HowTo => "how_to",
			Self::Location => "location",
			Self::Temporal => "temporal",
			Self::Unknown => "unknown",
		}
	}
}

pub fn classify_intent(text: &str) -> Intent {
	let lowered = text.trim().to_lowercase();

	if lowered.is_empty() {
		return Intent::Unknown;
	}

	// Order matters: how-to/location/temporal markers are stronger signals
	// than the generic question shape.
	if matches_any(
		&lowered,
		&[
			r"^kaip\b",
			r"^how\s+(do|to|can|does|should)\b",
			r"\binstrukcija\b",
			r"\bžingsni",
			r"\bstep[- ]by[- ]step\b",
		],
	) {
		return Intent::HowTo;
	}
	if matches_any(
		&lowered,
		&[r"^kur\b", r"^where\b", r"\badresas\b", r"\baddress\b", r"\bvieta\b", r"\blocation\b"],
	) {
		return Intent::Location;
	}
	if matches_any(
		&lowered,
		&[
			r"^kada\b",
			r"^when\b",
			r"\bdarbo laikas\b",
			r"\btvarkaraš",
			r"\bopening hours\b",
			r"\bschedule\b",
		],
	) {
		return Intent::Temporal;
	}
	if matches_any(&lowered, &[r"^(kas|koks|kokia|kodėl|what|who|which|why)\b"])
		|| lowered.ends_with('?')
	{
		return Intent::Informational;
	}

	Intent::Unknown
}

fn matches_any(text: &str, patterns: &[&str]) -> bool {
	for pattern in patterns {
		if Regex::new(pattern).map(|re| re.is_match(text)).unwrap_or(false) {
			return true;
		}
	}

	false
}
