/// Confidence gate for one user turn: a bounded state machine rather than
/// recursive re-invocation, so termination and the attempt budget hold by
/// construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GateState {
	Initial,
	Retrying { attempt: u32, threshold: f32 },
	Accepted { attempt: u32, threshold: f32 },
	Exhausted { attempt: u32 },
}

impl GateState {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Accepted { .. } | Self::Exhausted { .. })
	}
}

/// Ephemeral record of one attempt; exists only to drive the gate.
#[derive(Clone, Copy, Debug)]
pub struct AttemptRecord {
	pub attempt: u32,
	pub threshold: f32,
	pub result_count: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
	pub initial_threshold: f32,
	pub floor: f32,
	pub step: f32,
	pub max_attempts: u32,
}

impl RetryPolicy {
	/// The caller's requested confidence wins over the configured default;
	/// the floor is never allowed above the starting threshold.
	pub fn resolve(retrieval: &ora_config::Retrieval, requested_min: Option<f32>) -> Self {
		let initial_threshold = requested_min
			.filter(|value| value.is_finite())
			.unwrap_or(retrieval.min_confidence)
			.clamp(0.0, 1.0);
		let floor = retrieval.floor_confidence.min(initial_threshold);

		Self {
			initial_threshold,
			floor,
			step: retrieval.threshold_step,
			max_attempts: retrieval.max_attempts.max(1),
		}
	}

	pub fn first_attempt(&self) -> (u32, f32) {
		(1, self.initial_threshold)
	}

	/// Applies the transition rules to one finished attempt.
	pub fn observe(&self, record: AttemptRecord) -> GateState {
		if record.result_count > 0 {
			return GateState::Accepted { attempt: record.attempt, threshold: record.threshold };
		}
		if record.threshold > self.floor && record.attempt < self.max_attempts {
			let next = (record.threshold - self.step).max(self.floor);

			return GateState::Retrying { attempt: record.attempt + 1, threshold: next };
		}

		GateState::Exhausted { attempt: record.attempt }
	}
}
