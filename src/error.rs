use std::fmt::Display;

/// Errors produced by the pure calculation core.
///
/// Every variant describes bad user input, so the command layer replies with
/// the message instead of failing the command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
	#[error("Unrecognized unit `{symbol}`{}", suggestion_suffix(.suggestion))]
	InvalidUnit {
		symbol: String,
		suggestion: Option<String>,
	},

	#[error("Unrecognized rank `{name}`{}", suggestion_suffix(.suggestion))]
	InvalidTier {
		name: String,
		suggestion: Option<String>,
	},

	#[error("{count} {from} cannot be combined evenly into {to}")]
	Unconvertible {
		count: u64,
		from: String,
		to: String,
	},

	#[error("Rank {target} is not above {start}")]
	TargetNotAbove { start: String, target: String },

	#[error("Malformed input: {0}")]
	MalformedInput(String),

	#[error("That many swords is more than I can count")]
	Overflow,
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
	match suggestion {
		Some(s) => format!(" (did you mean `{s}`?)"),
		None => String::new(),
	}
}

impl DomainError {
	#[inline]
	pub fn malformed(message: impl Display) -> Self {
		Self::MalformedInput(message.to_string())
	}
}

// }}}
