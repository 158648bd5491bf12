#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Message(String),

	#[error("{collaborator} is unavailable: {reason}")]
	Unavailable { collaborator: &'static str, reason: String },
}
