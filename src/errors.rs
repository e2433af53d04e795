use std::fmt::{Display, Formatter};

/// Fatal: the target window, process, or module could not be located, or its
/// image could not be read. Surfaced to the binary as a non-zero exit code.
#[derive(Debug)]
pub enum EnvironmentError {
	WindowNotFound,
	ProcessNotFound,
	ModuleNotFound,
	CannotReadImage,
	CannotResolveProcessPath,
	EngineNotSupported(String),
}

impl Display for EnvironmentError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::WindowNotFound => write!(f, "target window not found"),
			Self::ProcessNotFound => write!(f, "target process not found"),
			Self::ModuleNotFound => write!(f, "target module not found"),
			Self::CannotReadImage => write!(f, "failed to read target module image"),
			Self::CannotResolveProcessPath => write!(f, "could not obtain target process path"),
			Self::EngineNotSupported(v) => write!(f, "engine version `{v}` is not supported"),
		}
	}
}

impl std::error::Error for EnvironmentError {}

/// Fatal: the offset configuration document is missing or malformed.
#[derive(Debug)]
pub enum ConfigError {
	Io(std::io::Error),
	Parse(toml::de::Error),
	UnknownEngine(String),
}

impl Display for ConfigError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Io(e) => write!(f, "could not read offset configuration: {e}"),
			Self::Parse(e) => write!(f, "malformed offset configuration: {e}"),
			Self::UnknownEngine(v) => write!(f, "no offset record for engine `{v}`"),
		}
	}
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
	fn from(e: std::io::Error) -> Self {
		Self::Io(e)
	}
}

impl From<toml::de::Error> for ConfigError {
	fn from(e: toml::de::Error) -> Self {
		Self::Parse(e)
	}
}

/// Per-file: an output file could not be written. Other files are still
/// attempted; the render pass collects these rather than aborting.
#[derive(Debug)]
pub struct IoError {
	pub path: std::path::PathBuf,
	pub source: std::io::Error,
}

impl Display for IoError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "could not write `{}`: {}", self.path.display(), self.source)
	}
}

impl std::error::Error for IoError {}

/// Non-fatal: a shape anomaly observed while reconstructing a struct. Logged
/// and the offending member is commented out rather than emitted.
#[derive(Debug, Clone)]
pub enum ShapeAnomaly {
	MemberBelowInheritedSize { struct_name: String, member_name: String, offset: u32, inherited: u32 },
	ZeroSizeMember { struct_name: String, member_name: String },
}

impl Display for ShapeAnomaly {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::MemberBelowInheritedSize { struct_name, member_name, offset, inherited } => write!(
				f,
				"{struct_name}::{member_name} at offset {offset:#x} falls below inherited size {inherited:#x}"
			),
			Self::ZeroSizeMember { struct_name, member_name } => {
				write!(f, "{struct_name}::{member_name} has zero size")
			},
		}
	}
}
