use fxhash::FxHashMap;
use serde::Deserialize;
use std::path::Path;

use crate::errors::ConfigError;

const BUNDLED_OFFSETS: &str = include_str!("../config/offsets.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct NameEntryOffsets {
	pub info: u32,
	pub header_size: u32,
	pub len_bit: u32,
	pub wide_bit: u32,
	pub stride: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FNameOffsets {
	pub number: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectOffsets {
	pub index: u32,
	pub class: u32,
	pub outer: u32,
	pub name: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldOffsets {
	pub next: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StructOffsets {
	#[serde(rename = "super")]
	pub super_: u32,
	pub children: u32,
	pub child_properties: u32,
	pub properties_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionOffsets {
	pub func: u32,
	pub flags: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumOffsets {
	pub names: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyOffsets {
	pub array_dim: u32,
	pub element_size: u32,
	pub offset: u32,
	pub flags: u32,
	pub size_of_self: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FFieldOffsets {
	pub class: u32,
	pub next: u32,
	pub name: u32,
}

/// The complete per-engine offset record. Everything the core reads out of
/// a live target funnels through one of these fields; none of it is
/// hardcoded, so adding support for another engine build is a configuration
/// change, not a code change.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineOffsets {
	pub name_pool_block_shift: u32,
	pub name_pool_block_mask: u32,
	pub object_array_chunk_size: u32,
	pub name_entry: NameEntryOffsets,
	pub fname: FNameOffsets,
	pub object: ObjectOffsets,
	pub field: FieldOffsets,
	#[serde(rename = "struct")]
	pub struct_: StructOffsets,
	pub function: FunctionOffsets,
	#[serde(rename = "enum")]
	pub enum_: EnumOffsets,
	pub property: PropertyOffsets,
	pub fproperty: PropertyOffsets,
	pub ffield: FFieldOffsets,
}

pub type OffsetTable = FxHashMap<String, EngineOffsets>;

/// Parses the offset document bundled into the binary, covering the engine
/// version this crate's tests are written against.
pub fn default_offsets() -> OffsetTable {
	toml::from_str(BUNDLED_OFFSETS).expect("bundled offset document must parse")
}

/// Loads an alternate offset document from disk (`--offsets <path>`).
pub fn load_offsets(path: impl AsRef<Path>) -> Result<OffsetTable, ConfigError> {
	let text = std::fs::read_to_string(path)?;
	Ok(toml::from_str(&text)?)
}

pub fn resolve<'a>(table: &'a OffsetTable, engine: &str) -> Result<&'a EngineOffsets, ConfigError> {
	table.get(engine).ok_or_else(|| ConfigError::UnknownEngine(engine.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bundled_offsets_parse_and_contain_the_reference_engine() {
		let table = default_offsets();
		let offsets = resolve(&table, "UE4_25").expect("bundled table must cover UE4_25");
		assert_eq!(offsets.object.class, 0x10);
		assert_eq!(offsets.name_entry.len_bit, 6);
	}

	#[test]
	fn unknown_engine_is_a_config_error() {
		let table = default_offsets();
		assert!(matches!(resolve(&table, "nonexistent"), Err(ConfigError::UnknownEngine(_))));
	}
}
