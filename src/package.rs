//! Groups reflected objects by package and emits the structural records
//! (structs, enums, functions, padding) that the renderer turns into text.

use fxhash::FxHashSet;

use crate::context::Context;
#[cfg(feature = "tracing")]
use crate::errors::ShapeAnomaly;
use crate::flags::{FunctionFlags, PropertyFlags};
use crate::ident::fix_and_dedup;
use crate::model::{Enum, Object, Property, Struct};
use crate::pointer_probe::PointerProbe;
use crate::reader::Addr;
use crate::resolver::{resolve, PropertyKind};

#[derive(Debug, Clone)]
pub struct Member {
	pub type_name: String,
	pub name: String,
	pub offset: u32,
	pub size: u32,
	pub array_dim: u32,
	pub bit_width: Option<u8>,
	pub suspect: bool,
}

#[derive(Debug, Clone)]
pub struct Parameter {
	pub type_name: String,
	pub name: String,
	pub offset: u32,
	pub size: u32,
	pub array_dim: u32,
	pub flags: PropertyFlags,
}

#[derive(Debug, Clone)]
pub struct FunctionRecord {
	pub full_name: String,
	pub name: String,
	pub return_type: Option<String>,
	pub params: Vec<Parameter>,
	pub flags: FunctionFlags,
	pub entry_point: Addr,
	pub is_const: bool,
	pub param_struct_name: String,
}

#[derive(Debug, Clone)]
pub struct StructRecord {
	pub addr: Addr,
	pub parent_addr: Option<Addr>,
	pub full_name: String,
	pub cpp_name: String,
	pub inherited_size: u32,
	pub total_size: u32,
	pub members: Vec<Member>,
	pub functions: Vec<FunctionRecord>,
	pub is_class: bool,
}

#[derive(Debug, Clone)]
pub struct EnumRecord {
	pub full_name: String,
	pub cpp_name: String,
	pub members: Vec<String>,
	pub underlying: &'static str,
}

#[derive(Debug, Default, Clone)]
pub struct Package {
	pub name: String,
	pub structs: Vec<StructRecord>,
	pub enums: Vec<EnumRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
	/// Enables the pointer probe for packages at-or-after this name in
	/// processing order, mirroring `-f <packagename>`.
	pub pointer_probe_from: Option<String>,
	pub spacing: bool,
}

struct PropEntry {
	name: String,
	type_name: String,
	offset: u32,
	size: u32,
	array_dim: u32,
	bool_mask: Option<u8>,
}

fn gather_properties(
	ctx: &Context,
	s: Struct,
	functions: &mut Vec<FunctionRecord>,
	actor_class: Option<crate::model::Class>,
) -> Vec<PropEntry> {
	let mut entries = Vec::new();
	for field in s.children(ctx) {
		let obj: Object = *field;
		if obj.is_a_named(ctx, "Function", "Class CoreUObject.Function") {
			functions.push(generate_function(ctx, Struct(obj), actor_class));
			continue;
		}
		if !obj.is_a_named(ctx, "Property", "Class CoreUObject.Property") {
			continue;
		}
		entries.push(make_entry(ctx, &Property::legacy(obj), actor_class));
	}
	for ffield in s.child_properties(ctx) {
		entries.push(make_entry(ctx, &Property::new_style(ffield), actor_class));
	}
	entries.sort_by_key(|e| e.offset);
	entries
}

fn make_entry(ctx: &Context, prop: &Property, actor_class: Option<crate::model::Class>) -> PropEntry {
	let (kind, type_name) = resolve(prop, ctx, actor_class);
	let bool_mask = matches!(kind, PropertyKind::Bool).then(|| prop.bool_mask(ctx));
	let array_dim = prop.array_dim(ctx).max(1);
	let size = prop.size(ctx).max(prop.element_size(ctx));
	PropEntry { name: prop.get_name(ctx).to_string(), type_name, offset: prop.offset(ctx), size, array_dim, bool_mask }
}

/// Reconstructs one struct (class or plain struct) into a [`StructRecord`],
/// including padding, bit-field packing, and suspect-member handling.
pub fn generate_struct(
	ctx: &Context,
	s: Struct,
	inherited_size: u32,
	total_size: u32,
	probe: Option<&PointerProbe>,
	actor_class: Option<crate::model::Class>,
) -> StructRecord {
	let full_name = s.get_full_name(ctx);
	let cpp_name = s.cpp_name(ctx, actor_class);
	let is_class = s.0.get_class(ctx).0.get_name(ctx).as_ref() == "Class";

	let mut functions = Vec::new();
	let entries = gather_properties(ctx, s, &mut functions, actor_class);

	let mut members = Vec::new();
	let mut scope: FxHashSet<String> = FxHashSet::default();
	let mut cursor = inherited_size;
	let mut bit_cursor: u8 = 0;

	for entry in entries {
		if entry.offset < inherited_size {
			#[cfg(feature = "tracing")]
			{
				let anomaly = ShapeAnomaly::MemberBelowInheritedSize {
					struct_name: cpp_name.clone(),
					member_name: entry.name.clone(),
					offset: entry.offset,
					inherited: inherited_size,
				};
				tracing::warn!(%anomaly, "member below inherited size");
			}
			members.push(Member {
				type_name: format!("/* suspect: {} */", entry.type_name),
				name: fix_and_dedup(&entry.name, &mut scope),
				offset: entry.offset,
				size: entry.size,
				array_dim: entry.array_dim,
				bit_width: None,
				suspect: true,
			});
			continue;
		}

		if let Some(mask) = entry.bool_mask {
			if entry.offset > cursor {
				fill_padding(&mut members, &mut scope, cursor, entry.offset, s.addr(), ctx, probe);
				cursor = entry.offset;
				bit_cursor = 0;
			}
			let zeros = mask.trailing_zeros().min(8) as u8;
			let ones = (mask >> zeros).trailing_ones().min(8 - zeros as u32) as u8;
			if zeros > bit_cursor {
				members.push(Member {
					type_name: "uint8_t".into(),
					name: format!("_pad_bits_{cursor:x}_{bit_cursor}"),
					offset: cursor,
					size: 0,
					array_dim: 1,
					bit_width: Some(zeros - bit_cursor),
					suspect: false,
				});
			}
			members.push(Member {
				type_name: "uint8_t".into(),
				name: fix_and_dedup(&entry.name, &mut scope),
				offset: cursor,
				size: 0,
				array_dim: 1,
				bit_width: Some(ones.max(1)),
				suspect: false,
			});
			bit_cursor = zeros + ones.max(1);
			if bit_cursor >= 8 {
				cursor += 1;
				bit_cursor = 0;
			}
			continue;
		}

		if entry.offset > cursor {
			fill_padding(&mut members, &mut scope, cursor, entry.offset, s.addr(), ctx, probe);
			cursor = entry.offset;
		}
		if entry.size == 0 {
			#[cfg(feature = "tracing")]
			{
				let anomaly = ShapeAnomaly::ZeroSizeMember { struct_name: cpp_name.clone(), member_name: entry.name.clone() };
				tracing::warn!(%anomaly, "dropped zero-size member");
			}
			continue;
		}
		members.push(Member {
			type_name: entry.type_name,
			name: fix_and_dedup(&entry.name, &mut scope),
			offset: entry.offset,
			size: entry.size,
			array_dim: entry.array_dim,
			bit_width: None,
			suspect: false,
		});
		cursor = entry.offset + entry.size;
	}

	if total_size > cursor {
		fill_padding(&mut members, &mut scope, cursor, total_size, s.addr(), ctx, probe);
	}

	inject_synthetics(ctx, &s, &cpp_name, &mut members, &mut functions, &mut scope);

	#[cfg(feature = "tracing")]
	tracing::debug!(name = %cpp_name, members = members.len(), functions = functions.len(), "generated struct");

	StructRecord {
		addr: s.addr(),
		parent_addr: s.get_super(ctx).map(|p| p.addr()),
		full_name,
		cpp_name,
		inherited_size,
		total_size,
		members,
		functions,
		is_class,
	}
}

/// Fills `[start, end)` with padding, aligning up to 8 and consulting the
/// pointer probe first when one is active and the gap is large enough.
fn fill_padding(
	members: &mut Vec<Member>,
	scope: &mut FxHashSet<String>,
	start: u32,
	end: u32,
	owner: Addr,
	ctx: &Context,
	probe: Option<&PointerProbe>,
) {
	let mut cursor = start;
	if let Some(probe) = probe {
		if end.saturating_sub(cursor) >= 8 {
			let aligned = (cursor + 7) & !7;
			if aligned > cursor {
				push_pad(members, scope, cursor, aligned - cursor);
				cursor = aligned;
			}
			let run_len = (end - cursor) / 8 * 8;
			if run_len >= 8 {
				let found = probe.sample(ctx, owner, cursor as u64, run_len as usize);
				for slot in found {
					let name = fix_and_dedup(&slot.name, scope);
					members.push(Member {
						type_name: slot.type_name,
						name,
						offset: cursor,
						size: 8,
						array_dim: 1,
						bit_width: None,
						suspect: false,
					});
					cursor += 8;
				}
				if cursor < start + (run_len) {
					push_pad(members, scope, cursor, start + run_len - cursor);
					cursor = start + run_len;
				}
			}
		}
	}
	if end > cursor {
		push_pad(members, scope, cursor, end - cursor);
	}
}

fn push_pad(members: &mut Vec<Member>, scope: &mut FxHashSet<String>, offset: u32, size: u32) {
	if size == 0 {
		return;
	}
	let name = fix_and_dedup(&format!("pad_{offset:x}"), scope);
	members.push(Member { type_name: "char".into(), name, offset, size, array_dim: 1, bit_width: None, suspect: false });
}

fn inject_synthetics(
	ctx: &Context,
	s: &Struct,
	cpp_name: &str,
	members: &mut Vec<Member>,
	functions: &mut Vec<FunctionRecord>,
	scope: &mut FxHashSet<String>,
) {
	if cpp_name == "UWorld" {
		members.insert(
			0,
			Member {
				type_name: "static class UWorld**".into(),
				name: fix_and_dedup("GWorld", scope),
				offset: 0,
				size: 8,
				array_dim: 1,
				bit_width: None,
				suspect: false,
			},
		);
	}
	functions.push(FunctionRecord {
		full_name: format!("{cpp_name}::StaticClass"),
		name: "StaticClass".into(),
		return_type: Some("class UClass*".into()),
		params: Vec::new(),
		flags: FunctionFlags::STATIC,
		entry_point: 0,
		is_const: false,
		param_struct_name: String::new(),
	});
	if cpp_name == "USkeletalMeshComponent" {
		let _ = ctx;
		functions.push(FunctionRecord {
			full_name: format!("{cpp_name}::GetBoneWorldPos"),
			name: "GetBoneWorldPos".into(),
			return_type: Some("struct FVector".into()),
			params: vec![Parameter {
				type_name: "struct FName".into(),
				name: "BoneName".into(),
				offset: 0,
				size: 0,
				array_dim: 1,
				flags: PropertyFlags::PARM,
			}],
			flags: FunctionFlags::empty(),
			entry_point: 0,
			is_const: false,
			param_struct_name: format!("{cpp_name}_GetBoneWorldPos_Params"),
		});
	}
	let _ = s;
}

fn generate_function(ctx: &Context, func: Struct, actor_class: Option<crate::model::Class>) -> FunctionRecord {
	let full_name = func.0.get_full_name(ctx);
	let mut scope = FxHashSet::default();
	let name = fix_and_dedup(&func.0.get_name(ctx), &mut scope);
	let mut params = Vec::new();
	let mut return_type = None;
	let entries_with_flags: Vec<(PropEntry, PropertyFlags)> = func
		.children(ctx)
		.filter(|f| (*f).is_a_named(ctx, "Property", "Class CoreUObject.Property"))
		.map(|f| {
			let prop = Property::legacy(*f);
			(make_entry(ctx, &prop, actor_class), prop.flags(ctx))
		})
		.chain(func.child_properties(ctx).map(|ff| {
			let prop = Property::new_style(ff);
			(make_entry(ctx, &prop, actor_class), prop.flags(ctx))
		}))
		.collect();

	let raw_flags: u64 = crate::reader::read_as(ctx.reader(), func.addr() + ctx.offsets.function.flags as u64);
	let flags = FunctionFlags::from_bits_truncate(raw_flags);
	let entry_point: Addr = crate::reader::read_as(ctx.reader(), func.addr() + ctx.offsets.function.func as u64);

	for (entry, pflags) in entries_with_flags {
		let mut type_name = entry.type_name;
		if pflags.contains(PropertyFlags::RETURN_PARM) {
			return_type = Some(type_name);
			continue;
		}
		if !pflags.contains(PropertyFlags::PARM) {
			continue;
		}
		if entry.array_dim > 1 {
			type_name = format!("{type_name}*");
		} else if pflags.contains(PropertyFlags::REFERENCE_PARM) {
			type_name = format!("{type_name}&");
		}
		params.push(Parameter {
			type_name,
			name: fix_and_dedup(&entry.name, &mut scope),
			offset: entry.offset,
			size: entry.size,
			array_dim: entry.array_dim,
			flags: pflags,
		});
	}

	let owner_name = func.0.get_outer(ctx).get_name(ctx);
	let param_struct_name = format!("{owner_name}_{name}_Params");
	let name = if flags.contains(FunctionFlags::STATIC) { format!("STATIC_{name}") } else { name };
	FunctionRecord {
		param_struct_name,
		full_name,
		name,
		return_type,
		params,
		flags,
		entry_point,
		is_const: flags.contains(FunctionFlags::CONST),
	}
}

/// Reads the enum's `Names` array and assigns values positionally,
/// deliberately ignoring whatever value the engine stored (observed to be
/// unreliable on some targets).
pub fn generate_enum(ctx: &Context, e: Enum) -> Option<EnumRecord> {
	let full_name = e.0.get_full_name(ctx);
	let cpp_name = e.0.get_name(ctx).to_string();
	let prefix = format!("{cpp_name}::");
	let names_base = e.addr() + ctx.offsets.enum_.names as u64;
	// Each entry is a (name index, name number) FName pair, stride-aligned
	// to 16 bytes regardless of the name pool's own entry stride.
	const PAIR_STRIDE: u64 = 16;

	let mut members = Vec::new();
	let mut scope = FxHashSet::default();
	for i in 0..4096u64 {
		let pair_addr = names_base + i * PAIR_STRIDE;
		let index: u32 = crate::reader::read_as(ctx.reader(), pair_addr);
		let number: u32 = crate::reader::read_as(ctx.reader(), pair_addr + 4);
		if index == 0 && i > 0 {
			break;
		}
		let raw_name = ctx.names.resolve(index, number);
		if raw_name.is_empty() {
			break;
		}
		let stripped = raw_name.strip_prefix(&prefix).unwrap_or(&raw_name);
		let ident = fix_and_dedup(stripped, &mut scope);
		members.push(format!("{ident} = {i}"));
	}

	if members.is_empty() {
		return None;
	}
	let underlying = if members.len() <= 257 { "uint8_t" } else { "int32_t" };
	Some(EnumRecord { full_name, cpp_name, members, underlying })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn push_pad_skips_zero_length_gaps() {
		let mut members = Vec::new();
		let mut scope = FxHashSet::default();
		push_pad(&mut members, &mut scope, 4, 0);
		assert!(members.is_empty());
	}

	#[test]
	fn push_pad_names_are_deduplicated() {
		let mut members = Vec::new();
		let mut scope = FxHashSet::default();
		push_pad(&mut members, &mut scope, 4, 4);
		push_pad(&mut members, &mut scope, 4, 4);
		assert_eq!(members[0].name, "pad_4");
		assert_eq!(members[1].name, "pad_4_2");
	}
}
