//! Samples live instances of a class across a padding run to discover
//! pointer-typed fields the reflection metadata doesn't describe directly.

use bumpalo::Bump;

use crate::context::Context;
use crate::model::{Class, Object, Struct};
use crate::reader::Addr;

#[derive(Debug, Clone)]
pub struct DiscoveredPointer {
	pub type_name: String,
	pub name: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
	Undecided,
	Pointer(Addr),
	NotPointer,
}

/// Bound to the class whose instances it samples and the object table used
/// to find them; constructing one per owning struct keeps each probe's
/// scratch state scoped to a single padding-run call.
pub struct PointerProbe<'ctx> {
	pub class: Class,
	pub max_instances: usize,
	/// The engine's `AActor` class, forwarded to every discovered target's
	/// name resolution so actor-derived targets render with the `A` prefix.
	actor_class: Option<Class>,
	_marker: std::marker::PhantomData<&'ctx ()>,
}

impl<'ctx> PointerProbe<'ctx> {
	pub fn new(class: Class, actor_class: Option<Class>) -> Self {
		Self { class, max_instances: 64, actor_class, _marker: std::marker::PhantomData }
	}

	/// Samples `len` bytes at `start` (relative to each live instance) and
	/// returns every slot that consistently reads as a valid pointer.
	pub fn sample(&self, ctx: &Context, _owner_struct_addr: Addr, start: u64, len: usize) -> Vec<DiscoveredPointer> {
		// Per-call scratch only; every slot is either discarded or copied out
		// into an owned `DiscoveredPointer` before the arena is dropped.
		let arena = Bump::new();
		let slot_count = len / 8;
		let mut slots = bumpalo::vec![in &arena; Slot::Undecided; slot_count];
		let mut sampled_values = bumpalo::vec![in &arena; 0u64; slot_count];
		let mut instances_seen = 0usize;

		ctx.objects.for_each_of_class(ctx, self.class, |instance| {
			instances_seen += 1;
			let mut scratch = bumpalo::vec![in &arena; 0u8; len];
			if !ctx.reader().read(instance.addr() + start, &mut scratch) {
				return instances_seen >= self.max_instances;
			}
			let mut all_decided = true;
			for i in 0..slot_count {
				if slots[i] != Slot::Undecided {
					continue;
				}
				let bytes: [u8; 8] = scratch[i * 8..i * 8 + 8].try_into().unwrap();
				let value = u64::from_ne_bytes(bytes);
				if value == 0 {
					slots[i] = Slot::NotPointer;
					continue;
				}
				let mut probe_buf = [0u8; 8];
				if ctx.reader().read(value, &mut probe_buf) {
					slots[i] = Slot::Pointer(value);
					sampled_values[i] = value;
				} else {
					slots[i] = Slot::NotPointer;
				}
				all_decided = false;
			}
			(all_decided || instances_seen >= self.max_instances) && slots.iter().all(|s| *s != Slot::Undecided)
		});

		let mut found = Vec::new();
		for (i, slot) in slots.iter().enumerate() {
			if let Slot::Pointer(value) = slot {
				let target = Object::from_addr(*value);
				let (type_name, name) = match resolve_target(ctx, target, self.actor_class) {
					Some((ty, n)) => (ty, n),
					None => ("void*".to_string(), format!("ptr_{value:x}")),
				};
				let _ = sampled_values[i];
				found.push(DiscoveredPointer { type_name, name });
			}
		}
		#[cfg(feature = "tracing")]
		tracing::debug!(hits = found.len(), instances_seen, slot_count, "pointer probe sampled a padding run");
		found
	}
}

fn resolve_target(ctx: &Context, target: Object, actor_class: Option<Class>) -> Option<(String, String)> {
	let class = target.get_class(ctx);
	if class.0.get_name(ctx).is_empty() {
		return None;
	}
	let name = target.get_name(ctx);
	if name.is_empty() {
		return None;
	}
	let cpp_name = Struct(class.0).cpp_name(ctx, actor_class);
	Some((format!("struct {cpp_name}*"), name.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::names::NamePool;
	use crate::objects::ObjectTable;
	use crate::offsets::default_offsets;
	use crate::reader::FakeReader;

	#[test]
	fn a_consistently_null_slot_never_becomes_a_pointer() {
		let table = default_offsets();
		let offsets = table.get("UE4_25").unwrap();
		let mut reader = FakeReader::new();
		let names_block = reader.alloc(0x1000_0000, 0x100);
		let instance = reader.alloc(0x2000_0000, 0x100);
		let chunk = reader.alloc(0x3000_0000, 0x100);
		reader.write_pod(chunk, instance);

		let names = NamePool::new(&reader, offsets, vec![names_block]);
		let objects = ObjectTable::new(&reader, offsets, vec![chunk], 1);
		let ctx = Context::new(&reader, offsets, names, objects);

		let class = Class(Object::from_addr(0));
		let probe = PointerProbe::new(class, None);
		// class comparison will never match (every object's class reads 0
		// in this fixture), so for_each_of_class visits nothing and the
		// probe must report no discovered pointers rather than panicking.
		let found = probe.sample(&ctx, 0, 0x40, 8);
		assert!(found.is_empty());
	}
}
