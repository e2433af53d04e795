use crate::context::Context;
use crate::model::{Class, Object};
use crate::offsets::EngineOffsets;
use crate::reader::{read_as, Addr, MemoryReader};

/// A snapshot of the target's object array: a flat list of chunk base
/// addresses plus how many live objects each chunk holds. The engine's own
/// array is two-level (a directory of chunks, each a fixed-size run of
/// object pointers); this is the Rust-side mirror of that.
pub struct ObjectTable<'r> {
	reader: &'r dyn MemoryReader,
	offsets: &'r EngineOffsets,
	chunks: Vec<Addr>,
	count: usize,
}

impl<'r> std::fmt::Debug for ObjectTable<'r> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ObjectTable").field("chunks", &self.chunks.len()).field("count", &self.count).finish()
	}
}

impl<'r> ObjectTable<'r> {
	pub fn new(reader: &'r dyn MemoryReader, offsets: &'r EngineOffsets, chunks: Vec<Addr>, count: usize) -> Self {
		Self { reader, offsets, chunks, count }
	}

	pub fn len(&self) -> usize {
		self.count
	}

	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	pub fn get(&self, index: u32) -> Option<Object> {
		if index as usize >= self.count {
			return None;
		}
		let chunk_size = self.offsets.object_array_chunk_size as usize;
		let chunk = *self.chunks.get(index as usize / chunk_size)?;
		let slot = chunk + (index as usize % chunk_size) as u64 * std::mem::size_of::<Addr>() as u64;
		let addr: Addr = read_as(self.reader, slot);
		(addr != 0).then(|| Object::from_addr(addr))
	}

	pub fn find(&self, ctx: &Context, full_name: &str) -> Option<Object> {
		let mut found = None;
		self.dump(ctx, |object, _| {
			if object.get_full_name(ctx) == full_name {
				found = Some(object);
				return true;
			}
			false
		});
		found
	}

	/// Calls `callback` for every live object whose class is `class`.
	/// Iteration stops as soon as `callback` returns `true`.
	pub fn for_each_of_class(&self, ctx: &Context, class: Class, mut callback: impl FnMut(Object) -> bool) {
		self.dump(ctx, |object, _| object.get_class(ctx) == class && callback(object));
	}

	/// Walks every slot in the table, calling `callback(object, index)`.
	/// `callback` returning `true` stops the walk early.
	pub fn dump(&self, ctx: &Context, mut callback: impl FnMut(Object, u32) -> bool) {
		let _ = ctx;
		#[cfg(feature = "tracing")]
		let mut visited = 0u32;
		for index in 0..self.count as u32 {
			let Some(object) = self.get(index) else { continue };
			#[cfg(feature = "tracing")]
			{
				visited += 1;
			}
			if callback(object, index) {
				#[cfg(feature = "tracing")]
				tracing::debug!(visited, total = self.count, "object table walk stopped early");
				return;
			}
		}
		#[cfg(feature = "tracing")]
		tracing::debug!(visited, total = self.count, "object table walk complete");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::offsets::default_offsets;
	use crate::reader::FakeReader;

	#[test]
	fn get_returns_none_for_a_null_slot() {
		let table_doc = default_offsets();
		let offsets = table_doc.get("UE4_25").unwrap();
		let mut reader = FakeReader::new();
		let chunk = reader.alloc(0x3000_0000, 0x1000);
		reader.write_pod(chunk, 0x9999_0000u64);
		let table = ObjectTable::new(&reader, offsets, vec![chunk], 2);
		assert_eq!(table.get(0), Some(Object::from_addr(0x9999_0000)));
		assert_eq!(table.get(1), None);
		assert_eq!(table.get(5), None);
	}
}
