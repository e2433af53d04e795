use std::cell::RefCell;

use derivative::Derivative;
use fxhash::FxHashMap;

use crate::model::{Class, Object};
use crate::names::NamePool;
use crate::objects::ObjectTable;
use crate::offsets::EngineOffsets;
use crate::reader::{Addr, MemoryReader, ModuleImage};

/// Everything downstream of the raw reader that is process-wide and
/// immutable once constructed: the offset record, the decoded name pool,
/// the object table snapshot, and a cache of well-known engine classes
/// resolved by full name on first use.
///
/// Modeled as a single explicit value rather than a set of global statics,
/// per the observation that the source tool's name pool / object array /
/// static-class cache are all singletons that never change after startup:
/// an explicit `Context` gets the same sharing without any global mutable
/// state or locking.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Context<'r> {
	#[derivative(Debug = "ignore")]
	reader: &'r dyn MemoryReader,
	#[derivative(Debug = "ignore")]
	pub offsets: &'r EngineOffsets,
	#[derivative(Debug = "ignore")]
	pub image: Option<ModuleImage>,
	pub names: NamePool<'r>,
	pub objects: ObjectTable<'r>,
	#[derivative(Debug = "ignore")]
	static_classes: RefCell<FxHashMap<&'static str, Class>>,
}

impl<'r> Context<'r> {
	pub fn new(
		reader: &'r dyn MemoryReader,
		offsets: &'r EngineOffsets,
		names: NamePool<'r>,
		objects: ObjectTable<'r>,
	) -> Self {
		Self { reader, offsets, image: None, names, objects, static_classes: RefCell::new(FxHashMap::default()) }
	}

	pub fn with_image(mut self, image: ModuleImage) -> Self {
		self.image = Some(image);
		self
	}

	pub fn reader(&self) -> &'r dyn MemoryReader {
		self.reader
	}

	/// Resolves a well-known engine class by its full name, caching the
	/// result under `key` so repeated lookups (one per property/member
	/// touching that class) are free after the first.
	pub fn static_class(&self, key: &'static str, full_name: &str) -> Option<Class> {
		if let Some(hit) = self.static_classes.borrow().get(key) {
			return Some(*hit);
		}
		let found = self.objects.find(self, full_name).map(Class::from);
		if let Some(class) = found {
			self.static_classes.borrow_mut().insert(key, class);
		}
		found
	}

	pub fn addr_of(&self, object: Object) -> Addr {
		object.addr()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::offsets::default_offsets;
	use crate::reader::FakeReader;

	#[test]
	fn static_class_lookup_is_cached() {
		let offsets_table = default_offsets();
		let offsets = offsets_table.get("UE4_25").unwrap();
		let mut reader = FakeReader::new();
		let names_block = reader.alloc(0x1000_0000, 0x1000);
		let names = NamePool::new(&reader, offsets, vec![names_block]);
		let objects = ObjectTable::new(&reader, offsets, vec![], 0);
		let ctx = Context::new(&reader, offsets, names, objects);
		assert!(ctx.static_class("Engine.Actor", "Class CoreUObject.Actor").is_none());
		assert!(ctx.static_class("Engine.Actor", "Class CoreUObject.Actor").is_none());
	}
}
