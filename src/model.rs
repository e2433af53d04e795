use std::rc::Rc;

use crate::context::Context;
use crate::reader::{read_as, Addr};

/// A reflected entity, represented purely by its address in the target.
/// Every richer handle below (`Field`, `Struct`, `Class`, ...) is a
/// reinterpretation of the same address; none of them own any memory.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Object(Addr);

impl std::fmt::Debug for Object {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Object({:#x})", self.0)
	}
}

impl Object {
	pub const NULL: Object = Object(0);

	pub fn from_addr(addr: Addr) -> Self {
		Self(addr)
	}

	pub fn addr(&self) -> Addr {
		self.0
	}

	pub fn is_null(&self) -> bool {
		self.0 == 0
	}

	pub fn get_index(&self, ctx: &Context) -> u32 {
		read_as(ctx.reader(), self.0 + ctx.offsets.object.index as u64)
	}

	pub fn get_class(&self, ctx: &Context) -> Class {
		Class(Object(read_as::<Addr>(ctx.reader(), self.0 + ctx.offsets.object.class as u64)))
	}

	pub fn get_outer(&self, ctx: &Context) -> Object {
		Object(read_as(ctx.reader(), self.0 + ctx.offsets.object.outer as u64))
	}

	fn name_index(&self, ctx: &Context) -> (u32, u32) {
		let base = self.0 + ctx.offsets.object.name as u64;
		let index: u32 = read_as(ctx.reader(), base);
		let number: u32 = read_as(ctx.reader(), base + ctx.offsets.fname.number as u64);
		(index, number)
	}

	/// The name of this object alone, with only the trailing path component
	/// kept (matching the engine API's own `GetName()` behaviour).
	pub fn get_name(&self, ctx: &Context) -> Rc<str> {
		let (index, number) = self.name_index(ctx);
		ctx.names.resolve(index, number)
	}

	/// The outermost non-null container of this object.
	pub fn get_package(&self, ctx: &Context) -> Object {
		let mut outer = self.get_outer(ctx);
		if outer.is_null() {
			return *self;
		}
		loop {
			let next = outer.get_outer(ctx);
			if next.is_null() {
				return outer;
			}
			outer = next;
		}
	}

	/// `ClassName Outer1.Outer2...Self`, matching the engine's own
	/// `GetFullName()`.
	pub fn get_full_name(&self, ctx: &Context) -> String {
		let class_name = self.get_class(ctx).0.get_name(ctx);
		let mut outers = Vec::new();
		let mut outer = self.get_outer(ctx);
		while !outer.is_null() {
			outers.push(outer.get_name(ctx));
			outer = outer.get_outer(ctx);
		}
		let mut out = String::with_capacity(32);
		out.push_str(&class_name);
		out.push(' ');
		for part in outers.iter().rev() {
			out.push_str(part);
			out.push('.');
		}
		out.push_str(&self.get_name(ctx));
		out
	}

	/// Walks this object's class-parent chain looking for `class`.
	pub fn is_a(&self, ctx: &Context, class: Class) -> bool {
		let mut cur = Some(Struct(self.get_class(ctx).0));
		while let Some(s) = cur {
			if s.0 == class.0 {
				return true;
			}
			cur = s.get_super(ctx);
		}
		false
	}

	/// Looks up a well-known engine class by full name (cached under `key`)
	/// and tests `is_a` against it in one step.
	pub fn is_a_named(&self, ctx: &Context, key: &'static str, full_name: &str) -> bool {
		match ctx.static_class(key, full_name) {
			Some(class) => self.is_a(ctx, class),
			None => false,
		}
	}
}

macro_rules! handle {
	($name:ident) => {
		#[derive(Clone, Copy, PartialEq, Eq, Hash)]
		pub struct $name(pub Object);

		impl std::fmt::Debug for $name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(f, concat!(stringify!($name), "({:#x})"), self.0.addr())
			}
		}

		impl std::ops::Deref for $name {
			type Target = Object;
			fn deref(&self) -> &Object {
				&self.0
			}
		}

		impl From<Object> for $name {
			fn from(o: Object) -> Self {
				Self(o)
			}
		}

		impl From<$name> for Object {
			fn from(v: $name) -> Self {
				v.0
			}
		}

		paste::paste! {
			impl Object {
				pub fn [<as_ $name:snake>](self) -> $name {
					$name(self)
				}
			}
		}
	};
}

handle!(Field);
handle!(Struct);
handle!(Class);
handle!(Enum);
handle!(Function);

impl Struct {
	pub fn get_super(&self, ctx: &Context) -> Option<Struct> {
		let addr: Addr = read_as(ctx.reader(), self.0.addr() + ctx.offsets.struct_.super_ as u64);
		(addr != 0).then(|| Struct(Object(addr)))
	}

	pub fn properties_size(&self, ctx: &Context) -> u32 {
		read_as(ctx.reader(), self.0.addr() + ctx.offsets.struct_.properties_size as u64)
	}

	/// Legacy UField-style children, linked through `Field::next`.
	pub fn children(&self, ctx: &Context) -> FieldIter {
		let head: Addr = read_as(ctx.reader(), self.0.addr() + ctx.offsets.struct_.children as u64);
		FieldIter { ctx, next: head }
	}

	/// New-style FField properties, linked through `FField::next`.
	pub fn child_properties(&self, ctx: &Context) -> FFieldIter {
		let head: Addr = read_as(ctx.reader(), self.0.addr() + ctx.offsets.struct_.child_properties as u64);
		FFieldIter { ctx, next: head }
	}

	/// Class-name prefix used by the engine's own naming convention:
	/// `A` for Actor descendants, `U` for other UClass-derived types, `F`
	/// for plain structs.
	pub fn cpp_name(&self, ctx: &Context, actor_class: Option<Class>) -> String {
		let raw = self.0.get_name(ctx);
		let prefix = match actor_class {
			Some(actor) if self.is_a_struct(ctx, actor) => "A",
			_ if self.0.get_class(ctx).0.get_name(ctx).as_ref() == "Class" => "U",
			_ => "F",
		};
		format!("{prefix}{raw}")
	}

	fn is_a_struct(&self, ctx: &Context, target: Class) -> bool {
		let mut cur = Some(*self);
		while let Some(s) = cur {
			if s.0 == target.0 {
				return true;
			}
			cur = s.get_super(ctx);
		}
		false
	}
}

pub struct FieldIter<'a> {
	ctx: &'a Context<'a>,
	next: Addr,
}

impl<'a> Iterator for FieldIter<'a> {
	type Item = Field;
	fn next(&mut self) -> Option<Field> {
		if self.next == 0 {
			return None;
		}
		let current = Field(Object(self.next));
		self.next = read_as(self.ctx.reader(), self.next + self.ctx.offsets.field.next as u64);
		Some(current)
	}
}

/// An FField-style handle: unlike `Object`, its name and next-pointer live
/// at FField offsets rather than UObject/Field offsets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FFieldHandle(pub Addr);

impl FFieldHandle {
	pub fn get_name(&self, ctx: &Context) -> Rc<str> {
		let index: u32 = read_as(ctx.reader(), self.0 + ctx.offsets.ffield.name as u64);
		ctx.names.resolve(index, 0)
	}

	pub fn class_addr(&self, ctx: &Context) -> Addr {
		read_as(ctx.reader(), self.0 + ctx.offsets.ffield.class as u64)
	}
}

pub struct FFieldIter<'a> {
	ctx: &'a Context<'a>,
	next: Addr,
}

impl<'a> Iterator for FFieldIter<'a> {
	type Item = FFieldHandle;
	fn next(&mut self) -> Option<FFieldHandle> {
		if self.next == 0 {
			return None;
		}
		let current = FFieldHandle(self.next);
		self.next = read_as(self.ctx.reader(), self.next + self.ctx.offsets.ffield.next as u64);
		Some(current)
	}
}

/// Which property hierarchy a [`Property`] handle belongs to. The engine
/// exposes two parallel shapes with identical semantics but different
/// physical layout; the resolver dispatches on this tag rather than trying
/// to unify them into one physical struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyStyle {
	/// The original `UProperty` hierarchy, reflected as UObject-derived
	/// `Field`s and dispatched by `is_a`.
	Legacy,
	/// The newer `FProperty`/`FField` hierarchy, dispatched by class-name
	/// hash rather than a UObject class chain.
	New,
}

/// A reflected property descriptor, tagged with which hierarchy produced
/// it so the resolver (and this handle's own accessors) know which offset
/// sub-record to read through.
#[derive(Clone, Copy, Debug)]
pub struct Property {
	pub addr: Addr,
	pub style: PropertyStyle,
}

impl Property {
	pub fn legacy(object: Object) -> Self {
		Self { addr: object.addr(), style: PropertyStyle::Legacy }
	}

	pub fn new_style(field: FFieldHandle) -> Self {
		Self { addr: field.0, style: PropertyStyle::New }
	}

	fn offsets<'o>(&self, ctx: &'o Context) -> &'o crate::offsets::PropertyOffsets {
		match self.style {
			PropertyStyle::Legacy => &ctx.offsets.property,
			PropertyStyle::New => &ctx.offsets.fproperty,
		}
	}

	pub fn class_name(&self, ctx: &Context) -> Rc<str> {
		match self.style {
			PropertyStyle::Legacy => Object(self.addr).get_class(ctx).0.get_name(ctx),
			PropertyStyle::New => {
				let class_addr = FFieldHandle(self.addr).class_addr(ctx);
				Object(class_addr).get_name(ctx)
			},
		}
	}

	pub fn get_name(&self, ctx: &Context) -> Rc<str> {
		match self.style {
			PropertyStyle::Legacy => Object(self.addr).get_name(ctx),
			PropertyStyle::New => FFieldHandle(self.addr).get_name(ctx),
		}
	}

	pub fn array_dim(&self, ctx: &Context) -> u32 {
		read_as(ctx.reader(), self.addr + self.offsets(ctx).array_dim as u64)
	}

	pub fn element_size(&self, ctx: &Context) -> u32 {
		read_as(ctx.reader(), self.addr + self.offsets(ctx).element_size as u64)
	}

	pub fn offset(&self, ctx: &Context) -> u32 {
		read_as(ctx.reader(), self.addr + self.offsets(ctx).offset as u64)
	}

	pub fn size(&self, ctx: &Context) -> u32 {
		self.array_dim(ctx) * self.element_size(ctx)
	}

	pub fn flags(&self, ctx: &Context) -> crate::flags::PropertyFlags {
		let raw: u64 = read_as(ctx.reader(), self.addr + self.offsets(ctx).flags as u64);
		crate::flags::PropertyFlags::from_bits_truncate(raw)
	}

	/// The byte holding a `BoolProperty`'s field mask, read at
	/// `size_of_self + 3` as in the source tool.
	pub fn bool_mask(&self, ctx: &Context) -> u8 {
		read_as(ctx.reader(), self.addr + self.offsets(ctx).size_of_self as u64 + 3)
	}

	/// The trailing pointer slot every container/struct/object property
	/// carries immediately after its common header: the `Inner` property
	/// for arrays/sets, the key for maps, the referenced struct, enum, or
	/// class for the corresponding property kinds.
	fn trailing_ptr(&self, ctx: &Context, extra: u64) -> Addr {
		read_as(ctx.reader(), self.addr + self.offsets(ctx).size_of_self as u64 + extra)
	}

	pub fn inner(&self, ctx: &Context) -> Property {
		Property { addr: self.trailing_ptr(ctx, 0), style: self.style }
	}

	pub fn map_key_value(&self, ctx: &Context) -> (Property, Property) {
		let key = Property { addr: self.trailing_ptr(ctx, 0), style: self.style };
		let value = Property { addr: self.trailing_ptr(ctx, 8), style: self.style };
		(key, value)
	}

	pub fn struct_type(&self, ctx: &Context) -> Struct {
		Struct(Object(self.trailing_ptr(ctx, 0)))
	}

	pub fn enum_type(&self, ctx: &Context) -> Option<Enum> {
		let addr = self.trailing_ptr(ctx, 0);
		(addr != 0).then(|| Enum(Object(addr)))
	}

	pub fn class_meta(&self, ctx: &Context) -> Class {
		Class(Object(self.trailing_ptr(ctx, 0)))
	}

	pub fn referenced_struct(&self, ctx: &Context) -> Struct {
		Struct(Object(self.trailing_ptr(ctx, 0)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::names::NamePool;
	use crate::objects::ObjectTable;
	use crate::offsets::default_offsets;
	use crate::reader::FakeReader;

	fn write_name(reader: &mut FakeReader, offsets: &crate::offsets::EngineOffsets, block: Addr, cursor: &mut Addr, text: &str) -> u32 {
		let header =
			((text.len() as u16) << offsets.name_entry.len_bit) | (0u16 << offsets.name_entry.wide_bit);
		reader.write_pod(*cursor, header);
		reader.write(*cursor + offsets.name_entry.header_size as u64, text.as_bytes());
		let index = ((*cursor - block) / offsets.name_entry.stride as u64) as u32;
		let size = offsets.name_entry.header_size + text.len() as u32;
		let aligned = (size + offsets.name_entry.stride - 1) / offsets.name_entry.stride * offsets.name_entry.stride;
		*cursor += aligned as u64;
		index
	}

	#[test]
	fn full_name_chains_through_outers() {
		let table = default_offsets();
		let offsets = table.get("UE4_25").unwrap();
		let mut reader = FakeReader::new();
		let names_block = reader.alloc(0x1000_0000, 0x2000);
		let mut cursor = names_block;

		let class_idx = write_name(&mut reader, offsets, names_block, &mut cursor, "Class");
		let pkg_idx = write_name(&mut reader, offsets, names_block, &mut cursor, "Engine");
		let self_idx = write_name(&mut reader, offsets, names_block, &mut cursor, "Pawn");

		reader.alloc(0x2000_0000, 0x100); // class object
		reader.alloc(0x2000_1000, 0x100); // package object
		reader.alloc(0x2000_2000, 0x100); // self object

		reader.write_pod(0x2000_0000 + offsets.object.name as u64, class_idx);
		reader.write_pod(0x2000_1000 + offsets.object.name as u64, pkg_idx);
		reader.write_pod(0x2000_2000 + offsets.object.name as u64, self_idx);
		reader.write_pod(0x2000_2000 + offsets.object.class as u64, 0x2000_0000u64);
		reader.write_pod(0x2000_2000 + offsets.object.outer as u64, 0x2000_1000u64);
		// the "Class" metaclass names itself "Class"
		reader.write_pod(0x2000_0000 + offsets.object.class as u64, 0x2000_0000u64);
		reader.write_pod(0x2000_0000 + offsets.object.outer as u64, 0u64);
		reader.write_pod(0x2000_1000 + offsets.object.outer as u64, 0u64);

		let names = NamePool::new(&reader, offsets, vec![names_block]);
		let objects = ObjectTable::new(&reader, offsets, vec![], 0);
		let ctx = Context::new(&reader, offsets, names, objects);

		let pawn = Object::from_addr(0x2000_2000);
		assert_eq!(pawn.get_full_name(&ctx), "Class Engine.Pawn");
	}
}
