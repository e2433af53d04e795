//! Maps a reflected property descriptor to a semantic kind and a rendered
//! C++-style type string, for both property hierarchies the target may
//! expose.

use crate::context::Context;
use crate::model::{Class, Property, PropertyStyle, Struct};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
	Int8,
	Int16,
	Int32,
	Int64,
	UInt8,
	UInt16,
	UInt32,
	UInt64,
	Float,
	Double,
	Bool,
	Byte,
	Enum,
	Struct,
	Str,
	Name,
	Text,
	Object,
	WeakObject,
	SoftObject,
	Class,
	SoftClass,
	Interface,
	Array,
	Set,
	Map,
	Delegate,
	MulticastDelegate,
	FieldPath,
	Unknown,
}

const fn fnv1a(bytes: &[u8]) -> u64 {
	let mut hash = 0xcbf29ce484222325u64;
	let mut i = 0;
	while i < bytes.len() {
		hash ^= bytes[i] as u64;
		hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
		i += 1;
	}
	hash
}

const HASH_INT8: u64 = fnv1a(b"FInt8Property");
const HASH_INT16: u64 = fnv1a(b"FInt16Property");
const HASH_INT: u64 = fnv1a(b"FIntProperty");
const HASH_INT64: u64 = fnv1a(b"FInt64Property");
const HASH_BYTE: u64 = fnv1a(b"FByteProperty");
const HASH_UINT16: u64 = fnv1a(b"FUInt16Property");
const HASH_UINT32: u64 = fnv1a(b"FUInt32Property");
const HASH_UINT64: u64 = fnv1a(b"FUInt64Property");
const HASH_FLOAT: u64 = fnv1a(b"FFloatProperty");
const HASH_DOUBLE: u64 = fnv1a(b"FDoubleProperty");
const HASH_BOOL: u64 = fnv1a(b"FBoolProperty");
const HASH_ENUM: u64 = fnv1a(b"FEnumProperty");
const HASH_STRUCT: u64 = fnv1a(b"FStructProperty");
const HASH_STR: u64 = fnv1a(b"FStrProperty");
const HASH_NAME: u64 = fnv1a(b"FNameProperty");
const HASH_TEXT: u64 = fnv1a(b"FTextProperty");
const HASH_OBJECT: u64 = fnv1a(b"FObjectProperty");
const HASH_WEAK_OBJECT: u64 = fnv1a(b"FWeakObjectProperty");
const HASH_SOFT_OBJECT: u64 = fnv1a(b"FSoftObjectProperty");
const HASH_CLASS: u64 = fnv1a(b"FClassProperty");
const HASH_SOFT_CLASS: u64 = fnv1a(b"FSoftClassProperty");
const HASH_INTERFACE: u64 = fnv1a(b"FInterfaceProperty");
const HASH_ARRAY: u64 = fnv1a(b"FArrayProperty");
const HASH_SET: u64 = fnv1a(b"FSetProperty");
const HASH_MAP: u64 = fnv1a(b"FMapProperty");
const HASH_DELEGATE: u64 = fnv1a(b"FDelegateProperty");
const HASH_MULTICAST_DELEGATE: u64 = fnv1a(b"FMulticastInlineDelegateProperty");
const HASH_FIELD_PATH: u64 = fnv1a(b"FFieldPathProperty");

/// Resolves `property` to `(kind, rendered type string)`, recursing into
/// container element types as needed. `actor_class` is forwarded to every
/// nested `Struct`/`Object`/`Class` name lookup so referenced types pick up
/// the same `A`/`U`/`F` prefixing as the struct being generated.
pub fn resolve(property: &Property, ctx: &Context, actor_class: Option<Class>) -> (PropertyKind, String) {
	match property.style {
		PropertyStyle::Legacy => resolve_legacy(property, ctx, actor_class),
		PropertyStyle::New => resolve_new(property, ctx, actor_class),
	}
}

macro_rules! is_a {
	($obj:expr, $ctx:expr, $name:literal) => {
		$obj.is_a_named($ctx, $name, concat!("Class CoreUObject.", $name))
	};
}

fn resolve_legacy(property: &Property, ctx: &Context, actor_class: Option<Class>) -> (PropertyKind, String) {
	use crate::model::Object;
	let obj = Object::from_addr(property.addr);

	if is_a!(obj, ctx, "Int8Property") {
		return (PropertyKind::Int8, "int8_t".into());
	}
	if is_a!(obj, ctx, "Int16Property") {
		return (PropertyKind::Int16, "int16_t".into());
	}
	if is_a!(obj, ctx, "IntProperty") {
		return (PropertyKind::Int32, "int32_t".into());
	}
	if is_a!(obj, ctx, "Int64Property") {
		return (PropertyKind::Int64, "int64_t".into());
	}
	if is_a!(obj, ctx, "UInt16Property") {
		return (PropertyKind::UInt16, "uint16_t".into());
	}
	if is_a!(obj, ctx, "UInt32Property") {
		return (PropertyKind::UInt32, "uint32_t".into());
	}
	if is_a!(obj, ctx, "UInt64Property") {
		return (PropertyKind::UInt64, "uint64_t".into());
	}
	if is_a!(obj, ctx, "FloatProperty") {
		return (PropertyKind::Float, "float".into());
	}
	if is_a!(obj, ctx, "DoubleProperty") {
		return (PropertyKind::Double, "double".into());
	}
	if is_a!(obj, ctx, "BoolProperty") {
		let mask = property.bool_mask(ctx);
		return match mask {
			0xFF => (PropertyKind::Bool, "bool".into()),
			_ => (PropertyKind::Bool, "char".into()),
		};
	}
	if is_a!(obj, ctx, "EnumProperty") {
		return match property.enum_type(ctx) {
			Some(e) => (PropertyKind::Enum, format!("enum class {}", e.0.get_name(ctx))),
			None => (PropertyKind::Byte, "char".into()),
		};
	}
	if is_a!(obj, ctx, "ByteProperty") {
		return match property.enum_type(ctx) {
			Some(e) => (PropertyKind::Enum, format!("enum class {}", e.0.get_name(ctx))),
			None => (PropertyKind::Byte, "char".into()),
		};
	}
	if is_a!(obj, ctx, "StructProperty") {
		let s = property.struct_type(ctx);
		return (PropertyKind::Struct, format!("struct {}", s.cpp_name(ctx, actor_class)));
	}
	if is_a!(obj, ctx, "StrProperty") {
		// Deliberate: the source tool's `UE_UStrProperty::GetType` returns
		// `TextProperty`, almost certainly a transcription bug. Emit the
		// correct kind here instead of reproducing it.
		return (PropertyKind::Str, "struct FString".into());
	}
	if is_a!(obj, ctx, "NameProperty") {
		return (PropertyKind::Name, "struct FName".into());
	}
	if is_a!(obj, ctx, "TextProperty") {
		return (PropertyKind::Text, "struct FText".into());
	}
	if is_a!(obj, ctx, "ArrayProperty") {
		let (_, inner) = resolve(&property.inner(ctx), ctx, actor_class);
		return (PropertyKind::Array, format!("struct TArray<{inner}>"));
	}
	if is_a!(obj, ctx, "SetProperty") {
		let (_, inner) = resolve(&property.inner(ctx), ctx, actor_class);
		return (PropertyKind::Set, format!("struct TSet<{inner}>"));
	}
	if is_a!(obj, ctx, "MapProperty") {
		let (key, value) = property.map_key_value(ctx);
		let (_, key_ty) = resolve(&key, ctx, actor_class);
		let (_, val_ty) = resolve(&value, ctx, actor_class);
		return (PropertyKind::Map, format!("struct TMap<{key_ty}, {val_ty}>"));
	}
	if is_a!(obj, ctx, "WeakObjectProperty") {
		let c = property.class_meta(ctx);
		return (
			PropertyKind::WeakObject,
			format!("struct TWeakObjectPtr<{}>", Struct(c.0).cpp_name(ctx, actor_class)),
		);
	}
	if is_a!(obj, ctx, "SoftObjectProperty") {
		return (PropertyKind::SoftObject, "struct TSoftObjectPtr<UObject>".into());
	}
	if is_a!(obj, ctx, "SoftClassProperty") {
		return (PropertyKind::SoftClass, "struct TSoftClassPtr<UObject>".into());
	}
	if is_a!(obj, ctx, "ClassProperty") {
		let c = property.class_meta(ctx);
		return (PropertyKind::Class, format!("class {}*", Struct(c.0).cpp_name(ctx, actor_class)));
	}
	if is_a!(obj, ctx, "ObjectProperty") {
		let s = property.referenced_struct(ctx);
		return (PropertyKind::Object, format!("class {}*", s.cpp_name(ctx, actor_class)));
	}
	if is_a!(obj, ctx, "InterfaceProperty") {
		let s = property.referenced_struct(ctx);
		return (
			PropertyKind::Interface,
			format!("struct TScriptInterface<I{}>", s.cpp_name(ctx, actor_class)),
		);
	}
	if is_a!(obj, ctx, "DelegateProperty") {
		return (PropertyKind::Delegate, "struct FScriptDelegate".into());
	}
	if is_a!(obj, ctx, "MulticastDelegateProperty") {
		return (PropertyKind::MulticastDelegate, "struct FMulticastScriptDelegate".into());
	}

	(PropertyKind::Unknown, property.class_name(ctx).to_string())
}

fn resolve_new(property: &Property, ctx: &Context, actor_class: Option<Class>) -> (PropertyKind, String) {
	let hash = fnv1a(property.class_name(ctx).as_bytes());
	match hash {
		HASH_INT8 => (PropertyKind::Int8, "int8_t".into()),
		HASH_INT16 => (PropertyKind::Int16, "int16_t".into()),
		HASH_INT => (PropertyKind::Int32, "int32_t".into()),
		HASH_INT64 => (PropertyKind::Int64, "int64_t".into()),
		HASH_UINT16 => (PropertyKind::UInt16, "uint16_t".into()),
		HASH_UINT32 => (PropertyKind::UInt32, "uint32_t".into()),
		HASH_UINT64 => (PropertyKind::UInt64, "uint64_t".into()),
		HASH_FLOAT => (PropertyKind::Float, "float".into()),
		HASH_DOUBLE => (PropertyKind::Double, "double".into()),
		HASH_BOOL => {
			let mask = property.bool_mask(ctx);
			match mask {
				0xFF => (PropertyKind::Bool, "bool".into()),
				_ => (PropertyKind::Bool, "char".into()),
			}
		},
		HASH_BYTE => match property.enum_type(ctx) {
			Some(e) => (PropertyKind::Enum, format!("enum class {}", e.0.get_name(ctx))),
			None => (PropertyKind::Byte, "char".into()),
		},
		HASH_ENUM => match property.enum_type(ctx) {
			Some(e) => (PropertyKind::Enum, format!("enum class {}", e.0.get_name(ctx))),
			None => (PropertyKind::Byte, "char".into()),
		},
		HASH_STRUCT => {
			let s = property.struct_type(ctx);
			(PropertyKind::Struct, format!("struct {}", s.cpp_name(ctx, actor_class)))
		},
		HASH_STR => (PropertyKind::Str, "struct FString".into()),
		HASH_NAME => (PropertyKind::Name, "struct FName".into()),
		HASH_TEXT => (PropertyKind::Text, "struct FText".into()),
		HASH_ARRAY => {
			let (_, inner) = resolve(&property.inner(ctx), ctx, actor_class);
			(PropertyKind::Array, format!("struct TArray<{inner}>"))
		},
		HASH_SET => {
			let (_, inner) = resolve(&property.inner(ctx), ctx, actor_class);
			(PropertyKind::Set, format!("struct TSet<{inner}>"))
		},
		HASH_MAP => {
			let (key, value) = property.map_key_value(ctx);
			let (_, key_ty) = resolve(&key, ctx, actor_class);
			let (_, val_ty) = resolve(&value, ctx, actor_class);
			(PropertyKind::Map, format!("struct TMap<{key_ty}, {val_ty}>"))
		},
		HASH_WEAK_OBJECT => {
			let c = property.class_meta(ctx);
			(PropertyKind::WeakObject, format!("struct TWeakObjectPtr<{}>", Struct(c.0).cpp_name(ctx, actor_class)))
		},
		HASH_SOFT_OBJECT => (PropertyKind::SoftObject, "struct TSoftObjectPtr<UObject>".into()),
		HASH_SOFT_CLASS => (PropertyKind::SoftClass, "struct TSoftClassPtr<UObject>".into()),
		HASH_CLASS => {
			let c = property.class_meta(ctx);
			(PropertyKind::Class, format!("class {}*", Struct(c.0).cpp_name(ctx, actor_class)))
		},
		HASH_OBJECT => {
			let s = property.referenced_struct(ctx);
			(PropertyKind::Object, format!("class {}*", s.cpp_name(ctx, actor_class)))
		},
		HASH_INTERFACE => {
			let s = property.referenced_struct(ctx);
			(PropertyKind::Interface, format!("struct TScriptInterface<I{}>", s.cpp_name(ctx, actor_class)))
		},
		HASH_DELEGATE => (PropertyKind::Delegate, "struct FScriptDelegate".into()),
		HASH_MULTICAST_DELEGATE => {
			(PropertyKind::MulticastDelegate, "struct FMulticastScriptDelegate".into())
		},
		HASH_FIELD_PATH => {
			let s = property.referenced_struct(ctx);
			(PropertyKind::FieldPath, format!("struct TFieldPath<F{}>", s.cpp_name(ctx, actor_class)))
		},
		_ => (PropertyKind::Unknown, property.class_name(ctx).to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::fnv1a;

	#[test]
	fn fnv1a_is_stable_and_order_sensitive() {
		assert_eq!(fnv1a(b"FIntProperty"), fnv1a(b"FIntProperty"));
		assert_ne!(fnv1a(b"FIntProperty"), fnv1a(b"FInt64Property"));
	}
}
