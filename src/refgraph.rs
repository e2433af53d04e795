//! Orders packages so that a package's dependencies are emitted before it.
//!
//! A class-typed member or parameter is always rendered as a pointer (`class
//! Foo*`), so it only ever needs `Foo` forward-declared, never its full
//! definition in scope — this is the struct-header/class-header split: a
//! package's `_struct.h` never needs another package's `_classes.h`. Only
//! struct/enum value members force a real ordering dependency. Breaking
//! cycles this way covers every case the corpus actually produces; the
//! arbitrary stable order is kept as a last-resort fallback for a genuine
//! struct-value cycle, which a valid target cannot have (it would be an
//! infinite-size type) but which this code does not assume away.

use fxhash::{FxHashMap, FxHashSet};

use crate::package::Package;

/// Which kind of definition a referenced name requires from its owning
/// package: a pointer to a class only ever needs a forward declaration, a
/// struct or enum value member needs the full definition in scope.
#[derive(Clone, Copy, PartialEq, Eq)]
enum OwnerKind {
	Class,
	ValueType,
}

/// Scans every member and parameter type string in `packages` for `struct
/// <Name>` / `class <Name>` / `enum class <Name>` references and maps the
/// referenced name back to the package that defines it and whether it is a
/// class (forward-declarable) or a value type (struct/enum).
fn type_owners(packages: &[Package]) -> FxHashMap<String, (usize, OwnerKind)> {
	let mut owners = FxHashMap::default();
	for (i, pkg) in packages.iter().enumerate() {
		for s in &pkg.structs {
			let kind = if s.is_class { OwnerKind::Class } else { OwnerKind::ValueType };
			owners.insert(s.cpp_name.clone(), (i, kind));
		}
		for e in &pkg.enums {
			owners.insert(e.cpp_name.clone(), (i, OwnerKind::ValueType));
		}
	}
	owners
}

fn referenced_names(text: &str) -> Vec<&str> {
	let mut names = Vec::new();
	for marker in ["struct ", "class ", "enum class "] {
		let mut rest = text;
		while let Some(pos) = rest.find(marker) {
			let after = &rest[pos + marker.len()..];
			let end = after.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(after.len());
			if end > 0 {
				names.push(&after[..end]);
			}
			rest = &after[end..];
		}
	}
	names
}

/// Builds the hard adjacency list (`package -> set of packages it depends
/// on for a struct/enum value member`) and, separately, the set of class
/// names each package must forward-declare because it only ever points at
/// them. Class references never become a hard edge: the struct/class-header
/// split means a pointer to another package's class is satisfied by a
/// forward declaration, not an include.
fn build_edges(packages: &[Package]) -> (Vec<FxHashSet<usize>>, Vec<FxHashSet<String>>) {
	let owners = type_owners(packages);
	let mut edges = vec![FxHashSet::default(); packages.len()];
	let mut forward_decls = vec![FxHashSet::default(); packages.len()];

	let mut record = |i: usize, name: &str, edges: &mut [FxHashSet<usize>], forward_decls: &mut [FxHashSet<String>]| {
		let Some(&(owner, kind)) = owners.get(name) else { return };
		if owner == i {
			return;
		}
		match kind {
			OwnerKind::Class => {
				forward_decls[i].insert(name.to_string());
			},
			OwnerKind::ValueType => {
				edges[i].insert(owner);
			},
		}
	};

	for (i, pkg) in packages.iter().enumerate() {
		for s in &pkg.structs {
			for m in &s.members {
				for name in referenced_names(&m.type_name) {
					record(i, name, &mut edges, &mut forward_decls);
				}
			}
			for f in &s.functions {
				for p in &f.params {
					for name in referenced_names(&p.type_name) {
						record(i, name, &mut edges, &mut forward_decls);
					}
				}
			}
		}
	}
	(edges, forward_decls)
}

/// A processing order plus, per package, the class names it must
/// forward-declare rather than include the owning package's definition for.
pub struct CycleResolution {
	pub order: Vec<usize>,
	pub forward_decls: Vec<FxHashSet<String>>,
}

/// Returns a valid processing order: index `j` appears before index `i`
/// whenever `i` depends on `j` for a struct/enum value member. Class
/// dependencies never participate in ordering (see module docs); they are
/// instead reported in `forward_decls`. If a hard (value-type) cycle
/// nonetheless exists — which a compilable target cannot produce — its
/// participants fall back to a stable input-order placement rather than
/// failing the run.
pub fn topological_order(packages: &[Package]) -> CycleResolution {
	let (edges, forward_decls) = build_edges(packages);
	let n = packages.len();
	let mut visited = vec![false; n];
	let mut on_stack = vec![false; n];
	let mut order = Vec::with_capacity(n);

	fn visit(
		i: usize,
		edges: &[FxHashSet<usize>],
		visited: &mut [bool],
		on_stack: &mut [bool],
		order: &mut Vec<usize>,
	) {
		if visited[i] {
			return;
		}
		visited[i] = true;
		on_stack[i] = true;
		let mut deps: Vec<usize> = edges[i].iter().copied().collect();
		deps.sort_unstable();
		for dep in deps {
			if on_stack[dep] {
				// Genuine struct-value cycle: no split is possible here
				// (both sides need each other's full definition), so fall
				// back to a stable arbitrary position.
				continue;
			}
			visit(dep, edges, visited, on_stack, order);
		}
		on_stack[i] = false;
		order.push(i);
	}

	for i in 0..n {
		visit(i, &edges, &mut visited, &mut on_stack, &mut order);
	}
	CycleResolution { order, forward_decls }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::package::StructRecord;

	fn struct_record(addr: u64, cpp_name: &str, member_type: &str, is_class: bool) -> StructRecord {
		StructRecord {
			addr,
			parent_addr: None,
			full_name: cpp_name.to_string(),
			cpp_name: cpp_name.to_string(),
			inherited_size: 0,
			total_size: 8,
			members: vec![crate::package::Member {
				type_name: member_type.to_string(),
				name: "field".to_string(),
				offset: 0,
				size: 8,
				array_dim: 1,
				bit_width: None,
				suspect: false,
			}],
			functions: Vec::new(),
			is_class,
		}
	}

	#[test]
	fn dependency_package_is_ordered_before_its_dependent() {
		let base = Package { name: "Base".into(), structs: vec![struct_record(1, "FBase", "int32_t", false)], enums: vec![] };
		let derived = Package {
			name: "Derived".into(),
			structs: vec![struct_record(2, "FDerived", "struct FBase", false)],
			enums: vec![],
		};
		let packages = vec![derived, base];
		let resolution = topological_order(&packages);
		let base_pos = resolution.order.iter().position(|&i| packages[i].name == "Base").unwrap();
		let derived_pos = resolution.order.iter().position(|&i| packages[i].name == "Derived").unwrap();
		assert!(base_pos < derived_pos);
	}

	#[test]
	fn class_cycles_are_broken_by_forward_declaration_not_ordering() {
		let a = Package {
			name: "A".into(),
			structs: vec![struct_record(1, "UA", "class UB*", true)],
			enums: vec![],
		};
		let b = Package {
			name: "B".into(),
			structs: vec![struct_record(2, "UB", "class UA*", true)],
			enums: vec![],
		};
		let packages = vec![a, b];
		let resolution = topological_order(&packages);
		assert_eq!(resolution.order.len(), 2);
		assert!(resolution.forward_decls[0].contains("UB"));
		assert!(resolution.forward_decls[1].contains("UA"));
	}

	#[test]
	fn referenced_names_extracts_every_marker() {
		let names = referenced_names("struct TArray<struct FVector>");
		assert_eq!(names, vec!["TArray", "FVector"]);
	}
}
