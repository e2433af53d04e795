//! Direct textual emission of the reconstructed model: per-package header
//! and source files, the umbrella `SDK.h`, and the root-level dump files.
//!
//! This is intentionally dumb: every interesting decision (padding, size
//! repair, property typing, ordering) has already been made upstream. This
//! module only formats.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::errors::IoError;
use crate::ident::sanitize_package_name;
use crate::package::{Package, StructRecord};
use crate::refgraph::CycleResolution;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
	pub spacing: bool,
}

pub struct RenderOutcome {
	pub written: Vec<PathBuf>,
	pub failures: Vec<IoError>,
}

/// Writes every package in `resolution.order` (indices into `packages`)
/// under `root/SDK/`, plus the umbrella header and dump files. A package
/// whose `_classes.h` would otherwise need another package's class header
/// (a reference-graph cycle through class pointers) instead gets that
/// class forward-declared at the top of its own `_classes.h`. One package
/// failing to write is recorded in `failures` and does not stop the rest.
pub fn render_sdk(
	root: &Path,
	packages: &[Package],
	resolution: &CycleResolution,
	options: RenderOptions,
) -> RenderOutcome {
	let mut written = Vec::new();
	let mut failures = Vec::new();
	let sdk_dir = root.join("SDK");

	if let Err(source) = std::fs::create_dir_all(&sdk_dir) {
		failures.push(IoError { path: sdk_dir.clone(), source });
		return RenderOutcome { written, failures };
	}

	let mut umbrella = String::new();
	writeln!(umbrella, "#pragma once").ok();
	writeln!(umbrella, "#include \"GlobalOffset.h\"").ok();

	for &index in &resolution.order {
		let pkg = &packages[index];
		let safe = sanitize_package_name(&pkg.name);
		let has_classes = pkg.structs.iter().any(|s| s.is_class);
		let has_structs_or_enums = pkg.structs.iter().any(|s| !s.is_class) || !pkg.enums.is_empty();

		if has_classes {
			let path = sdk_dir.join(format!("{safe}_classes.h"));
			let text = render_classes(pkg, options, &resolution.forward_decls[index]);
			write_or_record(&path, &text, &mut written, &mut failures);
			writeln!(umbrella, "#include \"SDK/{safe}_classes.h\"").ok();
		}

		if has_structs_or_enums {
			let path = sdk_dir.join(format!("{safe}_struct.h"));
			let text = render_structs_and_enums(pkg, options);
			write_or_record(&path, &text, &mut written, &mut failures);
			writeln!(umbrella, "#include \"SDK/{safe}_struct.h\"").ok();
		}

		let param_path = sdk_dir.join(format!("{safe}_param.h"));
		let param_text = render_params(pkg);
		write_or_record(&param_path, &param_text, &mut written, &mut failures);

		let package_h = sdk_dir.join(format!("{safe}_package.h"));
		let header_text = render_package_header(&safe, has_classes, has_structs_or_enums);
		write_or_record(&package_h, &header_text, &mut written, &mut failures);

		let package_cpp = sdk_dir.join(format!("{safe}_package.cpp"));
		write_or_record(&package_cpp, &render_package_source(pkg, &safe), &mut written, &mut failures);
	}

	let sdk_h = root.join("SDK.h");
	write_or_record(&sdk_h, &umbrella, &mut written, &mut failures);

	#[cfg(feature = "tracing")]
	tracing::info!(written = written.len(), failed = failures.len(), packages = packages.len(), "SDK render complete");

	RenderOutcome { written, failures }
}

fn write_or_record(path: &Path, text: &str, written: &mut Vec<PathBuf>, failures: &mut Vec<IoError>) {
	match std::fs::write(path, text) {
		Ok(()) => written.push(path.to_path_buf()),
		Err(source) => failures.push(IoError { path: path.to_path_buf(), source }),
	}
}

fn render_classes(pkg: &Package, options: RenderOptions, forward_decls: &fxhash::FxHashSet<String>) -> String {
	let mut out = String::new();
	writeln!(out, "#pragma once\n").ok();
	let mut names: Vec<&String> = forward_decls.iter().collect();
	names.sort();
	for name in names {
		writeln!(out, "class {name};").ok();
	}
	if !forward_decls.is_empty() {
		writeln!(out).ok();
	}
	for s in pkg.structs.iter().filter(|s| s.is_class) {
		render_struct_body(&mut out, s, options);
	}
	out
}

fn render_structs_and_enums(pkg: &Package, options: RenderOptions) -> String {
	let mut out = String::new();
	writeln!(out, "#pragma once\n").ok();
	for e in &pkg.enums {
		writeln!(out, "enum class {} : {} {{", e.cpp_name, e.underlying).ok();
		for m in &e.members {
			writeln!(out, "\t{m},").ok();
		}
		writeln!(out, "}};\n").ok();
	}
	for s in pkg.structs.iter().filter(|s| !s.is_class) {
		render_struct_body(&mut out, s, options);
	}
	out
}

fn render_struct_body(out: &mut String, s: &StructRecord, options: RenderOptions) {
	let kind = if s.is_class { "class" } else { "struct" };
	writeln!(out, "// {:#x}\n// Size: {:#x} (inherited: {:#x})", s.addr, s.total_size, s.inherited_size).ok();
	writeln!(out, "{kind} {} {{", s.cpp_name).ok();
	writeln!(out, "public:").ok();
	for m in &s.members {
		let line = match m.bit_width {
			Some(w) => format!("\t{} {} : {};", m.type_name, m.name, w),
			None if m.array_dim > 1 => format!("\t{} {}[{}];", m.type_name, m.name, m.array_dim),
			None => format!("\t{} {};", m.type_name, m.name),
		};
		if options.spacing {
			writeln!(out, "{line}\t// {:#x}", m.offset).ok();
		} else {
			writeln!(out, "{line}").ok();
		}
	}
	for f in &s.functions {
		let ret = f.return_type.as_deref().unwrap_or("void");
		let params = f.params.iter().map(|p| format!("{} {}", p.type_name, p.name)).collect::<Vec<_>>().join(", ");
		let prefix = if f.flags.contains(crate::flags::FunctionFlags::STATIC) { "static " } else { "" };
		let suffix = if f.is_const { " const" } else { "" };
		writeln!(out, "\t{prefix}{ret} {}({params}){suffix};", f.name).ok();
	}
	writeln!(out, "}};\n").ok();
}

fn render_params(pkg: &Package) -> String {
	let mut out = String::new();
	writeln!(out, "#pragma once\n").ok();
	for s in &pkg.structs {
		for f in &s.functions {
			if f.params.is_empty() && f.return_type.is_none() {
				continue;
			}
			writeln!(out, "struct {} {{", f.param_struct_name).ok();
			for p in &f.params {
				writeln!(out, "\t{} {};", p.type_name, p.name).ok();
			}
			if let Some(ret) = &f.return_type {
				writeln!(out, "\t{ret} ReturnValue;").ok();
			}
			writeln!(out, "}};\n").ok();
		}
	}
	out
}

fn render_package_header(safe: &str, has_classes: bool, has_structs_or_enums: bool) -> String {
	let mut out = String::new();
	writeln!(out, "#pragma once\n").ok();
	if has_structs_or_enums {
		writeln!(out, "#include \"{safe}_struct.h\"").ok();
	}
	if has_classes {
		writeln!(out, "#include \"{safe}_classes.h\"").ok();
	}
	writeln!(out, "#include \"{safe}_param.h\"").ok();
	out
}

fn render_package_source(pkg: &Package, safe: &str) -> String {
	let mut out = String::new();
	writeln!(out, "#include \"{safe}_package.h\"\n").ok();
	for s in &pkg.structs {
		for f in &s.functions {
			if f.entry_point == 0 {
				continue;
			}
			writeln!(out, "void {}::{}() {{", s.cpp_name, f.name).ok();
			writeln!(out, "\tstatic class UFunction* fn = nullptr;").ok();
			writeln!(out, "\tif (!fn) fn = UObject::FindObject<UFunction>(\"{}\");", f.full_name).ok();
			writeln!(out, "\t{} params {{}};", f.param_struct_name).ok();
			writeln!(out, "\tthis->ProcessEvent(fn, &params);").ok();
			writeln!(out, "}}\n").ok();
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::package::{EnumRecord, Member};

	fn empty_struct(name: &str) -> StructRecord {
		StructRecord {
			addr: 1,
			parent_addr: None,
			full_name: name.to_string(),
			cpp_name: name.to_string(),
			inherited_size: 0,
			total_size: 0,
			members: vec![Member {
				type_name: "int32_t".into(),
				name: "Value".into(),
				offset: 0,
				size: 4,
				array_dim: 1,
				bit_width: None,
				suspect: false,
			}],
			functions: Vec::new(),
			is_class: false,
		}
	}

	#[test]
	fn empty_enum_is_omitted_from_package_output() {
		let pkg = Package { name: "Core".into(), structs: vec![], enums: vec![] };
		let text = render_structs_and_enums(&pkg, RenderOptions { spacing: false });
		assert!(!text.contains("enum class"));
	}

	#[test]
	fn struct_body_renders_the_declared_member() {
		let pkg = Package { name: "Core".into(), structs: vec![empty_struct("FThing")], enums: vec![] };
		let text = render_structs_and_enums(&pkg, RenderOptions { spacing: false });
		assert!(text.contains("struct FThing"));
		assert!(text.contains("Value"));
	}

	#[test]
	fn enum_with_members_renders_its_underlying_type() {
		let e = EnumRecord {
			full_name: "Enum Core.EFoo".into(),
			cpp_name: "EFoo".into(),
			members: vec!["A = 0".into(), "B = 1".into()],
			underlying: "uint8_t",
		};
		let pkg = Package { name: "Core".into(), structs: vec![], enums: vec![e] };
		let text = render_structs_and_enums(&pkg, RenderOptions { spacing: false });
		assert!(text.contains("enum class EFoo : uint8_t"));
	}
}
