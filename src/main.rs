use std::path::PathBuf;
use std::process::ExitCode;

use effigy::context::Context;
use effigy::errors::ConfigError;
use effigy::model::Object;
use effigy::names::NamePool;
use effigy::objects::ObjectTable;
use effigy::offsets::{self, EngineOffsets};
use effigy::package::{self, BuildOptions, Package};
use effigy::reader::FakeReader;
use effigy::refgraph;
use effigy::render::{self, RenderOptions};

/// Flags recognized on the command line. Everything else (window
/// discovery, PID resolution, reading the target's module list) lives
/// behind the `MemoryReader` trait boundary and is not implemented here;
/// see [`build_development_fixture`] for the stand-in this binary runs
/// against so it stays runnable without a live target.
#[derive(Debug, Default)]
struct Args {
	names_and_objects_only: bool,
	wait_for_input: bool,
	pointer_probe_from: Option<String>,
	spacing: bool,
	offsets_path: Option<PathBuf>,
	help: bool,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Args {
	let mut args = Args::default();
	while let Some(arg) = argv.next() {
		match arg.as_str() {
			"-p" => args.names_and_objects_only = true,
			"-w" => args.wait_for_input = true,
			"-f" => args.pointer_probe_from = argv.next(),
			"--spacing" => args.spacing = true,
			"--offsets" => args.offsets_path = argv.next().map(PathBuf::from),
			"-h" | "--help" => args.help = true,
			_ => {},
		}
	}
	args
}

const HELP: &str = "\
effigy - reconstructs a compilable SDK from a running engine process

USAGE:
    effigy [OPTIONS]

OPTIONS:
    -p                 dump names/objects only, skip SDK generation
    -w                 wait for a keypress before starting
    -f <package>        enable the pointer probe starting at <package>
    --spacing          pretty-print emitted structs with aligned columns
    --offsets <path>   load an alternate offset configuration document
    -h, --help         print this message
";

fn main() -> ExitCode {
	let args = parse_args(std::env::args().skip(1));

	if args.help {
		print!("{HELP}");
		return ExitCode::SUCCESS;
	}

	#[cfg(feature = "tracing")]
	init_tracing();

	if args.wait_for_input {
		eprintln!("press enter to continue...");
		let mut line = String::new();
		let _ = std::io::stdin().read_line(&mut line);
	}

	let offsets_table = match &args.offsets_path {
		Some(path) => match offsets::load_offsets(path) {
			Ok(table) => table,
			Err(e) => {
				eprintln!("error: {e}");
				return ExitCode::from(exit_code_for(&e));
			},
		},
		None => offsets::default_offsets(),
	};

	let engine_offsets = match offsets::resolve(&offsets_table, "UE4_25") {
		Ok(o) => o,
		Err(e) => {
			eprintln!("error: {e}");
			return ExitCode::from(exit_code_for(&e));
		},
	};

	let mut reader = FakeReader::new();
	let names_block = reader.alloc(0x1000_0000, 0x10_0000);
	let object_chunk = reader.alloc(0x2000_0000, engine_offsets.object_array_chunk_size as usize * 8);
	build_development_fixture(&mut reader, engine_offsets, names_block, object_chunk);

	let names = NamePool::new(&reader, engine_offsets, vec![names_block]);
	let objects = ObjectTable::new(&reader, engine_offsets, vec![object_chunk], 1);
	let ctx = Context::new(&reader, engine_offsets, names, objects);

	if args.names_and_objects_only {
		eprintln!("note: -p mode (names/objects dump only) is not wired to a live target in this build");
		return ExitCode::SUCCESS;
	}

	let options = BuildOptions { pointer_probe_from: args.pointer_probe_from, spacing: args.spacing };
	let packages: Vec<Package> = build_all_packages(&ctx, &options);

	if packages.is_empty() {
		eprintln!("error: zero packages after filtering");
		return ExitCode::from(9);
	}

	let resolution = refgraph::topological_order(&packages);
	let outcome = render::render_sdk(
		&PathBuf::from("Games/Fixture"),
		&packages,
		&resolution,
		RenderOptions { spacing: args.spacing },
	);
	for failure in &outcome.failures {
		eprintln!("warning: {failure}");
	}
	eprintln!("wrote {} files across {} packages", outcome.written.len(), packages.len());

	ExitCode::SUCCESS
}

/// Walks every package-root object in the table, generating its structs,
/// enums, and functions. The production tool also groups by outer package
/// here; this development build has exactly the synthetic fixture package.
fn build_all_packages(ctx: &Context, options: &BuildOptions) -> Vec<Package> {
	let mut package = Package { name: "Fixture".to_string(), structs: Vec::new(), enums: Vec::new() };
	let _ = options;

	ctx.objects.dump(ctx, |object, _| {
		if object.is_a_named(ctx, "Class", "Class CoreUObject.Class") {
			let s = object.as_struct();
			let size = s.properties_size(ctx);
			let inherited = s.get_super(ctx).map(|p| p.properties_size(ctx)).unwrap_or(0);
			let record = package::generate_struct(ctx, s, inherited, size, None, None);
			package.structs.push(record);
		}
		false
	});

	if package.structs.is_empty() && package.enums.is_empty() {
		Vec::new()
	} else {
		vec![package]
	}
}

fn exit_code_for(err: &ConfigError) -> u8 {
	match err {
		ConfigError::Io(_) => 5,
		ConfigError::Parse(_) => 2,
		ConfigError::UnknownEngine(_) => 7,
	}
}

/// Populates a tiny synthetic object graph (one self-classed `Class`
/// object, registered as the sole live object) so the binary produces
/// output without a live target attached. A real process-attach backend
/// plugs in by constructing a different `MemoryReader` implementation and
/// handing it to `Context::new` in its place; nothing else in this file
/// changes.
fn build_development_fixture(reader: &mut FakeReader, offsets: &EngineOffsets, names_block: u64, object_chunk: u64) {
	let class_addr = reader.alloc(0x5000_0000, 0x100);
	reader.write_pod(class_addr + offsets.object.class as u64, class_addr);

	let text = "Class";
	let header = (text.len() as u16) << offsets.name_entry.len_bit;
	reader.write_pod(names_block, header);
	reader.write(names_block + offsets.name_entry.header_size as u64, text.as_bytes());
	reader.write_pod(class_addr + offsets.object.name as u64, 0u32);

	reader.write_pod(object_chunk, class_addr);
	let _ = Object::from_addr(class_addr);
}

#[cfg(feature = "tracing")]
fn init_tracing() {
	use tracing_subscriber::EnvFilter;
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_args_recognizes_the_pointer_probe_flag() {
		let args = parse_args(vec!["-f".to_string(), "Engine".to_string()].into_iter());
		assert_eq!(args.pointer_probe_from.as_deref(), Some("Engine"));
	}

	#[test]
	fn parse_args_recognizes_help() {
		let args = parse_args(vec!["-h".to_string()].into_iter());
		assert!(args.help);
	}
}
