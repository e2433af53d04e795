use fxhash::FxHashSet;

/// C and C++ reserved words, plus a handful of additional identifiers the
/// source tool also avoids because they collide with common engine macros
/// (`RELATIVE`, `ABSOLUTE`, ...).
const RESERVED: &[&str] = &[
	"alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break", "case",
	"catch", "char", "char8_t", "char16_t", "char32_t", "class", "compl", "concept", "const",
	"consteval", "constexpr", "constinit", "const_cast", "continue", "co_await", "co_return",
	"co_yield", "decltype", "default", "delete", "do", "double", "dynamic_cast", "else", "enum",
	"explicit", "export", "extern", "false", "float", "for", "friend", "goto", "if", "inline", "int",
	"long", "mutable", "namespace", "new", "noexcept", "not", "not_eq", "nullptr", "operator", "or",
	"or_eq", "private", "protected", "public", "register", "reinterpret_cast", "requires", "return",
	"short", "signed", "sizeof", "static", "static_assert", "static_cast", "struct", "switch",
	"template", "this", "thread_local", "throw", "true", "try", "typedef", "typeid", "typename",
	"union", "unsigned", "using", "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
	"IGNORE", "ABSOLUTE", "RELATIVE", "DEBUG", "RELEASE",
];

pub fn is_reserved(word: &str) -> bool {
	RESERVED.contains(&word)
}

/// Turns arbitrary engine-provided text into a valid C-family identifier:
/// non-identifier bytes become `_`, invalid UTF-8 becomes `_xHH`, and a
/// leading digit gets a `_` prefix.
pub fn sanitize_identifier(name: &str) -> String {
	let mut out = String::with_capacity(name.len());
	for ch in name.chars() {
		if ch.is_ascii_alphanumeric() || ch == '_' {
			out.push(ch);
		} else {
			for byte in ch.to_string().as_bytes() {
				out.push_str(&format!("_x{byte:02X}"));
			}
		}
	}
	if out.is_empty() {
		out.push('_');
	}
	if out.chars().next().unwrap().is_ascii_digit() {
		out.insert(0, '_');
	}
	out
}

/// Escapes invalid UTF-8 bytes that surfaced in a lossily-decoded name as
/// `_xHH` rather than the replacement character, matching the source
/// tool's multi-byte-aware escaping.
pub fn escape_invalid_bytes(text: &str) -> String {
	text.chars()
		.map(|c| if c == '\u{FFFD}' { "_xFD".to_string() } else { c.to_string() })
		.collect()
}

/// Fixes a single identifier against the reserved-word list, then
/// deduplicates it against `scope` (the set of identifiers already used in
/// the same class body / parameter list / generated-struct name pool),
/// suffixing with `_N` as needed.
pub fn fix_and_dedup(name: &str, scope: &mut FxHashSet<String>) -> String {
	let mut candidate = sanitize_identifier(name);
	if is_reserved(&candidate) {
		candidate.push_str("_1");
	}
	if !scope.contains(&candidate) {
		scope.insert(candidate.clone());
		return candidate;
	}
	let mut n = 2;
	loop {
		let suffixed = format!("{candidate}_{n}");
		if !scope.contains(&suffixed) {
			scope.insert(suffixed.clone());
			return suffixed;
		}
		n += 1;
	}
}

/// Replaces the characters the filesystem layout forbids in a package
/// filename stem.
pub fn sanitize_package_name(name: &str) -> String {
	name.chars().map(|c| if "/\\:*?\"<>|+".contains(c) { '_' } else { c }).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn leading_digit_gets_prefixed() {
		assert_eq!(sanitize_identifier("3Blah"), "_3Blah");
	}

	#[test]
	fn reserved_words_get_suffixed() {
		let mut scope = FxHashSet::default();
		assert_eq!(fix_and_dedup("class", &mut scope), "class_1");
	}

	#[test]
	fn duplicate_names_within_a_scope_get_numbered() {
		let mut scope = FxHashSet::default();
		assert_eq!(fix_and_dedup("Count", &mut scope), "Count");
		assert_eq!(fix_and_dedup("Count", &mut scope), "Count_2");
	}

	#[test]
	fn package_names_strip_filesystem_special_characters() {
		assert_eq!(sanitize_package_name("Foo/Bar+Baz"), "Foo_Bar_Baz");
	}
}
