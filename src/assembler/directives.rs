//! The `#` preprocessor directives

use std::fs;
use std::io;

use super::Assembler;
use super::statement::collapse_whitespace;

/// How deeply `#include` may nest before the include is skipped
pub const MAX_INCLUDE_DEPTH: usize = 8;

/// Preprocess the named file into the spill buffer, recursing into the
/// files it includes
pub(crate) fn preprocess_file(asm: &mut Assembler, path: &str, depth: usize, output: &mut String) {
    if depth >= MAX_INCLUDE_DEPTH {
        asm.report(format!("exceeded {} include levels", MAX_INCLUDE_DEPTH));
        return;
    }
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {
            asm.report(format!("could not open {} for reading", path));
            return;
        }
        Err(_) => {
            asm.report("read failed on input".to_string());
            return;
        }
    };
    preprocess_source(asm, &source, depth, output);
}

/// Preprocess source text into the spill buffer.
///
/// Directive lines are consumed. While a `#define` is open, source lines
/// accumulate into the macro body instead of the output; everything else
/// is copied through verbatim. Macro state does not cross file
/// boundaries: an include inside an open macro streams into the output,
/// and a macro left open at end of file is an error.
pub(crate) fn preprocess_source(
    asm: &mut Assembler,
    source: &str,
    depth: usize,
    output: &mut String,
) {
    let mut open_macro: Option<String> = None;
    for line in source.lines() {
        if line.starts_with('#') {
            directive(asm, &collapse_whitespace(line), depth, output, &mut open_macro);
        } else if let Some(name) = &open_macro {
            let body = asm.macros.get_mut(name).expect("open macro is in the table");
            body.push_str(line);
            body.push('\n');
        } else {
            output.push_str(line);
            output.push('\n');
        }
    }
    if open_macro.is_some() {
        asm.report("\"#define\" without \"#end\"".to_string());
    }
}

fn directive(
    asm: &mut Assembler,
    line: &str,
    depth: usize,
    output: &mut String,
    open_macro: &mut Option<String>,
) {
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };
    match keyword {
        "#include" if !rest.is_empty() => {
            let path = rest.trim_matches('"');
            preprocess_file(asm, path, depth + 1, output);
        }
        "#define" if !rest.is_empty() => {
            if open_macro.is_some() {
                asm.report("\"#define\" without \"#end\"".to_string());
                return;
            }
            // redefining a name quietly appends to the existing body
            asm.macros.entry(rest.to_string()).or_default();
            *open_macro = Some(rest.to_string());
        }
        "#end" if rest.is_empty() => {
            if open_macro.take().is_none() {
                asm.report("\"#end\" not inside a \"#define\"".to_string());
            }
        }
        _ => asm.report(format!("preprocessor: \"{}\"", line)),
    }
}
