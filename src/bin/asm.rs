use std::fs::File;
use std::io::{BufWriter, Write};
use std::process;

use q1vm::assembler::{Assembler, OutputFormat};
use q1vm::logging::error;

fn usage(name: &str) {
    eprintln!("usage: {} [options] <filename>", name);
    eprintln!("options:");
    eprintln!("\t-o <filename>   Output filename");
    eprintln!("\t-raw            Raw binary output");
    eprintln!("\t-list           Listing output (default)");
    eprintln!("\t-hex            Hex output");
    eprintln!("\t-h              Show this message");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut input: Option<&str> = None;
    let mut output: Option<&str> = None;
    let mut format = OutputFormat::Listing;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-o" => {
                if output.is_some() || i + 1 >= args.len() {
                    usage(&args[0]);
                    process::exit(-1);
                }
                i += 1;
                output = Some(args[i].as_str());
            }
            "-raw" => format = OutputFormat::Raw,
            "-list" => format = OutputFormat::Listing,
            "-hex" => format = OutputFormat::Hex,
            "-h" => {
                usage(&args[0]);
                process::exit(0);
            }
            name => {
                if input.is_some() {
                    usage(&args[0]);
                    process::exit(-1);
                }
                input = Some(name);
            }
        }
        i += 1;
    }

    let Some(input) = input else {
        usage(&args[0]);
        process::exit(-1);
    };
    let output = output.unwrap_or(match format {
        OutputFormat::Raw => "out.raw",
        OutputFormat::Hex => "out.hex",
        OutputFormat::Listing => "out.lst",
    });

    let mut asm = Assembler::new();
    let buffer = asm.preprocess_file(input);
    asm.first_pass(&buffer);

    // output is only ever created for an error-free first pass
    if asm.error_count() == 0 {
        let file = File::create(output).unwrap_or_else(|_| {
            error(format!("could not open {} for writing", output));
            process::exit(-1);
        });
        let mut writer = BufWriter::new(file);
        asm.second_pass(&buffer, format, &mut writer)
            .and_then(|_| writer.flush())
            .unwrap_or_else(|e| {
                error(format!("write failed on {}: {}", output, e));
                process::exit(-1);
            });
    }

    println!("Errors:     {}", asm.error_count());
    println!("Byte count: {}", asm.byte_count());
    process::exit(asm.error_count() as i32);
}
