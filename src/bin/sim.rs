use std::fs;
use std::process;

use q1vm::logging::error;
use q1vm::simulator::Machine;

fn usage(name: &str) {
    eprintln!("usage: {} [options] <filename>", name);
    eprintln!("options:");
    eprintln!("\t-a <number>\tValue for register A");
    eprintln!("\t-b <number>\tValue for register B");
    eprintln!("\t-c <number>\tValue for register C");
    eprintln!("\t-h\t\tDisplay this message");
}

fn flag(set: bool, name: &'static str) -> &'static str {
    if set { name } else { "-" }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut file_name: Option<&str> = None;
    let mut machine = Machine::new();

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if (arg == "-a" || arg == "-b" || arg == "-c") && i + 1 < args.len() {
            i += 1;
            // non-numeric input reads as zero
            let value = args[i].parse::<i64>().unwrap_or(0) as u8;
            match arg {
                "-a" => machine.set_a(value),
                "-b" => machine.set_b(value),
                _ => machine.set_c(value),
            }
        } else if arg == "-h" || file_name.is_some() {
            if arg != "-h" {
                error(format!("invalid or incomplete argument: {}", arg));
            }
            usage(&args[0]);
            process::exit(-1);
        } else {
            file_name = Some(arg);
        }
        i += 1;
    }

    let Some(file_name) = file_name else {
        error("no file specified".to_string());
        process::exit(-1);
    };

    let program = fs::read(file_name).unwrap_or_else(|_| {
        error(format!("could not open {}", file_name));
        process::exit(-1);
    });

    machine.load_program(&program);
    machine.run();

    println!("CLOCKS: {}", machine.clocks());
    println!(
        "A: {:3}  B: {:3}  C: {:3}  X: {:5}  P: {:5}",
        machine.a(),
        machine.b(),
        machine.c(),
        machine.x(),
        machine.p()
    );
    println!(
        "FLAGS: {}{}{}",
        flag(machine.c_flag(), "C"),
        flag(machine.z_flag(), "Z"),
        flag(machine.n_flag(), "N")
    );
}
