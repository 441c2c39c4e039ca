//! Offline disassembler for compiled script images.
//!
//! Prints one line per instruction: the byte offset and the rendered
//! mnemonic with operands. Routine calls show raw indices since no routine
//! table is attached offline.

use nwscript::script::instrutil::describe_instruction;
use nwscript::script::ncs::NcsReader;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: ncsdisasm <file.ncs>");
        return ExitCode::FAILURE;
    };

    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    let name = Path::new(&path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.clone());

    let program = match NcsReader::new(data).load(name) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    println!("{}: {} bytes", program.name(), program.length());
    for ins in program.instructions() {
        println!("{:08x} {}", ins.offset, describe_instruction(ins, None));
    }
    ExitCode::SUCCESS
}
