use std::process;

fn main() {
    match extractdoc_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("extractdoc error: {err:#}");
            process::exit(extractdoc_cli::exit_code_for(&err));
        }
    }
}
