use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    codey::cli::main()
}
