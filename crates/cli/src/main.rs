fn main() {
    if let Err(e) = gmscope_cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
