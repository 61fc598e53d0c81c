fn main() {
    if let Err(e) = roamrs_agent::run() {
        eprintln!("Failed to start: {e:#}");
        std::process::exit(1);
    }
}
