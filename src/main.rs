fn main() {
    if let Err(err) = price_delta::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
